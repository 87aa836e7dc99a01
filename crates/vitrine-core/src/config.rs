//! # Core Configuration
//!
//! Runtime knobs for the pure business logic.
//!
//! There is no global default currency: whoever needs one is handed a
//! `CoreConfig` explicitly. The storage crate builds one from the environment
//! (`vitrine_db::Settings`), tests build one with `CoreConfig::default()`.
//!
//! ## Example
//! ```rust
//! use vitrine_core::config::CoreConfig;
//! use vitrine_core::currency::currency;
//!
//! let config = CoreConfig::default()
//!     .with_default_currency(currency("EUR").unwrap())
//!     .with_max_list_items(20);
//!
//! let price = config.parse_money("12.50").unwrap();
//! assert_eq!(price.to_string(), "EUR 12.50");
//! ```

use rust_decimal::Decimal;

use crate::currency::Currency;
use crate::error::MoneyResult;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_LIST_ITEMS};

/// Configuration threaded through list and money operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Currency used when an amount arrives without a code.
    pub default_currency: Currency,

    /// Maximum distinct items in one list.
    pub max_list_items: usize,

    /// Maximum quantity of a single item.
    pub max_item_quantity: i64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::USD,
            max_list_items: MAX_LIST_ITEMS,
            max_item_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

impl CoreConfig {
    /// Sets the default currency.
    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }

    /// Sets the maximum number of items per list.
    pub fn with_max_list_items(mut self, max: usize) -> Self {
        self.max_list_items = max;
        self
    }

    /// Sets the maximum quantity per item.
    pub fn with_max_item_quantity(mut self, max: i64) -> Self {
        self.max_item_quantity = max;
        self
    }

    /// The configured default currency.
    #[inline]
    pub fn default_currency(&self) -> Currency {
        self.default_currency
    }

    /// Builds Money in the default currency.
    #[inline]
    pub fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.default_currency)
    }

    /// Zero in the default currency.
    #[inline]
    pub fn zero(&self) -> Money {
        Money::zero(self.default_currency)
    }

    /// Parses either the full wire format (`"EUR 1.50"`) or a bare amount
    /// (`"1.50"`), which is taken to be in the default currency.
    pub fn parse_money(&self, input: &str) -> MoneyResult<Money> {
        let input = input.trim();
        if input.contains(' ') {
            input.parse()
        } else {
            format!("{} {}", self.default_currency.code(), input).parse()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::currency;
    use crate::error::MoneyError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.default_currency().code(), "USD");
        assert_eq!(config.max_list_items, 100);
        assert_eq!(config.max_item_quantity, 999);
    }

    #[test]
    fn test_money_in_default_currency() {
        let config = CoreConfig::default().with_default_currency(currency("SEK").unwrap());
        assert_eq!(config.money(dec!(9.90)).to_string(), "SEK 9.90");
        assert!(config.zero().is_zero());
    }

    #[test]
    fn test_parse_money() {
        let config = CoreConfig::default();
        assert_eq!(config.parse_money("11.11").unwrap().to_string(), "USD 11.11");
        assert_eq!(config.parse_money("EUR 3").unwrap().to_string(), "EUR 3");
        assert!(matches!(
            config.parse_money("1.234"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }
}
