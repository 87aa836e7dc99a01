//! # Taxes
//!
//! Percentage taxes valid in a region of countries.
//!
//! ## Applying a Tax
//! ```text
//! net price    USD 19.99
//!     │
//!     ├── VAT 25%, valid in SE, DK ── country SE? ── yes ──► + USD 5.00
//!     └── Duty 2.5%, valid in NO   ── country SE? ── no
//!                                                        ─────────────
//! gross price                                            USD 24.99
//! ```
//!
//! Tax amounts are rounded to cents, so the gross price always fits the
//! Money wire format.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{MoneyResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_required_text, ValidationResult};

/// Longest tax name accepted.
pub const MAX_TAX_NAME_LEN: usize = 128;

// =============================================================================
// Country
// =============================================================================

/// ISO 3166-1 alpha-2 country code, stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// The two-letter code.
    pub fn as_str(&self) -> &str {
        // only ASCII letters are ever stored
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl FromStr for CountryCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().as_bytes() {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(CountryCode([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
            }
            _ => Err(ValidationError::InvalidFormat {
                field: "country".to_string(),
                reason: "must be a two-letter ISO 3166 code".to_string(),
            }),
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tax
// =============================================================================

/// A named percentage tax.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use vitrine_core::money::Money;
/// use vitrine_core::tax::Tax;
///
/// let vat = Tax::new("VAT", Decimal::new(25, 0))
///     .unwrap()
///     .valid_in("se".parse().unwrap());
///
/// let net: Money = "SEK 100".parse().unwrap();
/// assert_eq!(vat.gross(&net).unwrap(), "SEK 125".parse::<Money>().unwrap());
/// assert_eq!(vat.to_string(), "VAT (25%)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tax {
    name: String,
    description: String,
    percent: Decimal,
    region: BTreeSet<CountryCode>,
}

impl Tax {
    /// Creates a tax valid nowhere yet.
    ///
    /// ## Errors
    /// - `Required` / `TooLong` for the name
    /// - `OutOfRange` for a percentage outside 0..=100
    /// - `InvalidFormat` for more than two decimal places
    pub fn new(name: impl Into<String>, percent: Decimal) -> ValidationResult<Self> {
        let name = name.into();
        validate_required_text("name", &name, MAX_TAX_NAME_LEN)?;

        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(ValidationError::OutOfRange {
                field: "percent".to_string(),
                min: 0,
                max: 100,
            });
        }
        if percent.normalize().scale() > 2 {
            return Err(ValidationError::InvalidFormat {
                field: "percent".to_string(),
                reason: "at most two decimal places".to_string(),
            });
        }

        Ok(Tax {
            name: name.trim().to_string(),
            description: String::new(),
            percent,
            region: BTreeSet::new(),
        })
    }

    /// Adds a country to the region.
    pub fn valid_in(mut self, country: CountryCode) -> Self {
        self.region.insert(country);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn percent(&self) -> Decimal {
        self.percent
    }

    /// Countries in code order.
    pub fn region(&self) -> impl Iterator<Item = CountryCode> + '_ {
        self.region.iter().copied()
    }

    /// The percentage as a multiplier: 25% → 0.25.
    pub fn factor(&self) -> Decimal {
        self.percent / Decimal::ONE_HUNDRED
    }

    /// True if the tax is collected in `country`.
    pub fn applies_in(&self, country: CountryCode) -> bool {
        self.region.contains(&country)
    }

    /// The tax on `net`, rounded to cents.
    pub fn amount_on(&self, net: &Money) -> MoneyResult<Money> {
        Ok(net.percentage(self.percent)?.round_to_cents())
    }

    /// `net` plus this tax.
    pub fn gross(&self, net: &Money) -> MoneyResult<Money> {
        net.add(&self.amount_on(net)?)
    }
}

/// `"<name> (<percent>%)"`, e.g. `VAT (25%)`.
impl fmt::Display for Tax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.name, self.percent.normalize())
    }
}

// =============================================================================
// Tax Sets
// =============================================================================

/// Taxes collected in `country`, ordered by name.
pub fn applicable_taxes(taxes: &[Tax], country: CountryCode) -> Vec<&Tax> {
    let mut found: Vec<&Tax> = taxes.iter().filter(|tax| tax.applies_in(country)).collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found
}

/// Sum of every tax collected in `country` on `net`, each rounded on its own.
///
/// Zero in `net`'s currency when no tax applies.
pub fn total_tax(taxes: &[Tax], country: CountryCode, net: &Money) -> MoneyResult<Money> {
    applicable_taxes(taxes, country)
        .into_iter()
        .try_fold(Money::zero(net.currency()), |sum, tax| {
            sum.add(&tax.amount_on(net)?)
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn country(code: &str) -> CountryCode {
        code.parse().unwrap()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn nordic_taxes() -> Vec<Tax> {
        vec![
            Tax::new("VAT", dec!(25))
                .unwrap()
                .valid_in(country("SE"))
                .valid_in(country("DK")),
            Tax::new("Eco fee", dec!(2.5)).unwrap().valid_in(country("SE")),
            Tax::new("Duty", dec!(10)).unwrap().valid_in(country("NO")),
        ]
    }

    #[test]
    fn test_country_code() {
        assert_eq!(country("se").as_str(), "SE");
        assert_eq!(country(" dk ").to_string(), "DK");
        assert!("SWE".parse::<CountryCode>().is_err());
        assert!("S1".parse::<CountryCode>().is_err());
        assert!("".parse::<CountryCode>().is_err());
    }

    #[test]
    fn test_factor() {
        assert_eq!(Tax::new("VAT", dec!(25)).unwrap().factor(), dec!(0.25));
        assert_eq!(Tax::new("Low", dec!(2.5)).unwrap().factor(), dec!(0.025));
        assert_eq!(Tax::new("None", dec!(0)).unwrap().factor(), dec!(0));
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            Tax::new("VAT", dec!(100.01)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            Tax::new("VAT", dec!(-1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            Tax::new("VAT", dec!(12.345)),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Tax::new("  ", dec!(10)),
            Err(ValidationError::Required { .. })
        ));
        assert!(Tax::new("VAT", dec!(12.50)).is_ok());
    }

    #[test]
    fn test_amount_is_rounded_to_cents() {
        let vat = Tax::new("VAT", dec!(25)).unwrap();
        let net = money("USD 19.99");
        // 4.9975 rounds to 5.00
        assert_eq!(vat.amount_on(&net).unwrap(), money("USD 5.00"));
        let gross = vat.gross(&net).unwrap();
        assert_eq!(gross, money("USD 24.99"));
        assert!(gross.is_storable());
    }

    #[test]
    fn test_applicable_taxes_by_country() {
        let taxes = nordic_taxes();

        let names: Vec<_> = applicable_taxes(&taxes, country("SE"))
            .into_iter()
            .map(Tax::name)
            .collect();
        assert_eq!(names, vec!["Eco fee", "VAT"]);

        assert_eq!(applicable_taxes(&taxes, country("DK")).len(), 1);
        assert!(applicable_taxes(&taxes, country("FI")).is_empty());
    }

    #[test]
    fn test_total_tax() {
        let taxes = nordic_taxes();
        let net = money("SEK 200");

        // 25% + 2.5%
        assert_eq!(total_tax(&taxes, country("SE"), &net).unwrap(), money("SEK 55"));
        assert_eq!(total_tax(&taxes, country("NO"), &net).unwrap(), money("SEK 20"));

        let none = total_tax(&taxes, country("FI"), &net).unwrap();
        assert!(none.is_zero());
        assert_eq!(none.currency().code(), "SEK");
    }

    #[test]
    fn test_display() {
        let tax = Tax::new("Eco fee", dec!(2.50))
            .unwrap()
            .with_description("Recycling");
        assert_eq!(tax.to_string(), "Eco fee (2.5%)");
        assert_eq!(tax.description(), "Recycling");
        assert_eq!(tax.region().count(), 0);
    }
}
