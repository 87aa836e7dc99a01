//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal + Currency?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE TWO CLASSIC MONEY BUGS                                             │
//! │                                                                         │
//! │  1. Floating point:                                                     │
//! │       0.1 + 0.2 = 0.30000000000000004  ❌                               │
//! │     OUR SOLUTION: rust_decimal amounts, floats only for display        │
//! │                                                                         │
//! │  2. Silent currency mixing:                                             │
//! │       EUR 10 + USD 5 = 15 ???          ❌                               │
//! │     OUR SOLUTION: every binary operation checks the currency and       │
//! │     returns MoneyError::CurrencyMismatch instead of guessing           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations are named methods returning `MoneyResult`, not operator
//! overloads: a mismatch has to be handled where it happens.
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use vitrine_core::money::Money;
//!
//! let price: Money = "USD 19.99".parse().unwrap();
//! let shipping = Money::from_code(Decimal::new(500, 2), "USD").unwrap();
//!
//! let total = price.add(&shipping).unwrap();
//! assert_eq!(total.to_string(), "USD 24.99");
//!
//! let eur: Money = "EUR 1.00".parse().unwrap();
//! assert!(price.add(&eur).is_err()); // never mixed silently
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::currency::Currency;
use crate::error::{MoneyError, MoneyResult};

/// Largest number of integer digits accepted by the wire format.
pub const MAX_INTEGER_DIGITS: u32 = 15;

/// Largest number of fractional digits accepted by the wire format.
pub const MAX_FRACTION_DIGITS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A decimal amount tagged with a currency.
///
/// ## Design Decisions
/// - **Copy**: both `Decimal` and `Currency` are small `Copy` values
/// - **Private fields**: an amount never changes currency after construction
/// - **Zero is currency-agnostic**: `EUR 0 == USD 0`, so "unset" checks work
///   without knowing the currency
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Node.price_fragment ──► effective_price (sum up the ancestor chain)   │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │  Item.order_price ◄── freeze ── Item.price ──► Item.total ──► List.total│
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

/// Right-hand operand of scaling operations.
///
/// Scaling accepts any numeric scalar. A `Money` operand is representable so
/// callers holding one get a typed `InvalidOperation` instead of a silent
/// unit error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Factor {
    Scalar(Decimal),
    Money(Money),
}

impl Money {
    /// Creates a Money value from an amount and a resolved currency.
    #[inline]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Money { amount, currency }
    }

    /// Creates a Money value from an amount and a currency code.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use vitrine_core::money::Money;
    ///
    /// let price = Money::from_code(Decimal::new(1099, 2), "usd").unwrap();
    /// assert_eq!(price.to_string(), "USD 10.99");
    ///
    /// assert!(Money::from_code(Decimal::ONE, "ZZZ").is_err());
    /// ```
    pub fn from_code(amount: Decimal, code: &str) -> MoneyResult<Self> {
        Ok(Money::new(amount, Currency::from_code(code)?))
    }

    /// Returns a zero amount in the given currency.
    #[inline]
    pub const fn zero(currency: Currency) -> Self {
        Money::new(Decimal::ZERO, currency)
    }

    /// The decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency.
    #[inline]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Checks if the amount is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Checks if the amount is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Checks if the amount is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// True if the amount fits the wire format: at most
    /// [`MAX_INTEGER_DIGITS`] integer and [`MAX_FRACTION_DIGITS`] fraction
    /// digits.
    ///
    /// Scaling, division and percentages can leave more fraction digits;
    /// round with [`Money::round_to_cents`] before storing such a result.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// let third = "USD 10".parse::<Money>().unwrap().divide(3).unwrap();
    /// assert!(!third.is_storable());
    /// assert!(third.round_to_cents().is_storable());
    /// ```
    pub fn is_storable(&self) -> bool {
        amount_in_range(self.amount)
    }

    /// Like [`Money::is_storable`], as a `MoneyResult`.
    ///
    /// ## Errors
    /// `InvalidAmount` carrying the formatted value.
    pub fn ensure_storable(&self) -> MoneyResult<()> {
        if self.is_storable() {
            Ok(())
        } else {
            Err(MoneyError::InvalidAmount(self.to_string()))
        }
    }

    // -------------------------------------------------------------------------
    // Binary arithmetic
    // -------------------------------------------------------------------------

    /// Adds two amounts of the same currency.
    ///
    /// ## Errors
    /// - `CurrencyMismatch` if the currencies differ
    /// - `InvalidOperation` on decimal overflow
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, other: &Money) -> MoneyResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| overflow("addition"))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Subtracts an amount of the same currency.
    ///
    /// ## Errors
    /// Same as [`Money::add`].
    #[allow(clippy::should_implement_trait)]
    pub fn sub(&self, other: &Money) -> MoneyResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| overflow("subtraction"))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Adds up amounts that all share `currency`.
    ///
    /// An empty iterator yields zero in `currency`.
    pub fn sum<'a, I>(items: I, currency: Currency) -> MoneyResult<Money>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.add(m))
    }

    // -------------------------------------------------------------------------
    // Unary operations
    // -------------------------------------------------------------------------

    /// Returns the amount with its sign flipped.
    #[inline]
    pub fn negate(&self) -> Money {
        Money::new(-self.amount, self.currency)
    }

    /// Returns an identical copy.
    #[inline]
    pub fn identity(&self) -> Money {
        *self
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Money {
        Money::new(self.amount.abs(), self.currency)
    }

    /// Rounds to two decimal places using Bankers Rounding.
    ///
    /// ```text
    /// 0.125 → 0.12     0.135 → 0.14     (half goes to the even cent)
    /// ```
    pub fn round_to_cents(&self) -> Money {
        Money::new(
            self.amount
                .round_dp_with_strategy(MAX_FRACTION_DIGITS, RoundingStrategy::MidpointNearestEven),
            self.currency,
        )
    }

    // -------------------------------------------------------------------------
    // Scalar operations
    // -------------------------------------------------------------------------

    /// Multiplies the amount by a plain number.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// let unit: Money = "USD 2.99".parse().unwrap();
    /// assert_eq!(unit.scale(3).unwrap().to_string(), "USD 8.97");
    ///
    /// // Money × Money has no meaning
    /// assert!(unit.scale(unit).is_err());
    /// ```
    pub fn scale(&self, factor: impl Into<Factor>) -> MoneyResult<Money> {
        let factor = scalar(factor.into(), "multiply")?;
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| overflow("multiplication"))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Divides the amount by a plain number.
    ///
    /// ## Errors
    /// `InvalidOperation` for a Money divisor, a zero divisor, or overflow.
    pub fn divide(&self, divisor: impl Into<Factor>) -> MoneyResult<Money> {
        let divisor = scalar(divisor.into(), "divide")?;
        if divisor.is_zero() {
            return Err(MoneyError::InvalidOperation(
                "cannot divide money by zero".to_string(),
            ));
        }
        let amount = self
            .amount
            .checked_div(divisor)
            .ok_or_else(|| overflow("division"))?;
        Ok(Money::new(amount, self.currency))
    }

    /// Computes `pct` percent of this amount.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// let price: Money = "USD 200".parse().unwrap();
    /// let five_percent = price.percentage(5).unwrap();
    /// assert_eq!(five_percent, "USD 10".parse::<Money>().unwrap());
    /// ```
    pub fn percentage(&self, pct: impl Into<Factor>) -> MoneyResult<Money> {
        let pct = scalar(pct.into(), "take a percentage of")?;
        let amount = pct
            .checked_mul(self.amount)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| overflow("percentage"))?;
        Ok(Money::new(amount, self.currency))
    }

    // -------------------------------------------------------------------------
    // Comparison
    // -------------------------------------------------------------------------

    /// Orders two amounts.
    ///
    /// Currencies must match, except that a zero amount compares against any
    /// currency.
    pub fn compare(&self, other: &Money) -> MoneyResult<Ordering> {
        if self.currency != other.currency && !self.is_zero() && !other.is_zero() {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(self.amount.cmp(&other.amount))
    }

    /// `self < other`, see [`Money::compare`].
    pub fn lt(&self, other: &Money) -> MoneyResult<bool> {
        Ok(self.compare(other)? == Ordering::Less)
    }

    /// `self > other`, see [`Money::compare`].
    pub fn gt(&self, other: &Money) -> MoneyResult<bool> {
        Ok(self.compare(other)? == Ordering::Greater)
    }

    /// `self <= other`, see [`Money::compare`].
    pub fn le(&self, other: &Money) -> MoneyResult<bool> {
        Ok(self.compare(other)? != Ordering::Greater)
    }

    /// `self >= other`, see [`Money::compare`].
    pub fn ge(&self, other: &Money) -> MoneyResult<bool> {
        Ok(self.compare(other)? != Ordering::Less)
    }

    /// Orders the amount against a bare number, ignoring currency.
    #[inline]
    pub fn compare_amount(&self, amount: Decimal) -> Ordering {
        self.amount.cmp(&amount)
    }

    /// Lossy conversion for display and sorting only.
    ///
    /// Never feed the result back into monetary math.
    pub fn to_f64(&self) -> f64 {
        self.amount.to_f64().unwrap_or_default()
    }

    fn ensure_same_currency(&self, other: &Money) -> MoneyResult<()> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

fn scalar(factor: Factor, verb: &str) -> MoneyResult<Decimal> {
    match factor {
        Factor::Scalar(value) => Ok(value),
        Factor::Money(_) => Err(MoneyError::InvalidOperation(format!(
            "cannot {verb} money by money"
        ))),
    }
}

fn overflow(op: &str) -> MoneyError {
    MoneyError::InvalidOperation(format!("{op} overflowed"))
}

// =============================================================================
// Wire Format
// =============================================================================

/// Parses the canonical `"<CODE> <amount>"` form.
///
/// ## Parse Steps
/// ```text
/// "USD 19.99"
///      │
///      ├── not exactly two tokens?        → InvalidFormat
///      ├── amount not [-]digits[.digits]? → InvalidAmount
///      ├── > 15 integer / > 2 fraction?   → InvalidAmount
///      └── code not registered?           → InvalidCurrency
/// ```
impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        let (code, amount) = match (parts.next(), parts.next(), parts.next()) {
            (Some(code), Some(amount), None) if !code.is_empty() && !amount.is_empty() => {
                (code, amount)
            }
            _ => return Err(MoneyError::InvalidFormat(s.to_string())),
        };

        if !is_plain_decimal(amount) {
            return Err(MoneyError::InvalidAmount(s.to_string()));
        }
        let amount =
            Decimal::from_str(amount).map_err(|_| MoneyError::InvalidAmount(s.to_string()))?;
        if !amount_in_range(amount) {
            return Err(MoneyError::InvalidAmount(s.to_string()));
        }

        let currency =
            Currency::from_code(code).map_err(|_| MoneyError::InvalidCurrency(s.to_string()))?;

        Ok(Money::new(amount, currency))
    }
}

/// `-?[0-9]+(\.[0-9]+)?`: no sign other than '-', no separators, no exponent.
fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(integer) && fraction.map_or(true, all_digits)
}

fn amount_in_range(amount: Decimal) -> bool {
    let limit = Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS));
    amount.abs().trunc() < limit && amount.normalize().scale() <= MAX_FRACTION_DIGITS
}

/// Formats as `"<CODE> <amount>"`, e.g. `USD 19.99`.
///
/// The amount keeps its scale, so formatting then parsing is exact.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.code(), self.amount)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

// =============================================================================
// Equality
// =============================================================================

/// Same amount and currency, or both zero.
impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        if self.is_zero() && other.is_zero() {
            return true;
        }
        self.amount == other.amount && self.currency == other.currency
    }
}

impl Eq for Money {}

/// Money only ever equals a bare number when both are zero.
impl PartialEq<Decimal> for Money {
    fn eq(&self, other: &Decimal) -> bool {
        other.is_zero() && self.is_zero()
    }
}

impl Hash for Money {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // zero amounts are equal across currencies, so they must hash alike
        if self.is_zero() {
            0u8.hash(state);
        } else {
            1u8.hash(state);
            self.amount.normalize().hash(state);
            self.currency.hash(state);
        }
    }
}

// =============================================================================
// Factor Conversions
// =============================================================================

impl From<Decimal> for Factor {
    fn from(value: Decimal) -> Self {
        Factor::Scalar(value)
    }
}

impl From<i64> for Factor {
    fn from(value: i64) -> Self {
        Factor::Scalar(Decimal::from(value))
    }
}

impl From<i32> for Factor {
    fn from(value: i32) -> Self {
        Factor::Scalar(Decimal::from(value))
    }
}

impl From<u32> for Factor {
    fn from(value: u32) -> Self {
        Factor::Scalar(Decimal::from(value))
    }
}

impl From<Money> for Factor {
    fn from(value: Money) -> Self {
        Factor::Money(value)
    }
}

impl From<&Money> for Factor {
    fn from(value: &Money) -> Self {
        Factor::Money(*value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
