//! # Error Types
//!
//! Domain-specific error types for vitrine-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrine-core errors (this file)                                       │
//! │  ├── MoneyError       - Currency lookup, arithmetic, wire format       │
//! │  ├── CoreError        - Catalog and list rule violations               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrine-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: MoneyError → CoreError → DbError → web layer                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (codes, node IDs, list IDs)
//! 3. Errors are enum variants, never String
//! 4. Nothing is swallowed or defaulted: every failure reaches the caller

use thiserror::Error;

use crate::catalog::{NodeId, VarianceId, VariantId};
use crate::currency::Currency;
use crate::lists::{ItemListKind, OrderStatus};

// =============================================================================
// Money Error
// =============================================================================

/// Failures of the money/currency value types.
///
/// The last three variants are parse failures of the `"<CODE> <amount>"`
/// wire format, distinguished so callers can point at the bad part.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Code is not in the currency registry.
    #[error("Currency {0} not defined")]
    UnknownCurrency(String),

    /// Binary operation between two different currencies.
    #[error("Cannot combine {left} and {right} amounts")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// Operation that makes no sense for money (Money × Money, x / 0, overflow).
    #[error("Invalid money operation: {0}")]
    InvalidOperation(String),

    /// Not two space-separated tokens.
    #[error("'{0}' is not in '<CODE> <amount>' format")]
    InvalidFormat(String),

    /// Format is right but the amount is not a decimal, or out of range.
    #[error("'{0}' has the correct format but an invalid amount")]
    InvalidAmount(String),

    /// Format is right but the code is not registered.
    #[error("'{0}' has the correct format but an invalid currency code")]
    InvalidCurrency(String),
}

/// Convenience type alias for Results with MoneyError.
pub type MoneyResult<T> = Result<T, MoneyError>;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The web layer translates them into user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Money arithmetic or parsing failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A tree mixes currencies along an ancestor chain.
    ///
    /// ## When This Occurs
    /// ```text
    /// Shoes (EUR 10) ──► Sneaker (USD 5)
    ///                         │
    ///                         ▼
    ///        effective_price(Sneaker)
    ///                         │
    ///                         ▼
    /// CurrencyAggregationConflict { node: Sneaker, expected: EUR, found: USD }
    /// ```
    #[error("Node {node} mixes currencies: expected {expected}, found {found}")]
    CurrencyAggregationConflict {
        node: NodeId,
        expected: Currency,
        found: Currency,
    },

    /// A stock sum over a subtree left the i64 range.
    #[error("Stock of node {node} overflows")]
    StockOverflow { node: NodeId },

    /// Node ID is not part of the tree.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Reparenting would make a node its own ancestor.
    #[error("Node {node} cannot be moved under {parent}")]
    InvalidParent { node: NodeId, parent: NodeId },

    /// Only leaves can be removed.
    #[error("Node {0} still has children")]
    HasChildren(NodeId),

    /// Only leaf products and variations can go into a list.
    #[error("Node {node} cannot be purchased")]
    NotProcurable { node: NodeId },

    /// Insufficient stock to complete checkout.
    #[error("Insufficient stock for node {node}: available {available}, requested {requested}")]
    InsufficientStock {
        node: NodeId,
        available: i64,
        requested: i64,
    },

    #[error("Variance not found: {0}")]
    VarianceNotFound(VarianceId),

    #[error("Variant not found: {0}")]
    VariantNotFound(VariantId),

    /// Retired variants stay where they are but are not handed out again.
    #[error("Variant {0} is retired")]
    VariantInactive(VariantId),

    /// Categories are not told apart by variants.
    #[error("Node {node} cannot carry variants")]
    VariantNotAllowed { node: NodeId },

    /// Item is not part of the list.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// List has exceeded maximum allowed items.
    #[error("List cannot have more than {max} items")]
    ListTooLarge { max: usize },

    /// The status log only moves forward.
    #[error("List {list_id} cannot go from {from:?} to {to:?}")]
    InvalidStatusTransition {
        list_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The list is not of a kind that allows the requested operation.
    #[error("List {list_id} is {kind:?}, cannot perform operation")]
    InvalidListKind { list_id: String, kind: ItemListKind },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a slug with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::currency;

    #[test]
    fn test_money_error_messages() {
        let usd = currency("USD").unwrap();
        let eur = currency("EUR").unwrap();
        let err = MoneyError::CurrencyMismatch {
            left: usd,
            right: eur,
        };
        assert_eq!(err.to_string(), "Cannot combine USD and EUR amounts");

        let err = MoneyError::UnknownCurrency("ZZZ".to_string());
        assert_eq!(err.to_string(), "Currency ZZZ not defined");
    }

    #[test]
    fn test_core_error_messages() {
        let err = CoreError::InsufficientStock {
            node: NodeId(7),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for node 7: available 3, requested 5"
        );
    }

    #[test]
    fn test_money_error_is_transparent() {
        let err: CoreError = MoneyError::InvalidFormat("USD".to_string()).into();
        assert!(matches!(err, CoreError::Money(MoneyError::InvalidFormat(_))));
        assert_eq!(err.to_string(), "'USD' is not in '<CODE> <amount>' format");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "slug".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
