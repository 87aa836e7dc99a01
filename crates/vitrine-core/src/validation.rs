//! # Validation Module
//!
//! Input validation utilities for Vitrine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront forms                                             │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: vitrine-core (Rust)                                          │
//! │  ├── Type validation (deserialization, Money parsing)                  │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (slug)                                         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrine_core::validation::{validate_slug, validate_quantity};
//!
//! // Validate slug before inserting a node
//! validate_slug("running-shoes").unwrap();
//!
//! // Validate quantity before a cart operation
//! validate_quantity(5, 999).unwrap();
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest node name accepted.
pub const MAX_NAME_LEN: usize = 200;

/// Longest slug accepted.
pub const MAX_SLUG_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a node name.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_node_name;
///
/// assert!(validate_node_name("Running Shoes").is_ok());
/// assert!(validate_node_name("").is_err());
/// ```
pub fn validate_node_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

/// Validates a required single-line text field of at most `max` characters.
///
/// Leading and trailing whitespace does not count.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a URL slug.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
/// - Only lowercase ASCII letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_slug;
///
/// assert!(validate_slug("sneaker-42").is_ok());
/// assert!(validate_slug("Sneaker 42").is_err());
/// assert!(validate_slug(&"a".repeat(101)).is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    let slug = slug.trim();

    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "slug".to_string(),
        });
    }

    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::TooLong {
            field: "slug".to_string(),
            max: MAX_SLUG_LEN,
        });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            reason: "must contain only lowercase letters, numbers, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an item quantity against the configured maximum.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  Shopper enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5, max) ← THIS FUNCTION                             │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       │                                                                 │
/// │       ├── qty > max? → Error: "quantity must be between 1 and max"     │
/// │       │                                                                 │
/// │       └── OK → Proceed with ItemList::add_item                         │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_node_name() {
        assert!(validate_node_name("Sneaker 42").is_ok());
        assert!(validate_node_name("Škorně").is_ok());
        assert!(validate_node_name("").is_err());
        assert!(validate_node_name("   ").is_err());
        assert!(validate_node_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("shoes").is_ok());
        assert!(validate_slug("sneaker-42").is_ok());
        assert!(validate_slug("gift_card").is_ok());

        assert!(validate_slug("").is_err());
        assert!(validate_slug("Shoes").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug("a/b").is_err());
        assert!(validate_slug(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_required_text() {
        assert!(validate_required_text("label", "Size", 10).is_ok());
        assert!(matches!(
            validate_required_text("label", "  ", 10),
            Err(ValidationError::Required { field }) if field == "label"
        ));
        assert!(matches!(
            validate_required_text("label", "Shoe size EU", 10),
            Err(ValidationError::TooLong { max: 10, .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, 999).is_ok());
        assert!(validate_quantity(999, 999).is_ok());

        assert!(matches!(
            validate_quantity(0, 999),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-1, 999).is_err());
        assert!(matches!(
            validate_quantity(1000, 999),
            Err(ValidationError::OutOfRange { max: 999, .. })
        ));
    }
}
