//! # Error Types
//!
//! Domain-specific error types for haulwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  haulwise-core errors (this file)                                      │
//! │  ├── CoreError        - Wraps everything below + rule/config errors    │
//! │  ├── ValidationError  - Malformed numeric input (never clamped)        │
//! │  └── FormulaError     - Formula parse/evaluation failures              │
//! │                                                                         │
//! │  Warnings (not errors, see calculator.rs)                              │
//! │  └── DegenerateResult - Negative total/margin, oversized discount      │
//! │                                                                         │
//! │  quote-cli errors (app crate)                                          │
//! │  └── CliError         - What the terminal user sees                    │
//! │                                                                         │
//! │  Flow: ValidationError/FormulaError → CoreError → CliError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, rule id, position)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::calculator::DegenerateResult;

// =============================================================================
// Core Error
// =============================================================================

/// Core pricing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A formula failed to parse or evaluate.
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// A calculation rule failed.
    ///
    /// ## When This Occurs
    /// - The rule's formula does not parse (at compile time)
    /// - The rule references a field missing from the context (strict mode)
    /// - The rule divides by zero (strict mode)
    #[error("Calculation rule '{rule_id}' failed: {source}")]
    Rule {
        rule_id: String,
        #[source]
        source: FormulaError,
    },

    /// Two rules in the same rule set share an id.
    #[error("Duplicate calculation rule id: {0}")]
    DuplicateRule(String),

    /// The pricing config was written by a newer schema than this build knows.
    #[error("Unsupported pricing config version {found} (supported: up to {supported})")]
    UnsupportedConfigVersion { found: u32, supported: u32 },

    /// The caller asked for degenerate results to be rejected.
    ///
    /// ## User Workflow
    /// ```text
    /// Quote editor: 100% discount + cost lines
    ///      │
    ///      ▼
    /// calculate() → margin = -140 (flagged, not an error)
    ///      │
    ///      ▼
    /// reject_degenerate() ← caller policy
    ///      │
    ///      ▼
    /// CoreError::Degenerate([NegativeMargin])
    /// ```
    #[error("Calculation produced a degenerate result: {0:?}")]
    Degenerate(Vec<DegenerateResult>),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field so the quote editor can
/// highlight it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// NaN or infinity crossed the f64 boundary.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Arithmetic overflowed the decimal range.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Invalid format (e.g. an output field that is not an identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Formula Error
// =============================================================================

/// Formula parse and evaluation errors.
///
/// Positions are byte offsets into the formula source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The formula is empty or whitespace only.
    #[error("formula is empty")]
    Empty,

    /// The formula source exceeds the length limit.
    #[error("formula exceeds {max} characters")]
    TooLong { max: usize },

    /// A character outside the formula alphabet.
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    /// A malformed number literal such as `1.2.3`.
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber { literal: String, position: usize },

    /// A token that does not fit the grammar at this point.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    /// Any other grammar violation, such as two operands in a row.
    #[error("invalid formula: {message}")]
    Syntax { message: String },

    /// The formula ended in the middle of an expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// `name(...)` syntax. Only arithmetic is allowed.
    #[error("function calls are not supported: '{name}' at position {position}")]
    UnsupportedFunction { name: String, position: usize },

    /// Parentheses or unary minus nested beyond the limit.
    #[error("formula nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    /// An identifier with no value in the context.
    #[error("unbound variable '{name}'")]
    UnboundVariable { name: String },

    /// Division by exactly zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The result (or an intermediate value) is NaN or infinite.
    #[error("formula result is not finite")]
    NonFinite,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
