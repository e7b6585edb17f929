//! Unified error type for the academy core.
//!
//! Every domain failure is a recoverable value returned to the caller; the
//! caller decides how to present it.

use crate::entities::sea_orm_active_enums::ActorKind;
use thiserror::Error;

/// Which schedule participant collided with an existing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Teacher or student
    pub kind: ActorKind,
    /// Id of the teacher or student
    pub id: i64,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ActorKind::Teacher => write!(f, "teacher {}", self.id),
            ActorKind::Student => write!(f, "student {}", self.id),
        }
    }
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input failed a business rule that is not covered by a dedicated variant
    #[error("Validation error: {message}")]
    Validation {
        /// What was rejected
        message: String,
    },

    /// A lookup by id found nothing
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name (e.g. "class", "product")
        entity: &'static str,
        /// The id that was looked up
        id: i64,
    },

    /// Proposed class overlaps an existing scheduled class for a shared actor
    #[error("Schedule conflict for {actor} with class {conflicting_class_id}")]
    Conflict {
        /// The teacher or student who would be double-booked
        actor: Actor,
        /// The class already occupying the slot
        conflicting_class_id: i64,
    },

    /// Enrollment has no credits left for a deduction
    #[error("Insufficient credits on enrollment {enrollment_id}: balance {current_balance}")]
    InsufficientCredits {
        /// Enrollment being charged
        enrollment_id: i64,
        /// Balance at the time of the attempt
        current_balance: i32,
    },

    /// Product has no stock for the requested quantity
    #[error("Product {product_id} is out of stock: available {available}, requested {requested}")]
    OutOfStock {
        /// Product being rented or sold
        product_id: i64,
        /// Units on hand
        available: i32,
        /// Units requested
        requested: i32,
    },

    /// Product cannot be removed while rentals are open
    #[error("Product {product_id} has {open_rentals} open rental(s)")]
    ProductInUse {
        /// Product being removed
        product_id: i64,
        /// Number of unreturned rentals
        open_rentals: u64,
    },

    /// A second active enrollment for the same student, teacher and instrument
    #[error("Student {student_id} is already enrolled with teacher {teacher_id} for instrument {instrument_id}")]
    DuplicateEnrollment {
        /// Student id
        student_id: i64,
        /// Teacher id
        teacher_id: i64,
        /// Instrument id
        instrument_id: i64,
    },

    /// Monetary amount is negative, NaN, infinite or too large to store
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
