//! Enumerations stored in entity columns.
//!
//! Each enum is persisted by its string (or integer) value so the database
//! stays readable and the values line up with what the front end expects.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Day of the week a recurring class or availability slot falls on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(9))")]
pub enum Weekday {
    #[sea_orm(string_value = "Monday")]
    Monday,
    #[sea_orm(string_value = "Tuesday")]
    Tuesday,
    #[sea_orm(string_value = "Wednesday")]
    Wednesday,
    #[sea_orm(string_value = "Thursday")]
    Thursday,
    #[sea_orm(string_value = "Friday")]
    Friday,
    #[sea_orm(string_value = "Saturday")]
    Saturday,
    #[sea_orm(string_value = "Sunday")]
    Sunday,
}

impl Weekday {
    /// Weekday of a calendar date.
    #[must_use]
    pub fn of(date: Date) -> Self {
        use chrono::Datelike;
        date.weekday().into()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// Whether a recurring class still runs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Lesson length in minutes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum ClassDuration {
    #[sea_orm(num_value = 30)]
    Minutes30,
    #[sea_orm(num_value = 45)]
    Minutes45,
    #[sea_orm(num_value = 60)]
    Minutes60,
}

impl ClassDuration {
    /// Length of the lesson in minutes.
    #[must_use]
    pub const fn minutes(self) -> i64 {
        match self {
            Self::Minutes30 => 30,
            Self::Minutes45 => 45,
            Self::Minutes60 => 60,
        }
    }
}

/// How many times per week a class meets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Frequency {
    #[sea_orm(num_value = 1)]
    OncePerWeek,
    #[sea_orm(num_value = 2)]
    TwicePerWeek,
}

/// Kind of ledger entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(string_value = "credit_purchase")]
    CreditPurchase,
    #[sea_orm(string_value = "credit_deduction")]
    CreditDeduction,
    #[sea_orm(string_value = "credit_adjustment")]
    CreditAdjustment,
    #[sea_orm(string_value = "inventory_payment")]
    InventoryPayment,
}

/// Sales tax regime applied to a payment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum TaxType {
    #[sea_orm(string_value = "HST")]
    #[serde(rename = "HST")]
    Hst,
    #[sea_orm(string_value = "GST")]
    #[serde(rename = "GST")]
    Gst,
    #[sea_orm(string_value = "None")]
    #[serde(rename = "None")]
    Exempt,
}

/// How a customer paid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "Credit Card")]
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[sea_orm(string_value = "Debit")]
    Debit,
    #[sea_orm(string_value = "Cash")]
    Cash,
    #[sea_orm(string_value = "E-Transfer")]
    #[serde(rename = "E-Transfer")]
    ETransfer,
}

/// Catalog category of a product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[sea_orm(string_value = "instrument")]
    Instrument,
    #[sea_orm(string_value = "book")]
    Book,
    #[sea_orm(string_value = "accessory")]
    Accessory,
    #[sea_orm(string_value = "musical_score")]
    MusicalScore,
    #[sea_orm(string_value = "gift_card")]
    GiftCard,
}

/// Billing period of a rental.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
pub enum RentalPeriod {
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// Proficiency of a student on one instrument.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SkillLevel {
    #[sea_orm(string_value = "Beginner")]
    Beginner,
    #[sea_orm(string_value = "Intermediate")]
    Intermediate,
    #[sea_orm(string_value = "Advanced")]
    Advanced,
}

/// Highest music qualification of a teacher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Qualification {
    #[sea_orm(string_value = "Bachelor of Music")]
    #[serde(rename = "Bachelor of Music")]
    BachelorOfMusic,
    #[sea_orm(string_value = "Master")]
    Master,
    #[sea_orm(string_value = "Doctorate")]
    Doctorate,
    #[sea_orm(string_value = "Professional Certificate")]
    #[serde(rename = "Professional Certificate")]
    ProfessionalCertificate,
    #[sea_orm(string_value = "Self-Taught Professional")]
    #[serde(rename = "Self-Taught Professional")]
    SelfTaughtProfessional,
}

/// Participant in a class schedule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "student")]
    Student,
}
