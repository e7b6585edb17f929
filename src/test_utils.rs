//! Shared test utilities for Encore.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        enrollment::{self, NewEnrollment},
        inventory::{self, NewCustomer, NewProduct},
        ledger::{CreditPricing, NewAdjustment},
        roster::{self, NewStudent, NewTeacher},
        schedule::{self, ClassSlot, NewClass, ScheduledClass},
    },
    entities::{
        self,
        sea_orm_active_enums::{
            ClassDuration, Frequency, PaymentMethod, ProductType, Qualification, TaxType, Weekday,
        },
    },
    errors::Result,
};
use chrono::{NaiveDate, NaiveTime};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// `NaiveDate` shorthand.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// `NaiveTime` shorthand.
pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// Teacher input with placeholder contact details and a $60 hourly rate.
pub fn teacher_input(name: &str, instrument_ids: Vec<i64>) -> NewTeacher {
    NewTeacher {
        name: name.to_string(),
        address: "1 Music Lane".to_string(),
        email: format!("{}@academy.test", name.to_lowercase()),
        primary_contact: "555-0100".to_string(),
        date_of_birth: None,
        biography: None,
        specialization: "Classical".to_string(),
        qualification: Qualification::BachelorOfMusic,
        date_of_enrollment: date(2023, 9, 1),
        hourly_rate: 60.0,
        instrument_ids,
    }
}

/// Creates a teacher of the given instruments.
pub async fn create_test_teacher(
    db: &DatabaseConnection,
    name: &str,
    instrument_ids: &[i64],
) -> Result<entities::teacher::Model> {
    roster::create_teacher(db, teacher_input(name, instrument_ids.to_vec())).await
}

/// Creates a student with no skill levels.
pub async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::student::Model> {
    roster::create_student(
        db,
        NewStudent {
            name: name.to_string(),
            address: "2 Practice Road".to_string(),
            email: format!("{}@family.test", name.to_lowercase()),
            primary_contact: "555-0199".to_string(),
            date_of_birth: Some(date(2012, 5, 17)),
            skill_levels: vec![],
        },
    )
    .await
}

/// Creates an instrument.
pub async fn create_test_instrument(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::instrument::Model> {
    roster::create_instrument(db, name).await
}

/// A small academy: Alice teaches Piano, and Emma is enrolled with her.
pub struct Academy {
    /// In-memory database
    pub db: DatabaseConnection,
    /// The Piano instrument
    pub piano: entities::instrument::Model,
    /// Alice, who teaches piano
    pub teacher: entities::teacher::Model,
    /// Emma
    pub student: entities::student::Model,
    /// Emma's piano enrollment with Alice, starting 2024-01-01, zero credits
    pub enrollment: entities::enrollment::Model,
}

/// Builds the [`Academy`] fixture.
pub async fn setup_academy() -> Result<Academy> {
    let db = setup_test_db().await?;
    let piano = create_test_instrument(&db, "Piano").await?;
    let teacher = create_test_teacher(&db, "Alice", &[piano.id]).await?;
    let student = create_test_student(&db, "Emma").await?;
    let enrollment = enrollment::create_enrollment(
        &db,
        NewEnrollment {
            student_id: student.id,
            teacher_id: teacher.id,
            instrument_id: piano.id,
            start_date: date(2024, 1, 1),
        },
    )
    .await?;

    Ok(Academy {
        db,
        piano,
        teacher,
        student,
        enrollment,
    })
}

/// A weekly 30-minute class definition.
pub fn new_class(
    teacher_id: i64,
    instrument_id: i64,
    student_ids: Vec<i64>,
    weekday: Weekday,
    start_time: NaiveTime,
) -> NewClass {
    NewClass {
        teacher_id,
        instrument_id,
        student_ids,
        slot: ClassSlot {
            weekday,
            start_time,
            duration: ClassDuration::Minutes30,
        },
        frequency: Frequency::OncePerWeek,
        notes: None,
    }
}

/// Schedules a weekly 30-minute class.
pub async fn create_test_class(
    db: &DatabaseConnection,
    teacher_id: i64,
    instrument_id: i64,
    student_ids: Vec<i64>,
    weekday: Weekday,
    start_time: NaiveTime,
) -> Result<ScheduledClass> {
    schedule::create_class(
        db,
        new_class(teacher_id, instrument_id, student_ids, weekday, start_time),
    )
    .await
}

/// HST card payment on 2024-01-02 with no discount.
pub fn pricing(price_per_credit: f64) -> CreditPricing {
    CreditPricing {
        date: date(2024, 1, 2),
        price_per_credit,
        discount_amount: 0.0,
        discount_note: None,
        tax_type: TaxType::Hst,
        payment_method: PaymentMethod::CreditCard,
    }
}

/// A manual adjustment on the fixture enrollment.
pub fn adjustment(academy: &Academy, credits: i32, note: &str) -> NewAdjustment {
    NewAdjustment {
        student_id: academy.student.id,
        enrollment_id: academy.enrollment.id,
        credits,
        date: date(2024, 1, 3),
        note: note.to_string(),
    }
}

/// A rentable instrument costing $50, selling for $100, renting for $25, reorder level 2.
pub fn product_input(name: &str, stock_quantity: i32) -> NewProduct {
    NewProduct {
        product_type: ProductType::Instrument,
        name: name.to_string(),
        model: None,
        serial_number: None,
        supplier_id: None,
        cost: 50.0,
        selling_price: 100.0,
        rental_price: Some(25.0),
        stock_quantity,
        reorder_level: 2,
    }
}

/// Creates a product from [`product_input`].
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    stock_quantity: i32,
) -> Result<entities::product::Model> {
    inventory::create_product(db, product_input(name, stock_quantity)).await
}

/// Creates a store customer.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::customer::Model> {
    inventory::create_customer(
        db,
        NewCustomer {
            name: name.to_string(),
            email: format!("{}@customer.test", name.to_lowercase()),
            ..Default::default()
        },
    )
    .await
}
