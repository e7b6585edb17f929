//! Enrollment business logic - binding a student to a teacher for an instrument.
//!
//! Each enrollment owns exactly one credit balance, created zeroed together with the
//! enrollment. At most one enrollment per (student, teacher, instrument) can be
//! active at a time.

use crate::{
    core::roster::{require_student, require_teacher, teaches_instrument},
    entities::{Enrollment, enrollment, student_balance},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Input for [`create_enrollment`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewEnrollment {
    /// Student being enrolled
    pub student_id: i64,
    /// Teacher assigned
    pub teacher_id: i64,
    /// Instrument studied
    pub instrument_id: i64,
    /// First day
    pub start_date: Date,
}

/// Finds the active enrollment for a (student, teacher, instrument) triple.
pub async fn find_active_enrollment<C>(
    db: &C,
    student_id: i64,
    teacher_id: i64,
    instrument_id: i64,
) -> Result<Option<enrollment::Model>>
where
    C: ConnectionTrait,
{
    Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::TeacherId.eq(teacher_id))
        .filter(enrollment::Column::InstrumentId.eq(instrument_id))
        .filter(enrollment::Column::EndDate.is_null())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an enrollment and its zeroed credit balance in one transaction.
///
/// # Errors
/// - [`Error::NotFound`] if the student or teacher does not exist
/// - [`Error::Validation`] if either is inactive or the teacher does not teach the instrument
/// - [`Error::DuplicateEnrollment`] if the triple already has an active enrollment
pub async fn create_enrollment(
    db: &DatabaseConnection,
    input: NewEnrollment,
) -> Result<enrollment::Model> {
    let txn = db.begin().await?;

    let student = require_student(&txn, input.student_id).await?;
    if !student.active {
        return Err(Error::validation(format!(
            "Student {} is inactive",
            student.id
        )));
    }
    let teacher = require_teacher(&txn, input.teacher_id).await?;
    if !teacher.active {
        return Err(Error::validation(format!(
            "Teacher {} is inactive",
            teacher.id
        )));
    }
    if !teaches_instrument(&txn, input.teacher_id, input.instrument_id).await? {
        return Err(Error::validation(format!(
            "Teacher {} does not teach instrument {}",
            input.teacher_id, input.instrument_id
        )));
    }

    if find_active_enrollment(&txn, input.student_id, input.teacher_id, input.instrument_id)
        .await?
        .is_some()
    {
        return Err(Error::DuplicateEnrollment {
            student_id: input.student_id,
            teacher_id: input.teacher_id,
            instrument_id: input.instrument_id,
        });
    }

    let created = enrollment::ActiveModel {
        student_id: Set(input.student_id),
        teacher_id: Set(input.teacher_id),
        instrument_id: Set(input.instrument_id),
        start_date: Set(input.start_date),
        end_date: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    student_balance::ActiveModel {
        enrollment_id: Set(created.id),
        student_id: Set(created.student_id),
        total_purchased: Set(0),
        total_used: Set(0),
        current_balance: Set(0),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    tracing::info!(
        enrollment_id = created.id,
        student_id = created.student_id,
        teacher_id = created.teacher_id,
        instrument_id = created.instrument_id,
        "Created enrollment"
    );
    Ok(created)
}

/// Finds an enrollment by id.
pub async fn get_enrollment(
    db: &DatabaseConnection,
    enrollment_id: i64,
) -> Result<Option<enrollment::Model>> {
    Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an enrollment or fails with [`Error::NotFound`].
pub(crate) async fn require_enrollment<C>(db: &C, enrollment_id: i64) -> Result<enrollment::Model>
where
    C: ConnectionTrait,
{
    Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("enrollment", enrollment_id))
}

/// Ends an enrollment. Its balance and ledger stay readable.
///
/// # Errors
/// - [`Error::NotFound`] if the enrollment does not exist
/// - [`Error::Validation`] if it already ended or `end_date` is before its start
pub async fn end_enrollment(
    db: &DatabaseConnection,
    enrollment_id: i64,
    end_date: Date,
) -> Result<enrollment::Model> {
    let existing = require_enrollment(db, enrollment_id).await?;
    if !existing.is_active() {
        return Err(Error::validation(format!(
            "Enrollment {enrollment_id} has already ended"
        )));
    }
    if end_date < existing.start_date {
        return Err(Error::validation(format!(
            "Enrollment {enrollment_id} cannot end before it starts"
        )));
    }

    let mut model: enrollment::ActiveModel = existing.into();
    model.end_date = Set(Some(end_date));
    let updated = model.update(db).await?;
    tracing::info!(enrollment_id, %end_date, "Ended enrollment");
    Ok(updated)
}

/// Every enrollment of a student, oldest first.
pub async fn enrollments_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<enrollment::Model>> {
    Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .order_by_asc(enrollment::Column::StartDate)
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
