//! Attendance marking and the credit deductions it drives.
//!
//! Marking is idempotent per (class, student, date): the attendance record is
//! upserted, and the ledger only moves when the mark changes whether a live
//! deduction should exist. Unmarking never deletes the original deduction; it appends
//! an adjustment that reverses it.

use crate::{
    config::settings::LedgerPolicy,
    core::{
        enrollment::find_active_enrollment,
        ledger::{live_deduction, record_deduction, reverse_deduction},
        schedule::{class_student_ids, require_class},
    },
    entities::{
        AttendanceRecord, attendance_record,
        sea_orm_active_enums::{ClassStatus, Weekday},
        transaction,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

async fn upsert_record<C>(
    db: &C,
    class_id: i64,
    student_id: i64,
    date: Date,
    attended: bool,
) -> Result<attendance_record::Model>
where
    C: ConnectionTrait,
{
    let existing = AttendanceRecord::find()
        .filter(attendance_record::Column::ClassId.eq(class_id))
        .filter(attendance_record::Column::StudentId.eq(student_id))
        .filter(attendance_record::Column::Date.eq(date))
        .one(db)
        .await?;

    match existing {
        Some(record) if record.attended == attended => Ok(record),
        Some(record) => {
            let mut model: attendance_record::ActiveModel = record.into();
            model.attended = Set(attended);
            model.update(db).await.map_err(Into::into)
        }
        None => attendance_record::ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            date: Set(date),
            attended: Set(attended),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(Into::into),
    }
}

/// Marks whether a student attended one occurrence of a class.
///
/// Returns the ledger entry written, if any:
/// - attended, no live deduction yet: a `-1` deduction against the student's
///   active enrollment for the class teacher and instrument
/// - not attended, a live deduction exists: a `+1` adjustment reversing it
/// - otherwise `None`; repeating a mark changes nothing
///
/// The record and the ledger entry share one database transaction.
///
/// # Errors
/// - [`Error::NotFound`] if the class does not exist
/// - [`Error::Validation`] if the class is cancelled, the student is not in it,
///   `date` is not on the class weekday, or no active enrollment covers it
/// - [`Error::InsufficientCredits`] if the balance is exhausted and the policy
///   forbids going negative; nothing is recorded
pub async fn mark_attendance(
    db: &DatabaseConnection,
    class_id: i64,
    student_id: i64,
    date: Date,
    attended: bool,
    policy: LedgerPolicy,
) -> Result<Option<transaction::Model>> {
    let txn = db.begin().await?;

    let class = require_class(&txn, class_id).await?;
    if class.status == ClassStatus::Cancelled {
        return Err(Error::validation(format!("Class {class_id} is cancelled")));
    }
    if Weekday::of(date) != class.weekday {
        return Err(Error::validation(format!(
            "Class {class_id} meets on {:?}, not on {date}",
            class.weekday
        )));
    }
    if !class_student_ids(&txn, class_id).await?.contains(&student_id) {
        return Err(Error::validation(format!(
            "Student {student_id} is not in class {class_id}"
        )));
    }

    upsert_record(&txn, class_id, student_id, date, attended).await?;
    let live = live_deduction(&txn, class_id, student_id, date).await?;

    let entry = match (attended, live) {
        (true, None) => {
            let enrollment =
                find_active_enrollment(&txn, student_id, class.teacher_id, class.instrument_id)
                    .await?
                    .ok_or_else(|| {
                        Error::validation(format!(
                            "Student {student_id} has no active enrollment for class {class_id}"
                        ))
                    })?;
            Some(record_deduction(&txn, &enrollment, class_id, date, policy).await?)
        }
        (false, Some(deduction)) => Some(reverse_deduction(&txn, &deduction, date).await?),
        _ => None,
    };

    txn.commit().await?;
    tracing::debug!(class_id, student_id, %date, attended, "Marked attendance");
    Ok(entry)
}

/// Attendance records of a class, optionally for one date, oldest first.
pub async fn attendance_for_class(
    db: &DatabaseConnection,
    class_id: i64,
    date: Option<Date>,
) -> Result<Vec<attendance_record::Model>> {
    let mut query = AttendanceRecord::find().filter(attendance_record::Column::ClassId.eq(class_id));
    if let Some(date) = date {
        query = query.filter(attendance_record::Column::Date.eq(date));
    }
    query
        .order_by_asc(attendance_record::Column::Date)
        .order_by_asc(attendance_record::Column::StudentId)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::TaxRates;
    use crate::core::{ledger, schedule};
    use crate::entities::sea_orm_active_enums::TransactionType;
    use crate::test_utils::*;

    fn monday() -> Date {
        date(2024, 1, 8)
    }

    async fn class_with_credits(fx: &Academy, credits: i32) -> Result<i64> {
        if credits > 0 {
            ledger::add_credit_purchase(
                &fx.db,
                fx.student.id,
                fx.enrollment.id,
                credits,
                &pricing(5.0),
                &TaxRates::default(),
            )
            .await?;
        }
        let scheduled = create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![fx.student.id],
            Weekday::Monday,
            time(16, 0),
        )
        .await?;
        Ok(scheduled.class.id)
    }

    #[tokio::test]
    async fn test_marking_twice_deducts_once() -> Result<()> {
        let fx = setup_academy().await?;
        let class_id = class_with_credits(&fx, 5).await?;
        let policy = LedgerPolicy::default();

        let first = mark_attendance(&fx.db, class_id, fx.student.id, monday(), true, policy)
            .await?
            .unwrap();
        assert_eq!(first.transaction_type, TransactionType::CreditDeduction);
        assert_eq!(first.credits, -1);
        assert_eq!(first.occurrence_date, Some(monday()));

        let second =
            mark_attendance(&fx.db, class_id, fx.student.id, monday(), true, policy).await?;
        assert!(second.is_none());

        let balance = ledger::get_balance(&fx.db, fx.enrollment.id).await?;
        assert_eq!(balance.current_balance, 4);
        assert_eq!(balance.total_used, 1);
        assert_eq!(attendance_for_class(&fx.db, class_id, None).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_appends_reversal_and_rededucts() -> Result<()> {
        let fx = setup_academy().await?;
        let class_id = class_with_credits(&fx, 5).await?;
        let policy = LedgerPolicy::default();

        let deduction = mark_attendance(&fx.db, class_id, fx.student.id, monday(), true, policy)
            .await?
            .unwrap();
        let reversal = mark_attendance(&fx.db, class_id, fx.student.id, monday(), false, policy)
            .await?
            .unwrap();
        assert_eq!(reversal.transaction_type, TransactionType::CreditAdjustment);
        assert_eq!(reversal.credits, 1);
        assert_eq!(reversal.reverses_transaction_id, Some(deduction.id));
        assert_eq!(
            ledger::get_balance(&fx.db, fx.enrollment.id).await?.current_balance,
            5
        );

        // Unmarking again does nothing
        assert!(
            mark_attendance(&fx.db, class_id, fx.student.id, monday(), false, policy)
                .await?
                .is_none()
        );

        let rededucted = mark_attendance(&fx.db, class_id, fx.student.id, monday(), true, policy)
            .await?
            .unwrap();
        assert_ne!(rededucted.id, deduction.id);

        let balance = ledger::get_balance(&fx.db, fx.enrollment.id).await?;
        assert_eq!(balance.current_balance, 4);
        assert_eq!(balance.total_purchased - balance.total_used, 4);
        assert_eq!(ledger::ledger_sum(&fx.db, fx.enrollment.id).await?, 4);

        // The original deduction is still in the ledger
        assert!(ledger::get_transaction(&fx.db, deduction.id).await?.is_some());
        let live = ledger::live_deduction(&fx.db, class_id, fx.student.id, monday())
            .await?
            .unwrap();
        assert_eq!(live.id, rededucted.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_insufficient_credits_rolls_back_record() -> Result<()> {
        let fx = setup_academy().await?;
        let class_id = class_with_credits(&fx, 0).await?;

        let result = mark_attendance(
            &fx.db,
            class_id,
            fx.student.id,
            monday(),
            true,
            LedgerPolicy::default(),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientCredits {
                current_balance: 0,
                ..
            }
        ));
        assert!(attendance_for_class(&fx.db, class_id, Some(monday())).await?.is_empty());

        let lenient = LedgerPolicy {
            allow_negative_balance: true,
        };
        mark_attendance(&fx.db, class_id, fx.student.id, monday(), true, lenient).await?;
        assert_eq!(
            ledger::get_balance(&fx.db, fx.enrollment.id).await?.current_balance,
            -1
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_absent_first_mark_writes_no_entry() -> Result<()> {
        let fx = setup_academy().await?;
        let class_id = class_with_credits(&fx, 1).await?;

        let entry = mark_attendance(
            &fx.db,
            class_id,
            fx.student.id,
            monday(),
            false,
            LedgerPolicy::default(),
        )
        .await?;
        assert!(entry.is_none());

        let records = attendance_for_class(&fx.db, class_id, Some(monday())).await?;
        assert_eq!(records.len(), 1);
        assert!(!records[0].attended);
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_attendance_validation() -> Result<()> {
        let fx = setup_academy().await?;
        let class_id = class_with_credits(&fx, 3).await?;
        let liam = create_test_student(&fx.db, "Liam").await?;
        let policy = LedgerPolicy::default();

        // Tuesday
        let result =
            mark_attendance(&fx.db, class_id, fx.student.id, date(2024, 1, 9), true, policy).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = mark_attendance(&fx.db, class_id, liam.id, monday(), true, policy).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = mark_attendance(&fx.db, 999, fx.student.id, monday(), true, policy).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "class",
                id: 999
            }
        ));

        schedule::cancel_class(&fx.db, class_id).await?;
        let result =
            mark_attendance(&fx.db, class_id, fx.student.id, monday(), true, policy).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }
}
