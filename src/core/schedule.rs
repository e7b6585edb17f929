//! Scheduling engine - recurring weekly classes with conflict detection.
//!
//! A teacher or student can never be in two overlapping scheduled classes on the
//! same weekday. Overlap uses half-open intervals, so back-to-back lessons are fine.
//! Declared availability is advisory only: a class outside someone's windows is
//! still created and the caller gets an [`AvailabilityWarning`] for it.

use crate::{
    core::{
        availability::{availability_for, merge_windows},
        optional_text,
        roster::{require_student, require_teacher, teaches_instrument},
    },
    entities::{
        Class, ClassStudent, class, class_student,
        sea_orm_active_enums::{ActorKind, ClassDuration, ClassStatus, Frequency, Weekday},
    },
    errors::{Actor, Error, Result},
};
use chrono::{NaiveTime, Timelike};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// When a recurring class meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSlot {
    /// Day of the week
    pub weekday: Weekday,
    /// Start time
    pub start_time: NaiveTime,
    /// Lesson length
    pub duration: ClassDuration,
}

impl ClassSlot {
    fn start_second(&self) -> i64 {
        i64::from(self.start_time.num_seconds_from_midnight())
    }

    fn end_second(&self) -> i64 {
        self.start_second() + self.duration.minutes() * 60
    }

    /// Time the lesson ends.
    #[must_use]
    pub fn end_time(&self) -> NaiveTime {
        self.start_time + chrono::Duration::minutes(self.duration.minutes())
    }

    /// Whether two slots share any instant. `[start, end)` intervals.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.weekday == other.weekday
            && self.start_second() < other.end_second()
            && other.start_second() < self.end_second()
    }

    /// A class must end strictly before midnight. Ending exactly at midnight is
    /// rejected too, because [`Self::end_time`] would wrap to 00:00 and no declared
    /// availability window can reach past 23:59.
    fn validate(&self) -> Result<()> {
        if self.end_second() >= SECONDS_PER_DAY {
            return Err(Error::validation(format!(
                "A class starting at {} must end before midnight",
                self.start_time
            )));
        }
        Ok(())
    }
}

impl From<&class::Model> for ClassSlot {
    fn from(value: &class::Model) -> Self {
        Self {
            weekday: value.weekday,
            start_time: value.start_time,
            duration: value.duration,
        }
    }
}

/// Private or group lesson, derived from the number of enrolled students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    /// Exactly one student
    Private,
    /// More than one student
    Group,
}

impl ClassType {
    /// Type of a class with `student_count` students.
    #[must_use]
    pub const fn for_student_count(student_count: usize) -> Self {
        if student_count > 1 {
            Self::Group
        } else {
            Self::Private
        }
    }
}

/// Input for [`create_class`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClass {
    /// Teacher running the class
    pub teacher_id: i64,
    /// Instrument taught
    pub instrument_id: i64,
    /// Students attending; at least one
    pub student_ids: Vec<i64>,
    /// Weekly slot
    pub slot: ClassSlot,
    /// Meetings per week
    pub frequency: Frequency,
    /// Free-form notes
    pub notes: Option<String>,
}

/// A participant scheduled outside their declared availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityWarning {
    /// Teacher or student concerned
    pub actor: Actor,
    /// Day of the class
    pub weekday: Weekday,
    /// Class start
    pub start_time: NaiveTime,
    /// Class end
    pub end_time: NaiveTime,
}

/// A class with its students and any availability warnings.
#[derive(Debug, Clone)]
pub struct ScheduledClass {
    /// Stored class row
    pub class: class::Model,
    /// Enrolled students, ascending
    pub student_ids: Vec<i64>,
    /// Private or group
    pub class_type: ClassType,
    /// Participants outside their declared availability
    pub warnings: Vec<AvailabilityWarning>,
}

/// Loads a class or fails with [`Error::NotFound`].
pub(crate) async fn require_class<C>(db: &C, class_id: i64) -> Result<class::Model>
where
    C: ConnectionTrait,
{
    Class::find_by_id(class_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("class", class_id))
}

/// Students enrolled in a class, ascending by id.
pub async fn class_student_ids<C>(db: &C, class_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let links = ClassStudent::find()
        .filter(class_student::Column::ClassId.eq(class_id))
        .order_by_asc(class_student::Column::StudentId)
        .all(db)
        .await?;
    Ok(links.into_iter().map(|l| l.student_id).collect())
}

/// First scheduled class that would double-book the teacher or a student.
///
/// `exclude_class_id` skips the class being rescheduled.
async fn find_conflict<C>(
    db: &C,
    teacher_id: i64,
    student_ids: &[i64],
    slot: &ClassSlot,
    exclude_class_id: Option<i64>,
) -> Result<Option<(Actor, i64)>>
where
    C: ConnectionTrait,
{
    let mut query = Class::find()
        .filter(class::Column::Status.eq(ClassStatus::Scheduled))
        .filter(class::Column::Weekday.eq(slot.weekday));
    if let Some(id) = exclude_class_id {
        query = query.filter(class::Column::Id.ne(id));
    }
    let candidates = query
        .order_by_asc(class::Column::StartTime)
        .order_by_asc(class::Column::Id)
        .all(db)
        .await?;

    for other in candidates
        .iter()
        .filter(|c| ClassSlot::from(*c).overlaps(slot))
    {
        if other.teacher_id == teacher_id {
            let actor = Actor {
                kind: ActorKind::Teacher,
                id: teacher_id,
            };
            return Ok(Some((actor, other.id)));
        }
        let booked = class_student_ids(db, other.id).await?;
        if let Some(&student_id) = student_ids.iter().find(|id| booked.contains(id)) {
            let actor = Actor {
                kind: ActorKind::Student,
                id: student_id,
            };
            return Ok(Some((actor, other.id)));
        }
    }
    Ok(None)
}

async fn ensure_no_conflict<C>(
    db: &C,
    teacher_id: i64,
    student_ids: &[i64],
    slot: &ClassSlot,
    exclude_class_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    match find_conflict(db, teacher_id, student_ids, slot, exclude_class_id).await? {
        Some((actor, conflicting_class_id)) => Err(Error::Conflict {
            actor,
            conflicting_class_id,
        }),
        None => Ok(()),
    }
}

/// Participants whose declared availability does not cover the slot.
async fn availability_warnings<C>(
    db: &C,
    teacher_id: i64,
    student_ids: &[i64],
    slot: &ClassSlot,
) -> Result<Vec<AvailabilityWarning>>
where
    C: ConnectionTrait,
{
    let participants = std::iter::once(Actor {
        kind: ActorKind::Teacher,
        id: teacher_id,
    })
    .chain(student_ids.iter().map(|&id| Actor {
        kind: ActorKind::Student,
        id,
    }));

    let end_time = slot.end_time();
    let mut warnings = Vec::new();
    for actor in participants {
        let windows = merge_windows(&availability_for(db, actor.kind, actor.id).await?);
        if !windows
            .iter()
            .any(|w| w.covers(slot.weekday, slot.start_time, end_time))
        {
            warnings.push(AvailabilityWarning {
                actor,
                weekday: slot.weekday,
                start_time: slot.start_time,
                end_time,
            });
        }
    }
    Ok(warnings)
}

fn log_warnings(class_id: i64, warnings: &[AvailabilityWarning]) {
    for warning in warnings {
        tracing::warn!(
            class_id,
            "{} is not available {:?} {}-{}",
            warning.actor,
            warning.weekday,
            warning.start_time,
            warning.end_time
        );
    }
}

fn distinct_students(student_ids: &[i64]) -> Result<Vec<i64>> {
    if student_ids.is_empty() {
        return Err(Error::validation("A class needs at least one student"));
    }
    let mut seen = HashSet::new();
    if !student_ids.iter().all(|id| seen.insert(*id)) {
        return Err(Error::validation("A student can only be added to a class once"));
    }
    let mut ids = student_ids.to_vec();
    ids.sort_unstable();
    Ok(ids)
}

/// Creates a recurring class.
///
/// Validation, conflict detection and the inserts share one database transaction,
/// so a rejected class leaves nothing behind.
///
/// # Errors
/// - [`Error::Validation`] for an empty or duplicated student list, an inactive
///   participant, or a teacher who does not teach the instrument
/// - [`Error::NotFound`] for an unknown teacher or student
/// - [`Error::Conflict`] if the teacher or any student is already booked
pub async fn create_class(db: &DatabaseConnection, input: NewClass) -> Result<ScheduledClass> {
    let student_ids = distinct_students(&input.student_ids)?;
    input.slot.validate()?;

    let txn = db.begin().await?;

    let teacher = require_teacher(&txn, input.teacher_id).await?;
    if !teacher.active {
        return Err(Error::validation(format!(
            "Teacher {} is inactive",
            teacher.id
        )));
    }
    if !teaches_instrument(&txn, teacher.id, input.instrument_id).await? {
        return Err(Error::validation(format!(
            "Teacher {} does not teach instrument {}",
            teacher.id, input.instrument_id
        )));
    }
    for &student_id in &student_ids {
        if !require_student(&txn, student_id).await?.active {
            return Err(Error::validation(format!(
                "Student {student_id} is inactive"
            )));
        }
    }

    ensure_no_conflict(&txn, teacher.id, &student_ids, &input.slot, None).await?;

    let created = class::ActiveModel {
        teacher_id: Set(teacher.id),
        instrument_id: Set(input.instrument_id),
        weekday: Set(input.slot.weekday),
        start_time: Set(input.slot.start_time),
        duration: Set(input.slot.duration),
        frequency: Set(input.frequency),
        status: Set(ClassStatus::Scheduled),
        notes: Set(optional_text(input.notes)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for &student_id in &student_ids {
        class_student::ActiveModel {
            class_id: Set(created.id),
            student_id: Set(student_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let warnings = availability_warnings(&txn, teacher.id, &student_ids, &input.slot).await?;
    txn.commit().await?;

    tracing::info!(
        class_id = created.id,
        teacher_id = created.teacher_id,
        weekday = ?created.weekday,
        start = %created.start_time,
        students = student_ids.len(),
        "Created class"
    );
    log_warnings(created.id, &warnings);

    Ok(ScheduledClass {
        class_type: ClassType::for_student_count(student_ids.len()),
        class: created,
        student_ids,
        warnings,
    })
}

/// Moves a class to a new weekly slot.
///
/// The class itself is ignored when checking for conflicts.
///
/// # Errors
/// - [`Error::NotFound`] if the class does not exist
/// - [`Error::Validation`] if the class is cancelled
/// - [`Error::Conflict`] if the new slot double-books a participant
pub async fn reschedule_class(
    db: &DatabaseConnection,
    class_id: i64,
    new_slot: ClassSlot,
) -> Result<ScheduledClass> {
    new_slot.validate()?;
    let txn = db.begin().await?;

    let existing = require_class(&txn, class_id).await?;
    if existing.status == ClassStatus::Cancelled {
        return Err(Error::validation(format!(
            "Class {class_id} is cancelled and cannot be rescheduled"
        )));
    }

    let student_ids = class_student_ids(&txn, class_id).await?;
    ensure_no_conflict(
        &txn,
        existing.teacher_id,
        &student_ids,
        &new_slot,
        Some(class_id),
    )
    .await?;

    let mut model: class::ActiveModel = existing.into();
    model.weekday = Set(new_slot.weekday);
    model.start_time = Set(new_slot.start_time);
    model.duration = Set(new_slot.duration);
    let updated = model.update(&txn).await?;

    let warnings =
        availability_warnings(&txn, updated.teacher_id, &student_ids, &new_slot).await?;
    txn.commit().await?;

    tracing::info!(
        class_id,
        weekday = ?updated.weekday,
        start = %updated.start_time,
        "Rescheduled class"
    );
    log_warnings(class_id, &warnings);

    Ok(ScheduledClass {
        class_type: ClassType::for_student_count(student_ids.len()),
        class: updated,
        student_ids,
        warnings,
    })
}

/// Cancels a class. The row and its attendance history stay; cancelling twice is a no-op.
///
/// # Errors
/// Returns [`Error::NotFound`] if the class does not exist.
pub async fn cancel_class(db: &DatabaseConnection, class_id: i64) -> Result<()> {
    let existing = require_class(db, class_id).await?;
    if existing.status == ClassStatus::Cancelled {
        tracing::debug!(class_id, "Class already cancelled");
        return Ok(());
    }

    let mut model: class::ActiveModel = existing.into();
    model.status = Set(ClassStatus::Cancelled);
    model.update(db).await?;
    tracing::info!(class_id, "Cancelled class");
    Ok(())
}

/// Loads a class with its students.
///
/// Warnings are recomputed against current availability for scheduled classes.
pub async fn get_class(db: &DatabaseConnection, class_id: i64) -> Result<Option<ScheduledClass>> {
    let Some(found) = Class::find_by_id(class_id).one(db).await? else {
        return Ok(None);
    };
    let student_ids = class_student_ids(db, class_id).await?;
    let warnings = if found.status == ClassStatus::Scheduled {
        availability_warnings(db, found.teacher_id, &student_ids, &ClassSlot::from(&found)).await?
    } else {
        Vec::new()
    };

    Ok(Some(ScheduledClass {
        class_type: ClassType::for_student_count(student_ids.len()),
        class: found,
        student_ids,
        warnings,
    }))
}
