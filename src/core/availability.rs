//! Declared weekly availability of teachers and students.
//!
//! Availability never blocks scheduling; the scheduler uses it to warn when a class
//! falls outside someone's declared windows.

use crate::{
    core::roster::{require_student, require_teacher},
    entities::{
        AvailabilitySlot, availability_slot,
        sea_orm_active_enums::{ActorKind, Weekday},
    },
    errors::{Error, Result},
};
use chrono::NaiveTime;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// One weekly window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInput {
    /// Day of the week
    pub day: Weekday,
    /// Window start (inclusive)
    pub start_time: NaiveTime,
    /// Window end (exclusive)
    pub end_time: NaiveTime,
}

impl SlotInput {
    /// Whether `[start, end)` on `day` lies entirely inside this window.
    #[must_use]
    pub fn covers(&self, day: Weekday, start: NaiveTime, end: NaiveTime) -> bool {
        self.day == day && self.start_time <= start && end <= self.end_time
    }
}

/// Joins overlapping or touching windows on the same day, so `15:00-16:00` and
/// `16:00-17:00` become `15:00-17:00`. The result is ordered by day then start.
#[must_use]
pub fn merge_windows(slots: &[SlotInput]) -> Vec<SlotInput> {
    let mut sorted = slots.to_vec();
    sorted.sort_by_key(|s| (s.day, s.start_time));

    let mut merged: Vec<SlotInput> = Vec::with_capacity(sorted.len());
    for slot in sorted {
        match merged.last_mut() {
            Some(last) if last.day == slot.day && slot.start_time <= last.end_time => {
                last.end_time = last.end_time.max(slot.end_time);
            }
            _ => merged.push(slot),
        }
    }
    merged
}

impl From<availability_slot::Model> for SlotInput {
    fn from(value: availability_slot::Model) -> Self {
        Self {
            day: value.day,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

async fn ensure_owner_exists<C>(db: &C, owner_kind: ActorKind, owner_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    match owner_kind {
        ActorKind::Teacher => require_teacher(db, owner_id).await.map(|_| ()),
        ActorKind::Student => require_student(db, owner_id).await.map(|_| ()),
    }
}

/// Replaces every declared slot of one teacher or student.
///
/// Passing an empty list clears the owner's availability.
pub async fn set_availability(
    db: &DatabaseConnection,
    owner_kind: ActorKind,
    owner_id: i64,
    slots: &[SlotInput],
) -> Result<Vec<SlotInput>> {
    if let Some(bad) = slots.iter().find(|s| s.start_time >= s.end_time) {
        return Err(Error::validation(format!(
            "Availability on {:?} must start before it ends ({} >= {})",
            bad.day, bad.start_time, bad.end_time
        )));
    }

    let txn = db.begin().await?;
    ensure_owner_exists(&txn, owner_kind, owner_id).await?;

    AvailabilitySlot::delete_many()
        .filter(availability_slot::Column::OwnerKind.eq(owner_kind))
        .filter(availability_slot::Column::OwnerId.eq(owner_id))
        .exec(&txn)
        .await?;

    for slot in slots {
        availability_slot::ActiveModel {
            owner_kind: Set(owner_kind),
            owner_id: Set(owner_id),
            day: Set(slot.day),
            start_time: Set(slot.start_time),
            end_time: Set(slot.end_time),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(
        ?owner_kind,
        owner_id,
        slots = slots.len(),
        "Updated availability"
    );
    availability_for(db, owner_kind, owner_id).await
}

/// Declared slots of one teacher or student, ordered by day then start time.
pub async fn availability_for<C>(
    db: &C,
    owner_kind: ActorKind,
    owner_id: i64,
) -> Result<Vec<SlotInput>>
where
    C: ConnectionTrait,
{
    let mut slots: Vec<SlotInput> = AvailabilitySlot::find()
        .filter(availability_slot::Column::OwnerKind.eq(owner_kind))
        .filter(availability_slot::Column::OwnerId.eq(owner_id))
        .order_by_asc(availability_slot::Column::StartTime)
        .all(db)
        .await?
        .into_iter()
        .map(SlotInput::from)
        .collect();
    slots.sort_by_key(|s| (s.day, s.start_time));
    Ok(slots)
}
