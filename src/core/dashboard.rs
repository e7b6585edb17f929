//! Dashboard generation - the daily overview of classes, credits and inventory.
//!
//! Everything is computed on read for the date passed in, so the same database
//! gives a different dashboard tomorrow without any background job.

use crate::{
    config::settings::AcademySettings,
    core::query::{
        self, ClassOccurrence, CreditAlert, InventoryAlert, todays_classes, upcoming_classes,
    },
    entities::{Enrollment, Rental, enrollment, rental},
    errors::Result,
};
use sea_orm::{PaginatorTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    /// Scheduled class meetings today
    pub classes_today: usize,
    /// Distinct students with an active enrollment
    pub students_enrolled: usize,
    /// Rentals not yet returned, overdue included
    pub active_rentals: u64,
    /// Active products at or below their reorder level
    pub low_stock_count: usize,
}

/// The full daily overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    /// Day the dashboard was computed for
    pub date: Date,
    /// Headline numbers
    pub metrics: DashboardMetrics,
    /// Today's meetings, by start time
    pub todays_classes: Vec<ClassOccurrence>,
    /// Meetings over the next few days
    pub upcoming_classes: Vec<ClassOccurrence>,
    /// Enrollments running out of credits
    pub credit_alerts: Vec<CreditAlert>,
    /// Low stock and overdue rentals
    pub inventory_alerts: Vec<InventoryAlert>,
}

async fn students_enrolled(db: &DatabaseConnection) -> Result<usize> {
    let active = Enrollment::find()
        .filter(enrollment::Column::EndDate.is_null())
        .all(db)
        .await?;
    Ok(active
        .iter()
        .map(|e| e.student_id)
        .collect::<HashSet<_>>()
        .len())
}

/// Builds the dashboard for `today`.
///
/// Thresholds and the upcoming window come from `settings.alerts`.
pub async fn dashboard(
    db: &DatabaseConnection,
    today: Date,
    settings: &AcademySettings,
) -> Result<Dashboard> {
    let todays = todays_classes(db, today).await?;
    let upcoming = upcoming_classes(db, today, settings.alerts.upcoming_days).await?;
    let credit_alerts =
        query::low_balance_alerts(db, settings.alerts.low_balance_threshold).await?;
    let inventory_alerts = query::inventory_alerts(db, today, &settings.alerts).await?;

    let stock = query::stock_partitions(db).await?;
    let active_rentals = Rental::find()
        .filter(rental::Column::ReturnDate.is_null())
        .count(db)
        .await?;

    let metrics = DashboardMetrics {
        classes_today: todays.len(),
        students_enrolled: students_enrolled(db).await?,
        active_rentals,
        low_stock_count: stock.out_of_stock.len() + stock.low_stock.len(),
    };
    tracing::debug!(%today, ?metrics, "Computed dashboard");

    Ok(Dashboard {
        date: today,
        metrics,
        todays_classes: todays,
        upcoming_classes: upcoming,
        credit_alerts,
        inventory_alerts,
    })
}

/// One-line summary of the metrics, for logs.
#[must_use]
pub fn format_metrics(metrics: &DashboardMetrics) -> String {
    format!(
        "{} classes today, {} students enrolled, {} active rentals, {} low stock",
        metrics.classes_today,
        metrics.students_enrolled,
        metrics.active_rentals,
        metrics.low_stock_count
    )
}

/// Human-readable line for one meeting, e.g. `16:00 Piano with Alice (Emma)`.
#[must_use]
pub fn format_occurrence(occurrence: &ClassOccurrence) -> String {
    let class = &occurrence.class;
    let students: Vec<&str> = class.students.iter().map(|s| s.name.as_str()).collect();
    format!(
        "{} {} with {} ({})",
        class.start_time.format("%H:%M"),
        class.instrument_name,
        class.teacher_name,
        students.join(", ")
    )
}
