//! Read-only projections over the schedule, balances and inventory.
//!
//! Nothing here writes. Filters compose with AND and a `None` field matches
//! everything. Derived states (overdue, low stock, low balance) are computed
//! against the date passed in, never read from a stored flag.

use crate::{
    config::settings::AlertSettings,
    core::{
        rental::{RentalStatus, days_overdue, rental_status},
        schedule::{ClassSlot, ClassType},
    },
    entities::{
        Class, ClassStudent, Customer, Enrollment, Instrument, Product, Rental, Student,
        StudentBalance, Teacher, class, class_student, customer, enrollment, instrument, product,
        rental,
        sea_orm_active_enums::{ClassDuration, ClassStatus, Frequency, Weekday},
        student, student_balance, teacher,
    },
    errors::Result,
};
use chrono::{Days, NaiveTime};
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Filter for [`list_classes`]; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClassFilter {
    /// Only classes on this day
    pub weekday: Option<Weekday>,
    /// Only this teacher's classes
    pub teacher_id: Option<i64>,
    /// Only classes this student attends
    pub student_id: Option<i64>,
    /// Only classes for this instrument
    pub instrument_id: Option<i64>,
    /// Only scheduled (or only cancelled) classes
    pub status: Option<ClassStatus>,
}

/// A student as shown on a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRef {
    /// Student id
    pub id: i64,
    /// Student name
    pub name: String,
}

/// A class with names resolved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassView {
    /// Class id
    pub class_id: i64,
    /// Teacher id
    pub teacher_id: i64,
    /// Teacher name
    pub teacher_name: String,
    /// Instrument id
    pub instrument_id: i64,
    /// Instrument name
    pub instrument_name: String,
    /// Day the class meets
    pub weekday: Weekday,
    /// Lesson start
    pub start_time: NaiveTime,
    /// Lesson end
    pub end_time: NaiveTime,
    /// Lesson length
    pub duration: ClassDuration,
    /// Meetings per week
    pub frequency: Frequency,
    /// Scheduled or cancelled
    pub status: ClassStatus,
    /// Private or group
    pub class_type: ClassType,
    /// Students, alphabetically
    pub students: Vec<StudentRef>,
}

/// One dated meeting of a recurring class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassOccurrence {
    /// Date of the meeting
    pub date: Date,
    /// The class
    pub class: ClassView,
}

async fn names_by_id<E, F>(
    db: &DatabaseConnection,
    id_column: E::Column,
    ids: Vec<i64>,
    name_of: F,
) -> Result<HashMap<i64, String>>
where
    E: EntityTrait,
    F: Fn(E::Model) -> (i64, String),
{
    let rows = E::find().filter(id_column.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(name_of).collect())
}

async fn class_views(db: &DatabaseConnection, classes: Vec<class::Model>) -> Result<Vec<ClassView>> {
    let class_ids: Vec<i64> = classes.iter().map(|c| c.id).collect();
    let links = ClassStudent::find()
        .filter(class_student::Column::ClassId.is_in(class_ids))
        .all(db)
        .await?;

    let teachers = names_by_id::<Teacher, _>(
        db,
        teacher::Column::Id,
        classes.iter().map(|c| c.teacher_id).collect(),
        |t: teacher::Model| (t.id, t.name),
    )
    .await?;
    let instruments = names_by_id::<Instrument, _>(
        db,
        instrument::Column::Id,
        classes.iter().map(|c| c.instrument_id).collect(),
        |i: instrument::Model| (i.id, i.name),
    )
    .await?;
    let students = names_by_id::<Student, _>(
        db,
        student::Column::Id,
        links.iter().map(|l| l.student_id).collect(),
        |s: student::Model| (s.id, s.name),
    )
    .await?;

    let mut roster: HashMap<i64, Vec<StudentRef>> = HashMap::new();
    for link in &links {
        roster.entry(link.class_id).or_default().push(StudentRef {
            id: link.student_id,
            name: students.get(&link.student_id).cloned().unwrap_or_default(),
        });
    }

    let mut views: Vec<ClassView> = classes
        .into_iter()
        .map(|c| {
            let mut class_students = roster.remove(&c.id).unwrap_or_default();
            class_students.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            ClassView {
                class_id: c.id,
                teacher_id: c.teacher_id,
                teacher_name: teachers.get(&c.teacher_id).cloned().unwrap_or_default(),
                instrument_id: c.instrument_id,
                instrument_name: instruments.get(&c.instrument_id).cloned().unwrap_or_default(),
                weekday: c.weekday,
                start_time: c.start_time,
                end_time: ClassSlot::from(&c).end_time(),
                duration: c.duration,
                frequency: c.frequency,
                status: c.status,
                class_type: ClassType::for_student_count(class_students.len()),
                students: class_students,
            }
        })
        .collect();
    views.sort_by_key(|v| (v.weekday, v.start_time, v.class_id));
    Ok(views)
}

/// Classes matching every set filter field, by weekday then start time.
pub async fn list_classes(db: &DatabaseConnection, filter: &ClassFilter) -> Result<Vec<ClassView>> {
    let mut query = Class::find();
    if let Some(weekday) = filter.weekday {
        query = query.filter(class::Column::Weekday.eq(weekday));
    }
    if let Some(teacher_id) = filter.teacher_id {
        query = query.filter(class::Column::TeacherId.eq(teacher_id));
    }
    if let Some(instrument_id) = filter.instrument_id {
        query = query.filter(class::Column::InstrumentId.eq(instrument_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(class::Column::Status.eq(status));
    }
    if let Some(student_id) = filter.student_id {
        let class_ids: Vec<i64> = ClassStudent::find()
            .filter(class_student::Column::StudentId.eq(student_id))
            .all(db)
            .await?
            .into_iter()
            .map(|l| l.class_id)
            .collect();
        query = query.filter(class::Column::Id.is_in(class_ids));
    }

    let classes = query.order_by_asc(class::Column::Id).all(db).await?;
    class_views(db, classes).await
}

/// [`list_classes`] grouped by weekday, Monday first.
pub async fn classes_by_weekday(
    db: &DatabaseConnection,
    filter: &ClassFilter,
) -> Result<BTreeMap<Weekday, Vec<ClassView>>> {
    let mut grouped: BTreeMap<Weekday, Vec<ClassView>> = BTreeMap::new();
    for view in list_classes(db, filter).await? {
        grouped.entry(view.weekday).or_default().push(view);
    }
    Ok(grouped)
}

fn scheduled_on(weekday: Weekday) -> ClassFilter {
    ClassFilter {
        weekday: Some(weekday),
        status: Some(ClassStatus::Scheduled),
        ..Default::default()
    }
}

/// Scheduled classes meeting on `today`, by start time.
pub async fn todays_classes(db: &DatabaseConnection, today: Date) -> Result<Vec<ClassOccurrence>> {
    let views = list_classes(db, &scheduled_on(Weekday::of(today))).await?;
    Ok(views
        .into_iter()
        .map(|class| ClassOccurrence { date: today, class })
        .collect())
}

/// Scheduled classes meeting in the `days` days after `from`, by date then start time.
///
/// `from` itself is excluded; use [`todays_classes`] for it. The window stops at the
/// last representable date.
pub async fn upcoming_classes(
    db: &DatabaseConnection,
    from: Date,
    days: i64,
) -> Result<Vec<ClassOccurrence>> {
    let scheduled = list_classes(
        db,
        &ClassFilter {
            status: Some(ClassStatus::Scheduled),
            ..Default::default()
        },
    )
    .await?;

    let mut occurrences = Vec::new();
    for offset in 1..=u64::try_from(days).unwrap_or(0) {
        let Some(date) = from.checked_add_days(Days::new(offset)) else {
            break;
        };
        let weekday = Weekday::of(date);
        occurrences.extend(
            scheduled
                .iter()
                .filter(|v| v.weekday == weekday)
                .cloned()
                .map(|class| ClassOccurrence { date, class }),
        );
    }
    Ok(occurrences)
}

/// Active products split by stock level.
#[derive(Debug, Clone, Default)]
pub struct StockPartitions {
    /// No units on hand
    pub out_of_stock: Vec<product::Model>,
    /// Some units, but at or below the reorder level
    pub low_stock: Vec<product::Model>,
    /// Above the reorder level
    pub healthy: Vec<product::Model>,
}

/// Splits active, non-deleted products by stock level.
pub async fn stock_partitions(db: &DatabaseConnection) -> Result<StockPartitions> {
    let products = Product::find()
        .filter(product::Column::Active.eq(true))
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?;

    let mut partitions = StockPartitions::default();
    for item in products {
        if item.stock_quantity <= 0 {
            partitions.out_of_stock.push(item);
        } else if item.stock_quantity <= item.reorder_level {
            partitions.low_stock.push(item);
        } else {
            partitions.healthy.push(item);
        }
    }
    Ok(partitions)
}

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Worth a look
    Low,
    /// Needs attention soon
    Warning,
    /// Needs attention now
    Critical,
}

impl AlertSeverity {
    /// Severity of a credit balance: none left is critical, one left is a warning.
    #[must_use]
    pub const fn for_balance(current_balance: i32) -> Self {
        if current_balance <= 0 {
            Self::Critical
        } else if current_balance == 1 {
            Self::Warning
        } else {
            Self::Low
        }
    }
}

/// An active enrollment running out of credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAlert {
    /// Enrollment running low
    pub enrollment_id: i64,
    /// Student id
    pub student_id: i64,
    /// Student name
    pub student_name: String,
    /// Teacher name
    pub teacher_name: String,
    /// Instrument name
    pub instrument_name: String,
    /// Credits left
    pub current_balance: i32,
    /// Urgency
    pub severity: AlertSeverity,
}

/// Active enrollments whose balance is at or below `threshold`, most urgent first.
pub async fn low_balance_alerts(db: &DatabaseConnection, threshold: i32) -> Result<Vec<CreditAlert>> {
    let balances = StudentBalance::find()
        .filter(student_balance::Column::CurrentBalance.lte(threshold))
        .order_by_asc(student_balance::Column::CurrentBalance)
        .order_by_asc(student_balance::Column::EnrollmentId)
        .all(db)
        .await?;

    let enrollments: HashMap<i64, enrollment::Model> = Enrollment::find()
        .filter(enrollment::Column::Id.is_in(balances.iter().map(|b| b.enrollment_id)))
        .filter(enrollment::Column::EndDate.is_null())
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

    let students = names_by_id::<Student, _>(
        db,
        student::Column::Id,
        enrollments.values().map(|e| e.student_id).collect(),
        |s: student::Model| (s.id, s.name),
    )
    .await?;
    let teachers = names_by_id::<Teacher, _>(
        db,
        teacher::Column::Id,
        enrollments.values().map(|e| e.teacher_id).collect(),
        |t: teacher::Model| (t.id, t.name),
    )
    .await?;
    let instruments = names_by_id::<Instrument, _>(
        db,
        instrument::Column::Id,
        enrollments.values().map(|e| e.instrument_id).collect(),
        |i: instrument::Model| (i.id, i.name),
    )
    .await?;

    Ok(balances
        .into_iter()
        .filter_map(|b| {
            let e = enrollments.get(&b.enrollment_id)?;
            Some(CreditAlert {
                enrollment_id: e.id,
                student_id: e.student_id,
                student_name: students.get(&e.student_id).cloned().unwrap_or_default(),
                teacher_name: teachers.get(&e.teacher_id).cloned().unwrap_or_default(),
                instrument_name: instruments.get(&e.instrument_id).cloned().unwrap_or_default(),
                current_balance: b.current_balance,
                severity: AlertSeverity::for_balance(b.current_balance),
            })
        })
        .collect())
}

/// Rentals split by derived status.
#[derive(Debug, Clone, Default)]
pub struct RentalPartitions {
    /// Out and not yet due
    pub active: Vec<rental::Model>,
    /// Out past the due date
    pub overdue: Vec<rental::Model>,
    /// Back in stock
    pub returned: Vec<rental::Model>,
}

/// Splits every rental by its status on `today`.
pub async fn rental_partitions(db: &DatabaseConnection, today: Date) -> Result<RentalPartitions> {
    let rentals = Rental::find()
        .order_by_asc(rental::Column::DueDate)
        .order_by_asc(rental::Column::Id)
        .all(db)
        .await?;

    let mut partitions = RentalPartitions::default();
    for r in rentals {
        match rental_status(&r, today) {
            RentalStatus::Active => partitions.active.push(r),
            RentalStatus::Overdue => partitions.overdue.push(r),
            RentalStatus::Returned => partitions.returned.push(r),
        }
    }
    Ok(partitions)
}

/// Something in the store needing attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventoryAlert {
    /// Stock at or below the reorder level
    LowStock {
        /// Product id
        product_id: i64,
        /// Product name
        product_name: String,
        /// Units on hand
        current_stock: i32,
        /// Configured reorder level
        reorder_level: i32,
        /// Urgency
        severity: AlertSeverity,
    },
    /// Rental out past its due date
    OverdueRental {
        /// Rental id
        rental_id: i64,
        /// Product id
        product_id: i64,
        /// Product name
        product_name: String,
        /// Customer holding the rental
        customer_name: String,
        /// Day it was due back
        due_date: Date,
        /// Whole days past the due date
        days_overdue: i64,
        /// Urgency
        severity: AlertSeverity,
    },
}

impl InventoryAlert {
    /// How urgent the alert is.
    #[must_use]
    pub const fn severity(&self) -> AlertSeverity {
        match self {
            Self::LowStock { severity, .. } | Self::OverdueRental { severity, .. } => *severity,
        }
    }
}

/// Low-stock products and overdue rentals on `today`, most urgent first.
///
/// Out-of-stock products and rentals more than `critical_overdue_days` late are
/// critical; the rest are warnings.
pub async fn inventory_alerts(
    db: &DatabaseConnection,
    today: Date,
    settings: &AlertSettings,
) -> Result<Vec<InventoryAlert>> {
    let stock = stock_partitions(db).await?;
    let mut alerts: Vec<InventoryAlert> = stock
        .out_of_stock
        .iter()
        .map(|p| (p, AlertSeverity::Critical))
        .chain(stock.low_stock.iter().map(|p| (p, AlertSeverity::Warning)))
        .map(|(p, severity)| InventoryAlert::LowStock {
            product_id: p.id,
            product_name: p.name.clone(),
            current_stock: p.stock_quantity,
            reorder_level: p.reorder_level,
            severity,
        })
        .collect();

    let overdue = rental_partitions(db, today).await?.overdue;
    let product_names = names_by_id::<Product, _>(
        db,
        product::Column::Id,
        overdue.iter().map(|r| r.product_id).collect(),
        |p: product::Model| (p.id, p.name),
    )
    .await?;
    let customer_names = names_by_id::<Customer, _>(
        db,
        customer::Column::Id,
        overdue.iter().map(|r| r.customer_id).collect(),
        |c: customer::Model| (c.id, c.name),
    )
    .await?;

    alerts.extend(overdue.into_iter().map(|r| {
        let late = days_overdue(r.due_date, today);
        InventoryAlert::OverdueRental {
            rental_id: r.id,
            product_id: r.product_id,
            product_name: product_names.get(&r.product_id).cloned().unwrap_or_default(),
            customer_name: customer_names.get(&r.customer_id).cloned().unwrap_or_default(),
            due_date: r.due_date,
            days_overdue: late,
            severity: if late > settings.critical_overdue_days {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            },
        }
    }));

    // Stable, so equal severities keep their grouping
    alerts.sort_by_key(|a| std::cmp::Reverse(a.severity()));
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::settings::{LedgerPolicy, RentalPolicy, TaxRates};
    use crate::core::{inventory, ledger, rental, schedule};
    use crate::test_utils::*;

    #[test]
    fn test_balance_severity() {
        assert_eq!(AlertSeverity::for_balance(-1), AlertSeverity::Critical);
        assert_eq!(AlertSeverity::for_balance(0), AlertSeverity::Critical);
        assert_eq!(AlertSeverity::for_balance(1), AlertSeverity::Warning);
        assert_eq!(AlertSeverity::for_balance(2), AlertSeverity::Low);
        assert!(AlertSeverity::Critical > AlertSeverity::Warning);
    }

    #[tokio::test]
    async fn test_class_filters_compose() -> Result<()> {
        let fx = setup_academy().await?;
        let liam = create_test_student(&fx.db, "Liam").await?;
        let bob = create_test_teacher(&fx.db, "Bob", &[fx.piano.id]).await?;

        let group = create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![liam.id, fx.student.id],
            Weekday::Monday,
            time(16, 0),
        )
        .await?;
        create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![liam.id],
            Weekday::Wednesday,
            time(16, 0),
        )
        .await?;
        create_test_class(
            &fx.db,
            bob.id,
            fx.piano.id,
            vec![fx.student.id],
            Weekday::Monday,
            time(9, 0),
        )
        .await?;

        let monday = list_classes(
            &fx.db,
            &ClassFilter {
                weekday: Some(Weekday::Monday),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].teacher_name, "Bob");

        let emma_with_alice = list_classes(
            &fx.db,
            &ClassFilter {
                teacher_id: Some(fx.teacher.id),
                student_id: Some(fx.student.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(emma_with_alice.len(), 1);
        let view = &emma_with_alice[0];
        assert_eq!(view.class_id, group.class.id);
        assert_eq!(view.class_type, ClassType::Group);
        assert_eq!(view.instrument_name, "Piano");
        let names: Vec<&str> = view.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Emma", "Liam"]);

        let by_day = classes_by_weekday(&fx.db, &ClassFilter::default()).await?;
        let days: Vec<Weekday> = by_day.keys().copied().collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Wednesday]);
        Ok(())
    }

    #[tokio::test]
    async fn test_today_and_upcoming_occurrences() -> Result<()> {
        let fx = setup_academy().await?;
        let monday_class = create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![fx.student.id],
            Weekday::Monday,
            time(16, 0),
        )
        .await?;
        let friday_class = create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![fx.student.id],
            Weekday::Friday,
            time(16, 0),
        )
        .await?;
        let cancelled = create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![fx.student.id],
            Weekday::Tuesday,
            time(16, 0),
        )
        .await?;
        schedule::cancel_class(&fx.db, cancelled.class.id).await?;

        let today = todays_classes(&fx.db, date(2024, 1, 8)).await?;
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].class.class_id, monday_class.class.id);

        let upcoming = upcoming_classes(&fx.db, date(2024, 1, 8), 7).await?;
        let dates: Vec<(Date, i64)> = upcoming.iter().map(|o| (o.date, o.class.class_id)).collect();
        assert_eq!(
            dates,
            vec![
                (date(2024, 1, 12), friday_class.class.id),
                (date(2024, 1, 15), monday_class.class.id),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_upcoming_window_stops_at_last_date() -> Result<()> {
        let fx = setup_academy().await?;
        create_test_class(
            &fx.db,
            fx.teacher.id,
            fx.piano.id,
            vec![fx.student.id],
            Weekday::Monday,
            time(16, 0),
        )
        .await?;

        let near_end = Date::MAX.checked_sub_days(Days::new(3)).unwrap();
        let upcoming = upcoming_classes(&fx.db, near_end, 366).await?;
        assert!(upcoming.len() <= 1);
        assert!(upcoming.iter().all(|o| o.date > near_end));

        assert!(upcoming_classes(&fx.db, date(2024, 1, 8), -5).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_low_balance_alerts() -> Result<()> {
        let fx = setup_academy().await?;
        let taxes = TaxRates::default();

        let alerts = low_balance_alerts(&fx.db, 2).await?;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].teacher_name, "Alice");

        ledger::add_credit_purchase(
            &fx.db,
            fx.student.id,
            fx.enrollment.id,
            2,
            &pricing(5.0),
            &taxes,
        )
        .await?;
        let alerts = low_balance_alerts(&fx.db, 2).await?;
        assert_eq!(alerts[0].current_balance, 2);
        assert_eq!(alerts[0].severity, AlertSeverity::Low);

        ledger::add_credit_adjustment(
            &fx.db,
            adjustment(&fx, 1, "Bonus lesson"),
            LedgerPolicy::default(),
        )
        .await?;
        assert!(low_balance_alerts(&fx.db, 2).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_stock_and_rental_partitions() -> Result<()> {
        let db = setup_test_db().await?;
        let policy = RentalPolicy::default();
        let violin = create_test_product(&db, "Violin", 1).await?;
        let strings = create_test_product(&db, "Strings", 2).await?;
        create_test_product(&db, "Bow", 10).await?;
        let maya = create_test_customer(&db, "Maya").await?;

        let rented = rental::create_rental(
            &db,
            rental::NewRental {
                product_id: violin.id,
                customer_id: maya.id,
                rental_period: crate::entities::sea_orm_active_enums::RentalPeriod::Weekly,
                start_date: date(2024, 1, 3),
                deposit: 0.0,
                condition_notes: None,
            },
            &policy,
        )
        .await?;
        inventory::restock_product(&db, strings.id, -1).await?;

        let stock = stock_partitions(&db).await?;
        assert_eq!(stock.out_of_stock.len(), 1);
        assert_eq!(stock.out_of_stock[0].id, violin.id);
        assert_eq!(stock.low_stock.len(), 1);
        assert_eq!(stock.healthy.len(), 1);

        let on_time = rental_partitions(&db, date(2024, 1, 10)).await?;
        assert_eq!(on_time.active.len(), 1);
        let late = rental_partitions(&db, date(2024, 1, 20)).await?;
        assert_eq!(late.overdue.len(), 1);

        let alerts = inventory_alerts(&db, date(2024, 1, 20), &AlertSettings::default()).await?;
        assert_eq!(alerts.len(), 3);
        assert!(alerts[..2].iter().all(|a| a.severity() == AlertSeverity::Critical));
        assert!(alerts.iter().any(|a| matches!(
            a,
            InventoryAlert::OverdueRental { rental_id, days_overdue: 10, .. } if *rental_id == rented.id
        )));

        rental::return_rental(&db, rented.id, date(2024, 1, 20), &policy).await?;
        let after = rental_partitions(&db, date(2024, 1, 20)).await?;
        assert_eq!(after.returned.len(), 1);
        assert!(after.overdue.is_empty());
        Ok(())
    }
}
