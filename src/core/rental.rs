//! Rental lifecycle - checkout, return and late fees.
//!
//! A rental takes one unit out of stock when it starts and puts it back when it is
//! returned, each in the same database transaction as the rental row. Status is
//! never stored; [`rental_status`] derives it from the dates.

use crate::{
    config::settings::RentalPolicy,
    core::{
        inventory::{put_back_stock, require_active_product, require_customer, take_stock},
        money, optional_text,
    },
    entities::{Rental, rental, sea_orm_active_enums::RentalPeriod},
    errors::{Error, Result},
};
use chrono::Days;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

/// Where a rental stands on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    /// Out and not yet due
    Active,
    /// Out past its due date
    Overdue,
    /// Back in stock
    Returned,
}

/// Status of a rental on `today`. A rental is due back by the end of its due date.
#[must_use]
pub fn rental_status(rental: &rental::Model, today: Date) -> RentalStatus {
    if rental.return_date.is_some() {
        RentalStatus::Returned
    } else if today > rental.due_date {
        RentalStatus::Overdue
    } else {
        RentalStatus::Active
    }
}

/// Whole days between the due date and `day`, zero if not late.
#[must_use]
pub fn days_overdue(due_date: Date, day: Date) -> i64 {
    (day - due_date).num_days().max(0)
}

fn late_fee_for(days: i64, policy: &RentalPolicy) -> Result<f64> {
    let per_day = money::to_cents(policy.late_fee_per_day)?;
    money::multiply_cents(days, per_day).map(money::from_cents)
}

/// Late fee owed so far: the charged fee once returned, otherwise what returning
/// on `today` would cost.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if the configured daily fee is not finite.
pub fn accrued_late_fee(rental: &rental::Model, today: Date, policy: &RentalPolicy) -> Result<f64> {
    match rental_status(rental, today) {
        RentalStatus::Returned => Ok(rental.late_fee),
        RentalStatus::Active => Ok(0.0),
        RentalStatus::Overdue => late_fee_for(days_overdue(rental.due_date, today), policy),
    }
}

/// Input for [`create_rental`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRental {
    /// Product rented
    pub product_id: i64,
    /// Customer renting it
    pub customer_id: i64,
    /// Billing period, which sets the due date
    pub rental_period: RentalPeriod,
    /// First day
    pub start_date: Date,
    /// Refundable deposit in dollars
    pub deposit: f64,
    /// Condition at checkout
    pub condition_notes: Option<String>,
}

/// Rents one unit of a product.
///
/// # Errors
/// - [`Error::OutOfStock`] if no unit is on hand; stock and rentals are unchanged
/// - [`Error::Validation`] if the product is inactive or not rentable
/// - [`Error::NotFound`] for an unknown product or customer
/// - [`Error::InvalidAmount`] for a negative deposit
pub async fn create_rental(
    db: &DatabaseConnection,
    input: NewRental,
    policy: &RentalPolicy,
) -> Result<rental::Model> {
    let deposit = money::round_currency(money::ensure_non_negative(input.deposit)?)?;
    let period_days = u64::try_from(policy.period_days(input.rental_period)).unwrap_or(0);
    let due_date = input
        .start_date
        .checked_add_days(Days::new(period_days))
        .ok_or_else(|| Error::validation(format!("No due date after {}", input.start_date)))?;

    let txn = db.begin().await?;
    let item = require_active_product(&txn, input.product_id).await?;
    let rental_fee = item.rental_price.ok_or_else(|| {
        Error::validation(format!("Product {} is not available for rent", item.id))
    })?;
    require_customer(&txn, input.customer_id).await?;

    take_stock(&txn, item.id, 1).await?;

    let created = rental::ActiveModel {
        product_id: Set(item.id),
        customer_id: Set(input.customer_id),
        rental_period: Set(input.rental_period),
        start_date: Set(input.start_date),
        due_date: Set(due_date),
        return_date: Set(None),
        deposit: Set(deposit),
        rental_fee: Set(rental_fee),
        late_fee: Set(0.0),
        condition_notes: Set(optional_text(input.condition_notes)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(
        rental_id = created.id,
        product_id = created.product_id,
        customer_id = created.customer_id,
        %due_date,
        "Created rental"
    );
    Ok(created)
}

/// Loads a rental or fails with [`Error::NotFound`].
async fn require_rental<C>(db: &C, rental_id: i64) -> Result<rental::Model>
where
    C: ConnectionTrait,
{
    Rental::find_by_id(rental_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("rental", rental_id))
}

/// Returns a rented unit, charging the late fee if it is overdue.
///
/// # Errors
/// - [`Error::NotFound`] if the rental does not exist
/// - [`Error::Validation`] if it was already returned or `return_date` is before
///   its start
pub async fn return_rental(
    db: &DatabaseConnection,
    rental_id: i64,
    return_date: Date,
    policy: &RentalPolicy,
) -> Result<rental::Model> {
    let txn = db.begin().await?;
    let existing = require_rental(&txn, rental_id).await?;
    if existing.return_date.is_some() {
        return Err(Error::validation(format!(
            "Rental {rental_id} was already returned"
        )));
    }
    if return_date < existing.start_date {
        return Err(Error::validation(format!(
            "Rental {rental_id} cannot be returned before it starts"
        )));
    }

    let late_days = days_overdue(existing.due_date, return_date);
    let late_fee = late_fee_for(late_days, policy)?;
    put_back_stock(&txn, existing.product_id, 1).await?;

    let mut model: rental::ActiveModel = existing.into();
    model.return_date = Set(Some(return_date));
    model.late_fee = Set(late_fee);
    let updated = model.update(&txn).await?;
    txn.commit().await?;

    if late_days > 0 {
        tracing::info!(rental_id, late_days, late_fee, "Returned rental late");
    } else {
        tracing::info!(rental_id, "Returned rental");
    }
    Ok(updated)
}

/// Finds a rental by id.
pub async fn get_rental(db: &DatabaseConnection, rental_id: i64) -> Result<Option<rental::Model>> {
    Rental::find_by_id(rental_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Filter for [`list_rentals`]; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RentalFilter {
    /// Only this customer's rentals
    pub customer_id: Option<i64>,
    /// Only rentals of this product
    pub product_id: Option<i64>,
    /// Only unreturned rentals
    pub open_only: bool,
}

/// Rentals matching every set filter field, by due date.
pub async fn list_rentals(
    db: &DatabaseConnection,
    filter: &RentalFilter,
) -> Result<Vec<rental::Model>> {
    let mut query = Rental::find();
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(rental::Column::CustomerId.eq(customer_id));
    }
    if let Some(product_id) = filter.product_id {
        query = query.filter(rental::Column::ProductId.eq(product_id));
    }
    if filter.open_only {
        query = query.filter(rental::Column::ReturnDate.is_null());
    }
    query
        .order_by_asc(rental::Column::DueDate)
        .order_by_asc(rental::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::inventory;
    use crate::test_utils::*;

    fn weekly(product_id: i64, customer_id: i64, start: Date) -> NewRental {
        NewRental {
            product_id,
            customer_id,
            rental_period: RentalPeriod::Weekly,
            start_date: start,
            deposit: 50.0,
            condition_notes: Some("Good".to_string()),
        }
    }

    #[test]
    fn test_status_is_derived_from_dates() {
        let mut out = rental::Model {
            id: 1,
            product_id: 1,
            customer_id: 1,
            rental_period: RentalPeriod::Weekly,
            start_date: date(2024, 1, 3),
            due_date: date(2024, 1, 10),
            return_date: None,
            deposit: 0.0,
            rental_fee: 25.0,
            late_fee: 0.0,
            condition_notes: None,
        };
        let policy = RentalPolicy::default();

        assert_eq!(rental_status(&out, date(2024, 1, 10)), RentalStatus::Active);
        assert_eq!(rental_status(&out, date(2024, 1, 11)), RentalStatus::Overdue);
        assert_eq!(accrued_late_fee(&out, date(2024, 1, 10), &policy).unwrap(), 0.0);
        assert_eq!(accrued_late_fee(&out, date(2024, 1, 13), &policy).unwrap(), 6.0);

        out.return_date = Some(date(2024, 1, 12));
        out.late_fee = 4.0;
        assert_eq!(rental_status(&out, date(2024, 2, 1)), RentalStatus::Returned);
        assert_eq!(accrued_late_fee(&out, date(2024, 2, 1), &policy).unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_rental_takes_last_unit_then_runs_out() -> Result<()> {
        let db = setup_test_db().await?;
        let violin = create_test_product(&db, "Violin", 1).await?;
        let maya = create_test_customer(&db, "Maya").await?;
        let policy = RentalPolicy::default();

        let first = create_rental(&db, weekly(violin.id, maya.id, date(2024, 1, 3)), &policy).await?;
        assert_eq!(first.due_date, date(2024, 1, 10));
        assert_eq!(first.rental_fee, 25.0);
        assert_eq!(
            inventory::get_product(&db, violin.id).await?.unwrap().stock_quantity,
            0
        );

        let result = create_rental(&db, weekly(violin.id, maya.id, date(2024, 1, 3)), &policy).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::OutOfStock {
                available: 0,
                requested: 1,
                ..
            }
        ));
        assert_eq!(
            list_rentals(&db, &RentalFilter::default()).await?.len(),
            1
        );
        assert_eq!(
            inventory::get_product(&db, violin.id).await?.unwrap().stock_quantity,
            0
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_late_return_charges_per_day_and_restocks() -> Result<()> {
        let db = setup_test_db().await?;
        let violin = create_test_product(&db, "Violin", 1).await?;
        let maya = create_test_customer(&db, "Maya").await?;
        let policy = RentalPolicy::default();

        let rented = create_rental(&db, weekly(violin.id, maya.id, date(2024, 1, 3)), &policy).await?;
        let returned = return_rental(&db, rented.id, date(2024, 1, 15), &policy).await?;

        assert_eq!(returned.return_date, Some(date(2024, 1, 15)));
        assert_eq!(returned.late_fee, 10.0);
        assert_eq!(
            rental_status(&returned, date(2024, 1, 15)),
            RentalStatus::Returned
        );
        assert_eq!(
            inventory::get_product(&db, violin.id).await?.unwrap().stock_quantity,
            1
        );

        let result = return_rental(&db, rented.id, date(2024, 1, 16), &policy).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_on_time_return_and_monthly_period() -> Result<()> {
        let db = setup_test_db().await?;
        let cello = create_test_product(&db, "Cello", 2).await?;
        let maya = create_test_customer(&db, "Maya").await?;
        let policy = RentalPolicy::default();

        let mut input = weekly(cello.id, maya.id, date(2024, 2, 1));
        input.rental_period = RentalPeriod::Monthly;
        let rented = create_rental(&db, input, &policy).await?;
        assert_eq!(rented.due_date, date(2024, 3, 2));

        let result = return_rental(&db, rented.id, date(2024, 1, 31), &policy).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let returned = return_rental(&db, rented.id, date(2024, 3, 2), &policy).await?;
        assert_eq!(returned.late_fee, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_product_in_use_blocks_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let violin = create_test_product(&db, "Violin", 1).await?;
        let maya = create_test_customer(&db, "Maya").await?;
        let policy = RentalPolicy::default();

        let rented = create_rental(&db, weekly(violin.id, maya.id, date(2024, 1, 3)), &policy).await?;

        let result = inventory::delete_product(&db, violin.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ProductInUse {
                open_rentals: 1,
                ..
            }
        ));
        let result = inventory::deactivate_product(&db, violin.id).await;
        assert!(matches!(result.unwrap_err(), Error::ProductInUse { .. }));

        return_rental(&db, rented.id, date(2024, 1, 9), &policy).await?;
        inventory::delete_product(&db, violin.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unrentable_product_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let book = create_test_product(&db, "Theory Book", 5).await?;
        inventory::update_product_pricing(
            &db,
            book.id,
            inventory::ProductPricing {
                cost: book.cost,
                selling_price: book.selling_price,
                rental_price: None,
            },
        )
        .await?;
        let maya = create_test_customer(&db, "Maya").await?;

        let result = create_rental(
            &db,
            weekly(book.id, maya.id, date(2024, 1, 3)),
            &RentalPolicy::default(),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert_eq!(
            inventory::get_product(&db, book.id).await?.unwrap().stock_quantity,
            5
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_due_date_past_calendar_end_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let violin = create_test_product(&db, "Violin", 1).await?;
        let maya = create_test_customer(&db, "Maya").await?;

        let result = create_rental(
            &db,
            weekly(violin.id, maya.id, Date::MAX),
            &RentalPolicy::default(),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert_eq!(
            inventory::get_product(&db, violin.id).await?.unwrap().stock_quantity,
            1
        );
        Ok(())
    }
}
