//! Credit ledger - append-only transactions and per-enrollment balances.
//!
//! Every entry is written in the same database transaction as the balance update
//! it causes, and balances are changed with atomic `col = col + delta` updates.
//! Entries are never edited or deleted: a correction is a new `credit_adjustment`.
//! For every enrollment, `current_balance == total_purchased - total_used` and equals
//! the sum of its entries' credits; [`audit_balances`] checks both.

use crate::{
    config::settings::{LedgerPolicy, TaxRates},
    core::{
        enrollment::require_enrollment,
        money::{self, PaymentTotals},
        optional_text, require_text,
        roster::require_student,
    },
    entities::{
        StudentBalance, Transaction, TransactionLineItem, enrollment,
        sea_orm_active_enums::{PaymentMethod, TaxType, TransactionType},
        student_balance, transaction, transaction_line_item,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

/// Price and payment details of a credit purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPricing {
    /// Business date of the purchase
    pub date: Date,
    /// Price per credit in dollars
    pub price_per_credit: f64,
    /// Discount in dollars, at most the subtotal
    pub discount_amount: f64,
    /// Reason for the discount
    pub discount_note: Option<String>,
    /// Tax regime; the rate comes from configuration
    pub tax_type: TaxType,
    /// How the student paid
    pub payment_method: PaymentMethod,
}

/// Input for [`add_credit_adjustment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdjustment {
    /// Student owning the enrollment
    pub student_id: i64,
    /// Enrollment to correct
    pub enrollment_id: i64,
    /// Signed credit change, never zero
    pub credits: i32,
    /// Business date
    pub date: Date,
    /// Why the correction was made
    pub note: String,
}

/// One item of an inventory payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    /// What was bought
    pub description: String,
    /// Units, at least one
    pub quantity: i32,
    /// Price per unit in dollars
    pub unit_price: f64,
}

/// Input for [`record_inventory_payment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryPayment {
    /// Paying student
    pub student_id: i64,
    /// Business date
    pub date: Date,
    /// Items bought; at least one
    pub line_items: Vec<LineItemInput>,
    /// Discount in dollars
    pub discount_amount: f64,
    /// Reason for the discount
    pub discount_note: Option<String>,
    /// Tax regime
    pub tax_type: TaxType,
    /// How the student paid
    pub payment_method: PaymentMethod,
    /// Free-form note
    pub note: Option<String>,
}

/// A ledger entry with zeroed money fields, ready to be filled in.
fn blank_entry(
    transaction_type: TransactionType,
    student_id: i64,
    date: Date,
) -> transaction::ActiveModel {
    transaction::ActiveModel {
        transaction_type: Set(transaction_type),
        student_id: Set(student_id),
        enrollment_id: Set(None),
        class_id: Set(None),
        occurrence_date: Set(None),
        reverses_transaction_id: Set(None),
        date: Set(date),
        credits: Set(0),
        price_per_credit: Set(0.0),
        subtotal: Set(0.0),
        discount_amount: Set(0.0),
        discount_note: Set(None),
        tax_type: Set(TaxType::Exempt),
        tax_rate: Set(0.0),
        tax_amount: Set(0.0),
        total_amount: Set(0.0),
        payment_method: Set(None),
        note: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
}

fn set_totals(entry: &mut transaction::ActiveModel, totals: PaymentTotals) {
    entry.subtotal = Set(totals.subtotal);
    entry.discount_amount = Set(totals.discount_amount);
    entry.tax_amount = Set(totals.tax_amount);
    entry.total_amount = Set(totals.total_amount);
}

/// Loads an enrollment and checks it belongs to the student.
async fn require_student_enrollment<C>(
    db: &C,
    student_id: i64,
    enrollment_id: i64,
) -> Result<enrollment::Model>
where
    C: ConnectionTrait,
{
    let enrollment = require_enrollment(db, enrollment_id).await?;
    if enrollment.student_id != student_id {
        return Err(Error::validation(format!(
            "Enrollment {enrollment_id} does not belong to student {student_id}"
        )));
    }
    Ok(enrollment)
}

/// Atomically applies credit deltas to an enrollment's balance.
///
/// `current_balance` moves by `purchased_delta - used_delta`.
pub(crate) async fn apply_balance_delta<C>(
    db: &C,
    enrollment_id: i64,
    purchased_delta: i32,
    used_delta: i32,
) -> Result<student_balance::Model>
where
    C: ConnectionTrait,
{
    let updated = StudentBalance::update_many()
        .col_expr(
            student_balance::Column::TotalPurchased,
            Expr::col(student_balance::Column::TotalPurchased).add(purchased_delta),
        )
        .col_expr(
            student_balance::Column::TotalUsed,
            Expr::col(student_balance::Column::TotalUsed).add(used_delta),
        )
        .col_expr(
            student_balance::Column::CurrentBalance,
            Expr::col(student_balance::Column::CurrentBalance).add(purchased_delta - used_delta),
        )
        .filter(student_balance::Column::EnrollmentId.eq(enrollment_id))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::not_found("balance", enrollment_id));
    }
    get_balance(db, enrollment_id).await
}

/// The unreversed deduction for one student at one class occurrence, if any.
pub(crate) async fn live_deduction<C>(
    db: &C,
    class_id: i64,
    student_id: i64,
    occurrence_date: Date,
) -> Result<Option<transaction::Model>>
where
    C: ConnectionTrait,
{
    let deductions = Transaction::find()
        .filter(transaction::Column::TransactionType.eq(TransactionType::CreditDeduction))
        .filter(transaction::Column::ClassId.eq(class_id))
        .filter(transaction::Column::StudentId.eq(student_id))
        .filter(transaction::Column::OccurrenceDate.eq(occurrence_date))
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    for deduction in deductions {
        let reversal = Transaction::find()
            .filter(transaction::Column::ReversesTransactionId.eq(deduction.id))
            .one(db)
            .await?;
        if reversal.is_none() {
            return Ok(Some(deduction));
        }
    }
    Ok(None)
}

/// Deducts one credit for attending a class occurrence.
///
/// # Errors
/// Returns [`Error::InsufficientCredits`] when the balance is zero or less and the
/// policy does not allow negative balances.
pub(crate) async fn record_deduction<C>(
    db: &C,
    enrollment: &enrollment::Model,
    class_id: i64,
    occurrence_date: Date,
    policy: LedgerPolicy,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let balance = get_balance(db, enrollment.id).await?;
    if balance.current_balance <= 0 && !policy.allow_negative_balance {
        return Err(Error::InsufficientCredits {
            enrollment_id: enrollment.id,
            current_balance: balance.current_balance,
        });
    }

    let mut entry = blank_entry(
        TransactionType::CreditDeduction,
        enrollment.student_id,
        occurrence_date,
    );
    entry.enrollment_id = Set(Some(enrollment.id));
    entry.class_id = Set(Some(class_id));
    entry.occurrence_date = Set(Some(occurrence_date));
    entry.credits = Set(-1);
    entry.note = Set(Some(format!("Attended class {class_id}")));
    let created = entry.insert(db).await?;

    let after = apply_balance_delta(db, enrollment.id, 0, 1).await?;
    tracing::info!(
        transaction_id = created.id,
        enrollment_id = enrollment.id,
        class_id,
        %occurrence_date,
        balance = after.current_balance,
        "Deducted credit for attendance"
    );
    Ok(created)
}

/// Appends a `+1` adjustment cancelling an attendance deduction.
pub(crate) async fn reverse_deduction<C>(
    db: &C,
    deduction: &transaction::Model,
    date: Date,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let enrollment_id = deduction
        .enrollment_id
        .ok_or_else(|| Error::validation(format!("Transaction {} has no enrollment", deduction.id)))?;

    let mut entry = blank_entry(TransactionType::CreditAdjustment, deduction.student_id, date);
    entry.enrollment_id = Set(Some(enrollment_id));
    entry.class_id = Set(deduction.class_id);
    entry.occurrence_date = Set(deduction.occurrence_date);
    entry.reverses_transaction_id = Set(Some(deduction.id));
    entry.credits = Set(-deduction.credits);
    entry.note = Set(Some(format!("Reverses deduction {}", deduction.id)));
    let created = entry.insert(db).await?;

    let after = apply_balance_delta(db, enrollment_id, 0, deduction.credits).await?;
    tracing::info!(
        transaction_id = created.id,
        reverses = deduction.id,
        enrollment_id,
        balance = after.current_balance,
        "Reversed attendance deduction"
    );
    Ok(created)
}

/// Records a purchase of credits for an enrollment.
///
/// Subtotal is `credits * price_per_credit`; tax applies to the discounted amount.
/// All amounts are rounded to cents when the entry is written.
///
/// # Errors
/// - [`Error::Validation`] for a non-positive credit count or an enrollment that
///   is ended or belongs to another student
/// - [`Error::InvalidAmount`] for a bad price or discount
/// - [`Error::NotFound`] for an unknown student or enrollment
pub async fn add_credit_purchase(
    db: &DatabaseConnection,
    student_id: i64,
    enrollment_id: i64,
    credits: i32,
    pricing: &CreditPricing,
    taxes: &TaxRates,
) -> Result<transaction::Model> {
    if credits <= 0 {
        return Err(Error::validation("Credits purchased must be positive"));
    }
    let tax_rate = taxes.rate_for(pricing.tax_type);
    let totals = money::credit_purchase_totals(
        credits,
        pricing.price_per_credit,
        pricing.discount_amount,
        tax_rate,
    )?;

    let txn = db.begin().await?;
    require_student(&txn, student_id).await?;
    let enrollment = require_student_enrollment(&txn, student_id, enrollment_id).await?;
    if !enrollment.is_active() {
        return Err(Error::validation(format!(
            "Enrollment {enrollment_id} has ended"
        )));
    }

    let mut entry = blank_entry(TransactionType::CreditPurchase, student_id, pricing.date);
    entry.enrollment_id = Set(Some(enrollment_id));
    entry.credits = Set(credits);
    entry.price_per_credit = Set(money::round_currency(pricing.price_per_credit)?);
    entry.discount_note = Set(optional_text(pricing.discount_note.clone()));
    entry.tax_type = Set(pricing.tax_type);
    entry.tax_rate = Set(tax_rate);
    entry.payment_method = Set(Some(pricing.payment_method));
    set_totals(&mut entry, totals);
    let created = entry.insert(&txn).await?;

    let balance = apply_balance_delta(&txn, enrollment_id, credits, 0).await?;
    txn.commit().await?;

    tracing::info!(
        transaction_id = created.id,
        enrollment_id,
        credits,
        total = created.total_amount,
        balance = balance.current_balance,
        "Recorded credit purchase"
    );
    Ok(created)
}

/// Records a manual credit correction.
///
/// Positive credits count as purchased, negative ones as used.
///
/// # Errors
/// - [`Error::Validation`] for zero credits, a blank note or an enrollment of
///   another student
/// - [`Error::InsufficientCredits`] if a removal would leave a negative balance and
///   the policy forbids it
pub async fn add_credit_adjustment(
    db: &DatabaseConnection,
    input: NewAdjustment,
    policy: LedgerPolicy,
) -> Result<transaction::Model> {
    if input.credits == 0 {
        return Err(Error::validation("An adjustment must change the balance"));
    }
    let note = require_text("Adjustment note", &input.note)?;

    let txn = db.begin().await?;
    let enrollment =
        require_student_enrollment(&txn, input.student_id, input.enrollment_id).await?;

    let balance = get_balance(&txn, enrollment.id).await?;
    if input.credits < 0
        && balance.current_balance + input.credits < 0
        && !policy.allow_negative_balance
    {
        return Err(Error::InsufficientCredits {
            enrollment_id: enrollment.id,
            current_balance: balance.current_balance,
        });
    }

    let mut entry = blank_entry(
        TransactionType::CreditAdjustment,
        input.student_id,
        input.date,
    );
    entry.enrollment_id = Set(Some(enrollment.id));
    entry.credits = Set(input.credits);
    entry.note = Set(Some(note));
    let created = entry.insert(&txn).await?;

    let (purchased, used) = if input.credits > 0 {
        (input.credits, 0)
    } else {
        (0, -input.credits)
    };
    let after = apply_balance_delta(&txn, enrollment.id, purchased, used).await?;
    txn.commit().await?;

    tracing::info!(
        transaction_id = created.id,
        enrollment_id = enrollment.id,
        credits = input.credits,
        balance = after.current_balance,
        "Recorded credit adjustment"
    );
    Ok(created)
}

/// Records a student's payment for store items. No credits change hands.
///
/// # Errors
/// - [`Error::Validation`] for an empty item list, a blank description or a
///   non-positive quantity
/// - [`Error::InvalidAmount`] for a bad price or discount
/// - [`Error::NotFound`] for an unknown student
pub async fn record_inventory_payment(
    db: &DatabaseConnection,
    input: NewInventoryPayment,
    taxes: &TaxRates,
) -> Result<transaction::Model> {
    if input.line_items.is_empty() {
        return Err(Error::validation("A payment needs at least one item"));
    }
    let mut subtotal_cents = 0_i64;
    for item in &input.line_items {
        require_text("Item description", &item.description)?;
        if item.quantity <= 0 {
            return Err(Error::validation(format!(
                "Quantity of '{}' must be positive",
                item.description.trim()
            )));
        }
        let line_cents = money::to_cents(money::line_total(item.quantity, item.unit_price)?)?;
        subtotal_cents = money::add_cents(subtotal_cents, line_cents)?;
    }
    let tax_rate = taxes.rate_for(input.tax_type);
    let totals =
        money::totals_from_subtotal_cents(subtotal_cents, input.discount_amount, tax_rate)?;

    let txn = db.begin().await?;
    require_student(&txn, input.student_id).await?;

    let mut entry = blank_entry(
        TransactionType::InventoryPayment,
        input.student_id,
        input.date,
    );
    entry.discount_note = Set(optional_text(input.discount_note));
    entry.tax_type = Set(input.tax_type);
    entry.tax_rate = Set(tax_rate);
    entry.payment_method = Set(Some(input.payment_method));
    entry.note = Set(optional_text(input.note));
    set_totals(&mut entry, totals);
    let created = entry.insert(&txn).await?;

    for item in input.line_items {
        transaction_line_item::ActiveModel {
            transaction_id: Set(created.id),
            description: Set(item.description.trim().to_string()),
            quantity: Set(item.quantity),
            unit_price: Set(money::round_currency(item.unit_price)?),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(
        transaction_id = created.id,
        student_id = created.student_id,
        total = created.total_amount,
        "Recorded inventory payment"
    );
    Ok(created)
}

/// Finds a ledger entry by id.
pub async fn get_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Items of an inventory payment.
pub async fn line_items_for(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Vec<transaction_line_item::Model>> {
    TransactionLineItem::find()
        .filter(transaction_line_item::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_line_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Filter for [`list_transactions`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only this student's entries
    pub student_id: Option<i64>,
    /// Only this enrollment's entries
    pub enrollment_id: Option<i64>,
    /// Only this kind of entry
    pub transaction_type: Option<TransactionType>,
    /// On or after this date
    pub from: Option<Date>,
    /// On or before this date
    pub to: Option<Date>,
}

/// Ledger entries matching every set filter field, newest first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find();
    if let Some(student_id) = filter.student_id {
        query = query.filter(transaction::Column::StudentId.eq(student_id));
    }
    if let Some(enrollment_id) = filter.enrollment_id {
        query = query.filter(transaction::Column::EnrollmentId.eq(enrollment_id));
    }
    if let Some(kind) = filter.transaction_type {
        query = query.filter(transaction::Column::TransactionType.eq(kind));
    }
    if let Some(from) = filter.from {
        query = query.filter(transaction::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(transaction::Column::Date.lte(to));
    }
    query
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Balance of one enrollment.
///
/// # Errors
/// Returns [`Error::NotFound`] if the enrollment has no balance row.
pub async fn get_balance<C>(db: &C, enrollment_id: i64) -> Result<student_balance::Model>
where
    C: ConnectionTrait,
{
    StudentBalance::find()
        .filter(student_balance::Column::EnrollmentId.eq(enrollment_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("balance", enrollment_id))
}

/// Balances of every enrollment of a student.
pub async fn balances_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<student_balance::Model>> {
    StudentBalance::find()
        .filter(student_balance::Column::StudentId.eq(student_id))
        .order_by_asc(student_balance::Column::EnrollmentId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of the credits of every entry of an enrollment.
pub async fn ledger_sum<C>(db: &C, enrollment_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let entries = Transaction::find()
        .filter(transaction::Column::EnrollmentId.eq(enrollment_id))
        .all(db)
        .await?;
    Ok(entries.iter().map(|t| i64::from(t.credits)).sum())
}

/// An enrollment whose stored balance disagrees with its ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDiscrepancy {
    /// Enrollment concerned
    pub enrollment_id: i64,
    /// Stored balance row
    pub stored: student_balance::Model,
    /// Sum of ledger credits
    pub ledger_sum: i64,
}

/// Checks every balance against its ledger and its own totals.
pub async fn audit_balances(db: &DatabaseConnection) -> Result<Vec<BalanceDiscrepancy>> {
    let balances = StudentBalance::find()
        .order_by_asc(student_balance::Column::EnrollmentId)
        .all(db)
        .await?;

    let mut discrepancies = Vec::new();
    for stored in balances {
        let sum = ledger_sum(db, stored.enrollment_id).await?;
        let consistent = stored.current_balance == stored.total_purchased - stored.total_used
            && i64::from(stored.current_balance) == sum;
        if !consistent {
            tracing::warn!(
                enrollment_id = stored.enrollment_id,
                stored = stored.current_balance,
                ledger = sum,
                "Balance disagrees with ledger"
            );
            discrepancies.push(BalanceDiscrepancy {
                enrollment_id: stored.enrollment_id,
                stored,
                ledger_sum: sum,
            });
        }
    }
    Ok(discrepancies)
}
