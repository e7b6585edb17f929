//! Inventory business logic - products, suppliers, customers and sales.
//!
//! Stock only moves through [`take_stock`] and [`put_back_stock`], which update the
//! count atomically inside the caller's database transaction and refuse to go
//! below zero. Products are soft deleted so rentals and sales keep resolving.

use crate::{
    core::{money, optional_text, require_text},
    entities::{
        Customer, Product, Rental, Sale, Supplier, customer, product, rental,
        sea_orm_active_enums::{PaymentMethod, ProductType},
        sale, supplier,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};

fn ensure_price(amount: f64) -> Result<f64> {
    money::round_currency(money::ensure_non_negative(amount)?)
}

/// Input for [`create_product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Catalog category
    pub product_type: ProductType,
    /// Display name
    pub name: String,
    /// Model or edition
    pub model: Option<String>,
    /// Serial number, for instruments
    pub serial_number: Option<String>,
    /// Supplier it is bought from
    pub supplier_id: Option<i64>,
    /// Purchase cost in dollars
    pub cost: f64,
    /// Selling price in dollars
    pub selling_price: f64,
    /// Rental fee per period; `None` if not rentable
    pub rental_price: Option<f64>,
    /// Units on hand
    pub stock_quantity: i32,
    /// Stock at or below which the product is low
    pub reorder_level: i32,
}

/// New prices for [`update_product_pricing`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Purchase cost in dollars
    pub cost: f64,
    /// Selling price in dollars
    pub selling_price: f64,
    /// Rental fee per period; `None` if not rentable
    pub rental_price: Option<f64>,
}

impl ProductPricing {
    fn validated(self) -> Result<Self> {
        Ok(Self {
            cost: ensure_price(self.cost)?,
            selling_price: ensure_price(self.selling_price)?,
            rental_price: self.rental_price.map(ensure_price).transpose()?,
        })
    }
}

async fn require_supplier<C>(db: &C, supplier_id: i64) -> Result<supplier::Model>
where
    C: ConnectionTrait,
{
    Supplier::find_by_id(supplier_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("supplier", supplier_id))
}

/// Creates a product.
///
/// # Errors
/// - [`Error::Validation`] for a blank name or negative stock or reorder level
/// - [`Error::InvalidAmount`] for a negative or non-finite price
/// - [`Error::NotFound`] for an unknown supplier
pub async fn create_product(db: &DatabaseConnection, input: NewProduct) -> Result<product::Model> {
    let name = require_text("Product name", &input.name)?;
    if input.stock_quantity < 0 || input.reorder_level < 0 {
        return Err(Error::validation(
            "Stock quantity and reorder level cannot be negative",
        ));
    }
    let pricing = ProductPricing {
        cost: input.cost,
        selling_price: input.selling_price,
        rental_price: input.rental_price,
    }
    .validated()?;

    if let Some(supplier_id) = input.supplier_id {
        require_supplier(db, supplier_id).await?;
    }

    let now = chrono::Utc::now().naive_utc();
    let created = product::ActiveModel {
        product_type: Set(input.product_type),
        name: Set(name),
        model: Set(optional_text(input.model)),
        serial_number: Set(optional_text(input.serial_number)),
        supplier_id: Set(input.supplier_id),
        cost: Set(pricing.cost),
        selling_price: Set(pricing.selling_price),
        rental_price: Set(pricing.rental_price),
        stock_quantity: Set(input.stock_quantity),
        reorder_level: Set(input.reorder_level),
        active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        product_id = created.id,
        stock = created.stock_quantity,
        "Created product {}",
        created.name
    );
    Ok(created)
}

/// Finds a product by id, including soft-deleted ones.
pub async fn get_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a product that has not been deleted.
async fn require_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Loads a product that can be sold or rented.
pub(crate) async fn require_active_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let found = require_product(db, product_id).await?;
    if !found.active {
        return Err(Error::validation(format!(
            "Product {product_id} is inactive"
        )));
    }
    Ok(found)
}

/// Filter for [`list_products`]; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Only this category
    pub product_type: Option<ProductType>,
    /// Only products from this supplier
    pub supplier_id: Option<i64>,
    /// Only active (or only inactive) products
    pub active: Option<bool>,
}

/// Non-deleted products matching every set filter field, alphabetically.
pub async fn list_products(
    db: &DatabaseConnection,
    filter: &ProductFilter,
) -> Result<Vec<product::Model>> {
    let mut query = Product::find().filter(product::Column::IsDeleted.eq(false));
    if let Some(kind) = filter.product_type {
        query = query.filter(product::Column::ProductType.eq(kind));
    }
    if let Some(supplier_id) = filter.supplier_id {
        query = query.filter(product::Column::SupplierId.eq(supplier_id));
    }
    if let Some(active) = filter.active {
        query = query.filter(product::Column::Active.eq(active));
    }
    query
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replaces a product's cost, selling price and rental price.
pub async fn update_product_pricing(
    db: &DatabaseConnection,
    product_id: i64,
    pricing: ProductPricing,
) -> Result<product::Model> {
    let pricing = pricing.validated()?;
    let mut model: product::ActiveModel = require_product(db, product_id).await?.into();
    model.cost = Set(pricing.cost);
    model.selling_price = Set(pricing.selling_price);
    model.rental_price = Set(pricing.rental_price);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = model.update(db).await?;
    tracing::info!(product_id, "Updated product pricing");
    Ok(updated)
}

/// Atomically removes `quantity` units from stock.
///
/// # Errors
/// Returns [`Error::OutOfStock`] if fewer than `quantity` units are on hand; the
/// count is left unchanged.
pub(crate) async fn take_stock<C>(db: &C, product_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let updated = Product::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).sub(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::StockQuantity.gte(quantity))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        let available = require_product(db, product_id).await?.stock_quantity;
        return Err(Error::OutOfStock {
            product_id,
            available,
            requested: quantity,
        });
    }
    Ok(())
}

/// Atomically adds `quantity` units back to stock.
pub(crate) async fn put_back_stock<C>(db: &C, product_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let updated = Product::update_many()
        .col_expr(
            product::Column::StockQuantity,
            Expr::col(product::Column::StockQuantity).add(quantity),
        )
        .col_expr(
            product::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(Error::not_found("product", product_id));
    }
    Ok(())
}

/// Adds (or, with a negative delta, removes) stock after a delivery or a count.
///
/// # Errors
/// Returns [`Error::OutOfStock`] if removing would take stock below zero, and
/// [`Error::Validation`] for a delta that cannot be negated.
pub async fn restock_product(
    db: &DatabaseConnection,
    product_id: i64,
    delta: i32,
) -> Result<product::Model> {
    let removed = match delta.checked_neg() {
        Some(removed) => removed,
        None => return Err(Error::validation(format!("Cannot remove {delta} units"))),
    };

    let txn = db.begin().await?;
    require_product(&txn, product_id).await?;
    if delta >= 0 {
        put_back_stock(&txn, product_id, delta).await?;
    } else {
        take_stock(&txn, product_id, removed).await?;
    }
    let updated = require_product(&txn, product_id).await?;
    txn.commit().await?;

    tracing::info!(
        product_id,
        delta,
        stock = updated.stock_quantity,
        "Adjusted product stock"
    );
    Ok(updated)
}

/// Number of rentals of a product that have not been returned.
pub async fn open_rental_count<C>(db: &C, product_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Rental::find()
        .filter(rental::Column::ProductId.eq(product_id))
        .filter(rental::Column::ReturnDate.is_null())
        .count(db)
        .await
        .map_err(Into::into)
}

async fn ensure_not_rented<C>(db: &C, product_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let open_rentals = open_rental_count(db, product_id).await?;
    if open_rentals > 0 {
        return Err(Error::ProductInUse {
            product_id,
            open_rentals,
        });
    }
    Ok(())
}

/// Takes a product off sale. Fails while any rental of it is out.
///
/// # Errors
/// Returns [`Error::ProductInUse`] if any rental of the product is unreturned.
pub async fn deactivate_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<product::Model> {
    let txn = db.begin().await?;
    let existing = require_product(&txn, product_id).await?;
    ensure_not_rented(&txn, product_id).await?;

    let mut model: product::ActiveModel = existing.into();
    model.active = Set(false);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = model.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(product_id, "Deactivated product");
    Ok(updated)
}

/// Soft deletes a product. Fails while any rental of it is out.
///
/// # Errors
/// - [`Error::NotFound`] if the product does not exist or is already deleted
/// - [`Error::ProductInUse`] if any rental of the product is unreturned
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let txn = db.begin().await?;
    let existing = require_product(&txn, product_id).await?;
    ensure_not_rented(&txn, product_id).await?;

    let mut model: product::ActiveModel = existing.into();
    model.active = Set(false);
    model.is_deleted = Set(true);
    model.updated_at = Set(chrono::Utc::now().naive_utc());
    let updated = model.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(product_id, "Deleted product");
    Ok(updated)
}

/// Input for [`create_supplier`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    /// Company name
    pub name: String,
    /// Person to contact
    pub contact_person: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Mailing address
    pub address: String,
}

/// Creates a supplier.
pub async fn create_supplier(
    db: &DatabaseConnection,
    input: NewSupplier,
) -> Result<supplier::Model> {
    let name = require_text("Supplier name", &input.name)?;
    let created = supplier::ActiveModel {
        name: Set(name),
        contact_person: Set(input.contact_person.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.trim().to_string()),
        address: Set(input.address.trim().to_string()),
        active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(supplier_id = created.id, "Created supplier {}", created.name);
    Ok(created)
}

/// Suppliers alphabetically, optionally only active ones.
pub async fn list_suppliers(
    db: &DatabaseConnection,
    active_only: bool,
) -> Result<Vec<supplier::Model>> {
    let mut query = Supplier::find();
    if active_only {
        query = query.filter(supplier::Column::Active.eq(true));
    }
    query
        .order_by_asc(supplier::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a supplier inactive. Its products are untouched.
pub async fn deactivate_supplier(
    db: &DatabaseConnection,
    supplier_id: i64,
) -> Result<supplier::Model> {
    let mut model: supplier::ActiveModel = require_supplier(db, supplier_id).await?.into();
    model.active = Set(false);
    let updated = model.update(db).await?;
    tracing::info!(supplier_id, "Deactivated supplier");
    Ok(updated)
}

/// Input for [`create_customer`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Mailing address
    pub address: String,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Creates a store customer.
pub async fn create_customer(
    db: &DatabaseConnection,
    input: NewCustomer,
) -> Result<customer::Model> {
    let name = require_text("Customer name", &input.name)?;
    let created = customer::ActiveModel {
        name: Set(name),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.trim().to_string()),
        address: Set(input.address.trim().to_string()),
        notes: Set(optional_text(input.notes)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(customer_id = created.id, "Created customer {}", created.name);
    Ok(created)
}

/// Loads a customer or fails with [`Error::NotFound`].
pub(crate) async fn require_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("customer", customer_id))
}

/// Customers alphabetically.
pub async fn list_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Input for [`record_sale`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewSale {
    /// Product sold
    pub product_id: i64,
    /// Buyer
    pub customer_id: i64,
    /// Business date
    pub date: Date,
    /// Units sold, at least one
    pub quantity: i32,
    /// How the customer paid
    pub payment_method: PaymentMethod,
}

/// Sells units of a product at its current selling price.
///
/// # Errors
/// - [`Error::Validation`] for a non-positive quantity or an inactive product
/// - [`Error::OutOfStock`] if not enough units are on hand; nothing is recorded
pub async fn record_sale(db: &DatabaseConnection, input: NewSale) -> Result<sale::Model> {
    if input.quantity <= 0 {
        return Err(Error::validation("Quantity sold must be positive"));
    }

    let txn = db.begin().await?;
    let item = require_active_product(&txn, input.product_id).await?;
    require_customer(&txn, input.customer_id).await?;
    take_stock(&txn, item.id, input.quantity).await?;

    let created = sale::ActiveModel {
        product_id: Set(item.id),
        customer_id: Set(input.customer_id),
        date: Set(input.date),
        quantity: Set(input.quantity),
        unit_price: Set(item.selling_price),
        total_amount: Set(money::line_total(input.quantity, item.selling_price)?),
        payment_method: Set(input.payment_method),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(
        sale_id = created.id,
        product_id = item.id,
        quantity = created.quantity,
        total = created.total_amount,
        "Recorded sale"
    );
    Ok(created)
}

/// Sales newest first, optionally for one customer.
pub async fn list_sales(
    db: &DatabaseConnection,
    customer_id: Option<i64>,
) -> Result<Vec<sale::Model>> {
    let mut query = Sale::find();
    if let Some(customer_id) = customer_id {
        query = query.filter(sale::Column::CustomerId.eq(customer_id));
    }
    query
        .order_by_desc(sale::Column::Date)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = product_input("", 1);
        let result = create_product(&db, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        input.name = "Violin".to_string();
        input.selling_price = -1.0;
        let result = create_product(&db, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        input.selling_price = 100.0;
        input.rental_price = Some(f64::NAN);
        let result = create_product(&db, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        input.rental_price = None;
        input.stock_quantity = -1;
        let result = create_product(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_with_supplier() -> Result<()> {
        let db = setup_test_db().await?;
        let supplier = create_supplier(
            &db,
            NewSupplier {
                name: "Yamaha Canada".to_string(),
                ..Default::default()
            },
        )
        .await?;

        let mut input = product_input("Clarinet", 2);
        input.supplier_id = Some(supplier.id);
        let created = create_product(&db, input).await?;
        assert_eq!(created.supplier_id, Some(supplier.id));
        assert!(created.active);

        let from_supplier = list_products(
            &db,
            &ProductFilter {
                supplier_id: Some(supplier.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(from_supplier.len(), 1);

        let mut orphan = product_input("Oboe", 1);
        orphan.supplier_id = Some(77);
        let result = create_product(&db, orphan).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "supplier",
                ..
            }
        ));

        deactivate_supplier(&db, supplier.id).await?;
        assert!(list_suppliers(&db, true).await?.is_empty());
        assert_eq!(list_suppliers(&db, false).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_restock_never_goes_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_product(&db, "Violin", 2).await?;

        let restocked = restock_product(&db, item.id, 3).await?;
        assert_eq!(restocked.stock_quantity, 5);

        let result = restock_product(&db, item.id, -6).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::OutOfStock {
                available: 5,
                requested: 6,
                ..
            }
        ));

        let result = restock_product(&db, item.id, i32::MIN).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert_eq!(get_product(&db, item.id).await?.unwrap().stock_quantity, 5);

        let counted = restock_product(&db, item.id, -5).await?;
        assert_eq!(counted.stock_quantity, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_sale_decrements_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_product(&db, "Rosin", 3).await?;
        let buyer = create_test_customer(&db, "Maya").await?;

        let sale = record_sale(
            &db,
            NewSale {
                product_id: item.id,
                customer_id: buyer.id,
                date: date(2024, 4, 2),
                quantity: 2,
                payment_method: PaymentMethod::Debit,
            },
        )
        .await?;
        assert_eq!(sale.unit_price, item.selling_price);
        assert_eq!(sale.total_amount, 2.0 * item.selling_price);
        assert_eq!(
            get_product(&db, item.id).await?.unwrap().stock_quantity,
            1
        );

        let result = record_sale(
            &db,
            NewSale {
                product_id: item.id,
                customer_id: buyer.id,
                date: date(2024, 4, 3),
                quantity: 2,
                payment_method: PaymentMethod::Cash,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::OutOfStock { .. }));
        assert_eq!(
            get_product(&db, item.id).await?.unwrap().stock_quantity,
            1
        );
        assert_eq!(list_sales(&db, Some(buyer.id)).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_pricing_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let item = create_test_product(&db, "Cello", 1).await?;

        let updated = update_product_pricing(
            &db,
            item.id,
            ProductPricing {
                cost: 400.0,
                selling_price: 899.999,
                rental_price: None,
            },
        )
        .await?;
        assert_eq!(updated.selling_price, 900.0);
        assert_eq!(updated.rental_price, None);

        let deleted = delete_product(&db, item.id).await?;
        assert!(deleted.is_deleted);
        assert!(!deleted.active);
        assert!(list_products(&db, &ProductFilter::default()).await?.is_empty());

        let result = delete_product(&db, item.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        // Still readable for history
        assert!(get_product(&db, item.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_customers_listed_alphabetically() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_customer(&db, "Zoe").await?;
        create_test_customer(&db, "Adam").await?;

        let names: Vec<String> = list_customers(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Adam", "Zoe"]);
        Ok(())
    }
}
