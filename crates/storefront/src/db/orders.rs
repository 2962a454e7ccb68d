//! Order, cart line and shipping address repository.
//!
//! A customer's open order is their most recent order with no shipping
//! address. Cart operations act on that order; [`OrderRepository::checkout`]
//! closes it by attaching an address.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{CustomerId, OrderId, OrderProductId, ProductId, ShippingAddressId};

use super::RepositoryError;
use super::products::ProductRepository;
use crate::models::{Cart, CartLine, Order, OrderProduct, ShippingAddress};

const ORDER_COLUMNS: &str = "o.id, o.customer_id, o.created_at, o.shipping";
const LINE_COLUMNS: &str = "id, product_id, order_id, quantity, added_at";
const ADDRESS_COLUMNS: &str = "id, customer_id, order_id, address, city, region, phone, created_at";

fn open_order_sql() -> String {
    format!(
        "SELECT {ORDER_COLUMNS} FROM store.order o \
         WHERE o.customer_id = $1 \
           AND NOT EXISTS (SELECT 1 FROM store.shipping_address s WHERE s.order_id = o.id) \
         ORDER BY o.created_at DESC, o.id DESC LIMIT 1"
    )
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: Option<CustomerId>,
    created_at: DateTime<Utc>,
    shipping: bool,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            created_at: row.created_at,
            shipping: row.shipping,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    id: OrderProductId,
    product_id: Option<ProductId>,
    order_id: Option<OrderId>,
    quantity: Option<i32>,
    added_at: DateTime<Utc>,
}

impl From<LineRow> for OrderProduct {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            order_id: row.order_id,
            quantity: row.quantity,
            added_at: row.added_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: ShippingAddressId,
    customer_id: Option<CustomerId>,
    order_id: Option<OrderId>,
    address: String,
    city: String,
    region: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for ShippingAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            order_id: row.order_id,
            address: row.address,
            city: row.city,
            region: row.region,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

/// Delivery details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShippingAddress {
    pub address: String,
    pub city: String,
    pub region: String,
    pub phone: String,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's open order, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn open_order(&self, customer: CustomerId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&open_order_sql())
            .bind(customer)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Order::from))
    }

    /// The customer's open order, creating an empty one if needed.
    ///
    /// Creation locks the customer row, so concurrent first adds for one
    /// customer end up on the same order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get_or_create_open_order(
        &self,
        customer: CustomerId,
    ) -> Result<Order, RepositoryError> {
        if let Some(order) = self.open_order(customer).await? {
            return Ok(order);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM store.customer WHERE id = $1 FOR UPDATE")
            .bind(customer)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        // Another request may have opened one while we waited for the lock.
        if let Some(row) = sqlx::query_as::<_, OrderRow>(&open_order_sql())
            .bind(customer)
            .fetch_optional(&mut *tx)
            .await?
        {
            tx.commit().await?;
            return Ok(row.into());
        }

        let sql = format!(
            "INSERT INTO store.order AS o (customer_id) VALUES ($1) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(customer)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(order_id = %row.id, "Opened new order");
        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM store.order o WHERE o.id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Order::from))
    }

    /// Load an order's lines and their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn cart(&self, order: Order) -> Result<Cart, RepositoryError> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM store.order_product WHERE order_id = $1 ORDER BY added_at, id"
        );
        let items: Vec<OrderProduct> = sqlx::query_as::<_, LineRow>(&sql)
            .bind(order.id)
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(OrderProduct::from)
            .collect();

        let product_ids: Vec<ProductId> = items.iter().filter_map(|i| i.product_id).collect();
        let products = ProductRepository::new(self.pool)
            .get_many(&product_ids)
            .await?;

        let lines = items
            .into_iter()
            .map(|item| {
                let product = item
                    .product_id
                    .and_then(|id| products.iter().find(|p| p.id == id).cloned());
                CartLine { item, product }
            })
            .collect();

        Ok(Cart { order, lines })
    }

    /// Add one unit of `product` to the order, creating the line if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn add_product(
        &self,
        order: OrderId,
        product: ProductId,
    ) -> Result<OrderProduct, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let update = format!(
            "UPDATE store.order_product SET quantity = COALESCE(quantity, 0) + 1 \
             WHERE id = (SELECT id FROM store.order_product \
                         WHERE order_id = $1 AND product_id = $2 ORDER BY id LIMIT 1 FOR UPDATE) \
             RETURNING {LINE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, LineRow>(&update)
            .bind(order)
            .bind(product)
            .fetch_optional(&mut *tx)
            .await?;

        let row = match updated {
            Some(row) => row,
            None => {
                let insert = format!(
                    "INSERT INTO store.order_product (order_id, product_id, quantity) \
                     VALUES ($1, $2, 1) RETURNING {LINE_COLUMNS}"
                );
                sqlx::query_as::<_, LineRow>(&insert)
                    .bind(order)
                    .bind(product)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(row.into())
    }

    /// Remove one unit of `product` from the order. The line is deleted when
    /// its quantity reaches zero, in which case `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order has no line for the product.
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn remove_product(
        &self,
        order: OrderId,
        product: ProductId,
    ) -> Result<Option<OrderProduct>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let update = format!(
            "UPDATE store.order_product SET quantity = COALESCE(quantity, 0) - 1 \
             WHERE id = (SELECT id FROM store.order_product \
                         WHERE order_id = $1 AND product_id = $2 ORDER BY id LIMIT 1 FOR UPDATE) \
             RETURNING {LINE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LineRow>(&update)
            .bind(order)
            .bind(product)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let line = if row.quantity.unwrap_or(0) <= 0 {
            sqlx::query("DELETE FROM store.order_product WHERE id = $1")
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            None
        } else {
            Some(row.into())
        };

        tx.commit().await?;
        Ok(line)
    }

    /// Delete a line outright. Returns `false` if the order has no such line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_line(
        &self,
        order: OrderId,
        line: OrderProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store.order_product WHERE id = $1 AND order_id = $2")
            .bind(line)
            .bind(order)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach a shipping address to the order, closing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order was already checked out.
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, address))]
    pub async fn checkout(
        &self,
        customer: CustomerId,
        order: OrderId,
        address: &NewShippingAddress,
    ) -> Result<ShippingAddress, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes checkouts of the same order.
        sqlx::query("SELECT id FROM store.order WHERE id = $1 FOR UPDATE")
            .bind(order)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let closed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM store.shipping_address WHERE order_id = $1)",
        )
        .bind(order)
        .fetch_one(&mut *tx)
        .await?;
        if closed {
            return Err(RepositoryError::Conflict(format!(
                "order {order} is already checked out"
            )));
        }

        let sql = format!(
            "INSERT INTO store.shipping_address (customer_id, order_id, address, city, region, phone) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(customer)
            .bind(order)
            .bind(&address.address)
            .bind(&address.city)
            .bind(&address.region)
            .bind(&address.phone)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %order, customer_id = %customer, "Order checked out");
        Ok(row.into())
    }

    /// Past shipping addresses for a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shipping_addresses(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<ShippingAddress>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM store.shipping_address \
             WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(customer)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(ShippingAddress::from).collect())
    }
}
