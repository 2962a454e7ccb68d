//! Cart operations for a signed-in user.
//!
//! Carts hang off the user's customer profile. A profile is created on first
//! use for accounts that predate it.

use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{OrderProductId, ProductId, UserId};

use crate::db::orders::NewShippingAddress;
use crate::db::{CustomerRepository, OrderRepository, RepositoryError, UserRepository};
use crate::models::{Cart, Customer, OrderProduct, ShippingAddress};

pub struct CartService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// The user's customer profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user no longer exists.
    pub async fn customer(&self, user: UserId) -> Result<Customer, RepositoryError> {
        let customers = CustomerRepository::new(self.pool);
        if let Some(customer) = customers.get_by_user(user).await? {
            return Ok(customer);
        }
        let user = UserRepository::new(self.pool)
            .get(user)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        customers.get_or_create_for_user(&user).await
    }

    /// The user's open cart, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn current(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        let customer = self.customer(user).await?;
        match self.orders.open_order(customer.id).await? {
            Some(order) => Ok(Some(self.orders.cart(order).await?)),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<OrderProduct, RepositoryError> {
        let customer = self.customer(user).await?;
        let order = self.orders.get_or_create_open_order(customer.id).await?;
        self.orders.add_product(order.id, product).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart has no line for the product.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<OrderProduct>, RepositoryError> {
        let customer = self.customer(user).await?;
        let order = self
            .orders
            .open_order(customer.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        self.orders.remove_product(order.id, product).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart has no such line.
    #[instrument(skip(self))]
    pub async fn delete_line(
        &self,
        user: UserId,
        line: OrderProductId,
    ) -> Result<(), RepositoryError> {
        let customer = self.customer(user).await?;
        let order = self
            .orders
            .open_order(customer.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if self.orders.delete_line(order.id, line).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Close the open cart with a shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart is empty.
    #[instrument(skip(self, address))]
    pub async fn checkout(
        &self,
        user: UserId,
        address: &NewShippingAddress,
    ) -> Result<ShippingAddress, RepositoryError> {
        let customer = self.customer(user).await?;
        let cart = match self.orders.open_order(customer.id).await? {
            Some(order) => self.orders.cart(order).await?,
            None => return Err(RepositoryError::Conflict("cart is empty".to_owned())),
        };
        if cart.is_empty() {
            return Err(RepositoryError::Conflict("cart is empty".to_owned()));
        }
        self.orders
            .checkout(customer.id, cart.order.id, address)
            .await
    }
}
