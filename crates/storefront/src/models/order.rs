//! Orders, cart lines and shipping addresses.
//!
//! A customer's cart is their most recent order that has no shipping address
//! yet. Checking out attaches an address, which closes the order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bozor_core::{CustomerId, OrderId, OrderProductId, ProductId, ShippingAddressId};

use super::Product;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub created_at: DateTime<Utc>,
    pub shipping: bool,
}

/// A product line in an order.
///
/// Both references are nullable: deleting the product or the order detaches
/// the line instead of deleting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderProduct {
    pub id: OrderProductId,
    pub product_id: Option<ProductId>,
    pub order_id: Option<OrderId>,
    pub quantity: Option<i32>,
    pub added_at: DateTime<Utc>,
}

/// An order line together with its product, if the product still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub item: OrderProduct,
    pub product: Option<Product>,
}

impl CartLine {
    /// Units on this line as stored. A missing quantity counts as zero.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        self.item.quantity.unwrap_or(0)
    }

    /// Unit price times quantity. Lines whose product was deleted are free.
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.product
            .as_ref()
            .map_or(0.0, |product| product.price.times(self.quantity()))
    }
}

/// An order with its lines loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    pub order: Order,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.lines.iter().map(CartLine::total_price).sum()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity())).sum()
    }

    /// True when there is nothing to check out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_quantity() <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub id: ShippingAddressId,
    pub customer_id: Option<CustomerId>,
    pub order_id: Option<OrderId>,
    pub address: String,
    pub city: String,
    pub region: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bozor_core::{CategoryId, Price};

    use super::*;

    fn product(id: i32, price: f64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Mahsulot {id}"),
            price: Price::new(price).unwrap(),
            created_at: Utc::now(),
            quantity: 10,
            description: Product::DEFAULT_DESCRIPTION.to_string(),
            category_id: CategoryId::new(1),
            slug: None,
            size: "17".to_string(),
            color: Product::DEFAULT_COLOR.to_string(),
        }
    }

    fn line(id: i32, product: Option<Product>, quantity: Option<i32>) -> CartLine {
        CartLine {
            item: OrderProduct {
                id: OrderProductId::new(id),
                product_id: product.as_ref().map(|p| p.id),
                order_id: Some(OrderId::new(1)),
                quantity,
                added_at: Utc::now(),
            },
            product,
        }
    }

    fn cart(lines: Vec<CartLine>) -> Cart {
        Cart {
            order: Order {
                id: OrderId::new(1),
                customer_id: Some(CustomerId::new(1)),
                created_at: Utc::now(),
                shipping: true,
            },
            lines,
        }
    }

    #[test]
    fn test_line_total() {
        let l = line(1, Some(product(1, 10.0)), Some(2));
        assert_eq!(l.quantity(), 2);
        assert!((l.total_price() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cart_totals() {
        let cart = cart(vec![
            line(1, Some(product(1, 10.0)), Some(2)),
            line(2, Some(product(2, 5.0)), Some(3)),
        ]);
        assert!((cart.total_price() - 35.0).abs() < f64::EPSILON);
        assert_eq!(cart.total_quantity(), 5);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_empty_cart() {
        let cart = cart(vec![]);
        assert!(cart.total_price().abs() < f64::EPSILON);
        assert_eq!(cart.total_quantity(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_detached_product_line_is_free() {
        let cart = cart(vec![
            line(1, None, Some(4)),
            line(2, Some(product(2, 5.0)), Some(1)),
        ]);
        assert!((cart.total_price() - 5.0).abs() < f64::EPSILON);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_negative_quantity_is_summed_as_stored() {
        let cart = cart(vec![
            line(1, Some(product(1, 10.0)), Some(3)),
            line(2, Some(product(2, 10.0)), Some(-1)),
        ]);
        assert_eq!(cart.total_quantity(), 2);
        assert!((cart.total_price() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cart_with_net_zero_quantity_is_empty() {
        let cart = cart(vec![
            line(1, Some(product(1, 10.0)), Some(1)),
            line(2, Some(product(1, 10.0)), Some(-1)),
        ]);
        assert_eq!(cart.total_quantity(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_missing_quantity_counts_as_zero() {
        let l = line(1, Some(product(1, 99.0)), None);
        assert_eq!(l.quantity(), 0);
        assert!(l.total_price().abs() < f64::EPSILON);
    }
}
