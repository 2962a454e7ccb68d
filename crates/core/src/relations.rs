//! Foreign keys between storefront tables and what happens to the referencing
//! row when the referenced row is deleted.
//!
//! The database declares these foreign keys without `ON DELETE` actions; the
//! storefront's deletion handler walks [`FOREIGN_KEYS`] instead, so this table
//! is the only place the policy lives.
//!
//! ```text
//! Category ──cascade──▶ Category (subcategories)
//! Category ──cascade──▶ Product ──cascade──▶ Gallery, Review, FavouriteProduct
//!                        Product ──set null──▶ OrderProduct.product_id
//! User ──cascade──▶ Review, FavouriteProduct
//! User ──set null──▶ Customer.user_id
//! Customer ──set null──▶ Order.customer_id, ShippingAddress.customer_id
//! Order ──set null──▶ OrderProduct.order_id, ShippingAddress.order_id
//! ```

use std::fmt;

/// A persisted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    User,
    Category,
    Product,
    Gallery,
    Review,
    FavouriteProduct,
    Customer,
    Order,
    OrderProduct,
    ShippingAddress,
}

impl Entity {
    pub const ALL: [Self; 10] = [
        Self::User,
        Self::Category,
        Self::Product,
        Self::Gallery,
        Self::Review,
        Self::FavouriteProduct,
        Self::Customer,
        Self::Order,
        Self::OrderProduct,
        Self::ShippingAddress,
    ];

    /// Schema-qualified table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::User => "store.user",
            Self::Category => "store.category",
            Self::Product => "store.product",
            Self::Gallery => "store.gallery",
            Self::Review => "store.review",
            Self::FavouriteProduct => "store.favourite_product",
            Self::Customer => "store.customer",
            Self::Order => "store.order",
            Self::OrderProduct => "store.order_product",
            Self::ShippingAddress => "store.shipping_address",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Category => "category",
            Self::Product => "product",
            Self::Gallery => "gallery",
            Self::Review => "review",
            Self::FavouriteProduct => "favourite_product",
            Self::Customer => "customer",
            Self::Order => "order",
            Self::OrderProduct => "order_product",
            Self::ShippingAddress => "shipping_address",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.to_string() == s)
            .ok_or_else(|| format!("unknown entity: {s}"))
    }
}

/// What happens to a referencing row when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Delete the referencing row too.
    Cascade,
    /// Keep the referencing row and clear the column.
    SetNull,
}

/// A foreign key column `child.column -> parent.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub child: Entity,
    pub column: &'static str,
    pub parent: Entity,
    pub on_delete: OnDelete,
}

const fn fk(child: Entity, column: &'static str, parent: Entity, on_delete: OnDelete) -> ForeignKey {
    ForeignKey {
        child,
        column,
        parent,
        on_delete,
    }
}

/// Every foreign key in the `store` schema.
pub const FOREIGN_KEYS: &[ForeignKey] = &[
    fk(Entity::Category, "parent_id", Entity::Category, OnDelete::Cascade),
    fk(Entity::Product, "category_id", Entity::Category, OnDelete::Cascade),
    fk(Entity::Gallery, "product_id", Entity::Product, OnDelete::Cascade),
    fk(Entity::Review, "author_id", Entity::User, OnDelete::Cascade),
    fk(Entity::Review, "product_id", Entity::Product, OnDelete::Cascade),
    fk(Entity::FavouriteProduct, "user_id", Entity::User, OnDelete::Cascade),
    fk(Entity::FavouriteProduct, "product_id", Entity::Product, OnDelete::Cascade),
    fk(Entity::Customer, "user_id", Entity::User, OnDelete::SetNull),
    fk(Entity::Order, "customer_id", Entity::Customer, OnDelete::SetNull),
    fk(Entity::OrderProduct, "product_id", Entity::Product, OnDelete::SetNull),
    fk(Entity::OrderProduct, "order_id", Entity::Order, OnDelete::SetNull),
    fk(Entity::ShippingAddress, "customer_id", Entity::Customer, OnDelete::SetNull),
    fk(Entity::ShippingAddress, "order_id", Entity::Order, OnDelete::SetNull),
];

/// Foreign keys that reference `parent`.
pub fn referencing(parent: Entity) -> impl Iterator<Item = &'static ForeignKey> {
    FOREIGN_KEYS.iter().filter(move |fk| fk.parent == parent)
}

/// Foreign keys whose rows are deleted along with `parent`.
pub fn cascades_from(parent: Entity) -> impl Iterator<Item = &'static ForeignKey> {
    referencing(parent).filter(|fk| fk.on_delete == OnDelete::Cascade)
}

/// Foreign keys that are cleared when `parent` is deleted.
pub fn nullified_by(parent: Entity) -> impl Iterator<Item = &'static ForeignKey> {
    referencing(parent).filter(|fk| fk.on_delete == OnDelete::SetNull)
}

/// Entity types whose rows may be deleted when a `root` row is deleted,
/// starting with `root` itself, in discovery order.
#[must_use]
pub fn cascade_closure(root: Entity) -> Vec<Entity> {
    let mut seen = vec![root];
    let mut next = 0;
    while let Some(&entity) = seen.get(next) {
        for fk in cascades_from(entity) {
            if !seen.contains(&fk.child) {
                seen.push(fk.child);
            }
        }
        next += 1;
    }
    seen
}
