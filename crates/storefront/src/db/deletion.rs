//! Deletion handler.
//!
//! Foreign keys in the `store` schema carry no `ON DELETE` action. Deleting a
//! row goes through [`delete_entity`], which applies the policy table in
//! [`bozor_core::relations`]:
//!
//! 1. collect every row reachable through cascading foreign keys,
//! 2. clear set-null columns that point at any collected row,
//! 3. clear self-references among the collected rows, so a `parent_id` cycle
//!    does not block its own deletion,
//! 4. delete the collected rows, children before parents.
//!
//! All steps run in one transaction. A reference the policy table does
//! not know about makes the final `DELETE` fail and the transaction roll back.

use std::collections::{BTreeMap, HashSet};

use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use bozor_core::relations::{Entity, ForeignKey, cascades_from, nullified_by};

use super::RepositoryError;

/// Row-level operations the deletion handler needs.
///
/// Ids are raw keys; the entity says which table they belong to.
#[allow(async_fn_in_trait)]
pub trait DeletionStore {
    /// Whether a row with this id exists.
    async fn row_exists(&mut self, entity: Entity, id: i32) -> Result<bool, RepositoryError>;

    /// Ids of `fk.child` rows whose `fk.column` is one of `parents`.
    async fn referencing_ids(
        &mut self,
        fk: &ForeignKey,
        parents: &[i32],
    ) -> Result<Vec<i32>, RepositoryError>;

    /// Set `fk.column` to NULL where it is one of `parents`. Returns rows changed.
    async fn clear_references(
        &mut self,
        fk: &ForeignKey,
        parents: &[i32],
    ) -> Result<u64, RepositoryError>;

    /// Delete rows by id. Returns rows deleted.
    async fn delete_rows(&mut self, entity: Entity, ids: &[i32]) -> Result<u64, RepositoryError>;
}

/// What a deletion touched, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: BTreeMap<Entity, u64>,
    /// Rows kept with a foreign key cleared.
    pub detached: BTreeMap<Entity, u64>,
}

impl DeletionReport {
    #[must_use]
    pub fn deleted(&self, entity: Entity) -> u64 {
        self.deleted.get(&entity).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn detached(&self, entity: Entity) -> u64 {
        self.detached.get(&entity).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_deleted(&self) -> u64 {
        self.deleted.values().sum()
    }
}

impl std::fmt::Display for DeletionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (label, counts) in [("deleted", &self.deleted), ("detached", &self.detached)] {
            for (entity, count) in counts {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{label} {count} {entity}")?;
                first = false;
            }
        }
        if first {
            f.write_str("nothing")?;
        }
        Ok(())
    }
}

/// Delete `root` row `id` and everything that depends on it.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the root row does not exist.
/// Returns whatever the store returns if a step fails; the caller is
/// expected to roll back.
pub async fn delete_cascading<S: DeletionStore>(
    store: &mut S,
    root: Entity,
    id: i32,
) -> Result<DeletionReport, RepositoryError> {
    if !store.row_exists(root, id).await? {
        return Err(RepositoryError::NotFound);
    }

    // Batches in discovery order. A child batch is always discovered after
    // the batch holding its parents.
    let mut batches: Vec<(Entity, Vec<i32>)> = vec![(root, vec![id])];
    let mut seen: HashSet<(Entity, i32)> = HashSet::from([(root, id)]);
    let mut next = 0;
    while let Some((entity, ids)) = batches.get(next).cloned() {
        for fk in cascades_from(entity) {
            let children: Vec<i32> = store
                .referencing_ids(fk, &ids)
                .await?
                .into_iter()
                .filter(|child| seen.insert((fk.child, *child)))
                .collect();
            if !children.is_empty() {
                batches.push((fk.child, children));
            }
        }
        next += 1;
    }

    let mut report = DeletionReport::default();

    for (entity, ids) in &batches {
        for fk in nullified_by(*entity) {
            let cleared = store.clear_references(fk, ids).await?;
            if cleared > 0 {
                *report.detached.entry(fk.child).or_default() += cleared;
            }
        }
    }

    let mut collected: BTreeMap<Entity, Vec<i32>> = BTreeMap::new();
    for (entity, ids) in &batches {
        collected.entry(*entity).or_default().extend(ids);
    }
    for (entity, ids) in &collected {
        // Every row pointing at a collected row through a cascading key is
        // itself collected, so nothing outside the closure changes here.
        for fk in cascades_from(*entity).filter(|fk| fk.child == *entity) {
            store.clear_references(fk, ids).await?;
        }
    }

    for (entity, ids) in batches.iter().rev() {
        let deleted = store.delete_rows(*entity, ids).await?;
        *report.deleted.entry(*entity).or_default() += deleted;
    }

    Ok(report)
}

/// [`DeletionStore`] over an open `PostgreSQL` transaction.
pub struct PgDeletionStore<'t> {
    tx: &'t mut Transaction<'static, Postgres>,
}

impl<'t> PgDeletionStore<'t> {
    #[must_use]
    pub const fn new(tx: &'t mut Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

// Table and column names below come from the static policy table, never
// from input.
impl DeletionStore for PgDeletionStore<'_> {
    async fn row_exists(&mut self, entity: Entity, id: i32) -> Result<bool, RepositoryError> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", entity.table());
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&mut **self.tx)
            .await?;
        Ok(exists)
    }

    async fn referencing_ids(
        &mut self,
        fk: &ForeignKey,
        parents: &[i32],
    ) -> Result<Vec<i32>, RepositoryError> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ANY($1) ORDER BY id",
            fk.child.table(),
            fk.column
        );
        let ids = sqlx::query_scalar::<_, i32>(&sql)
            .bind(parents)
            .fetch_all(&mut **self.tx)
            .await?;
        Ok(ids)
    }

    async fn clear_references(
        &mut self,
        fk: &ForeignKey,
        parents: &[i32],
    ) -> Result<u64, RepositoryError> {
        let sql = format!(
            "UPDATE {table} SET {column} = NULL WHERE {column} = ANY($1)",
            table = fk.child.table(),
            column = fk.column
        );
        let result = sqlx::query(&sql)
            .bind(parents)
            .execute(&mut **self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_rows(&mut self, entity: Entity, ids: &[i32]) -> Result<u64, RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = ANY($1)", entity.table());
        let result = sqlx::query(&sql)
            .bind(ids)
            .execute(&mut **self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Delete a row and its dependents in one transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the row does not exist.
/// Returns `RepositoryError::Database` if any statement fails; nothing is
/// changed in that case.
#[instrument(skip(pool))]
pub async fn delete_entity(
    pool: &PgPool,
    entity: Entity,
    id: i32,
) -> Result<DeletionReport, RepositoryError> {
    let mut tx = pool.begin().await?;
    let report = delete_cascading(&mut PgDeletionStore::new(&mut tx), entity, id).await?;
    tx.commit().await?;

    tracing::info!(%entity, id, %report, "Deleted row and dependents");
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use bozor_core::relations::FOREIGN_KEYS;

    use super::*;

    /// In-memory tables: `entity -> id -> (column -> referenced id)`.
    ///
    /// `delete_rows` refuses to delete a row that is still referenced, like a
    /// foreign key without `ON DELETE` would.
    #[derive(Default)]
    struct MemoryStore {
        tables: BTreeMap<Entity, BTreeMap<i32, BTreeMap<&'static str, Option<i32>>>>,
    }

    impl MemoryStore {
        fn insert(&mut self, entity: Entity, id: i32, refs: &[(&'static str, Option<i32>)]) {
            self.tables
                .entry(entity)
                .or_default()
                .insert(id, refs.iter().copied().collect());
        }

        fn ids(&self, entity: Entity) -> Vec<i32> {
            self.tables
                .get(&entity)
                .map(|rows| rows.keys().copied().collect())
                .unwrap_or_default()
        }

        fn reference(&self, entity: Entity, id: i32, column: &str) -> Option<i32> {
            self.tables[&entity][&id][column]
        }

        fn is_referenced(&self, entity: Entity, id: i32) -> bool {
            FOREIGN_KEYS.iter().filter(|fk| fk.parent == entity).any(|fk| {
                self.tables.get(&fk.child).is_some_and(|rows| {
                    rows.values()
                        .any(|cols| cols.get(fk.column).copied().flatten() == Some(id))
                })
            })
        }
    }

    impl DeletionStore for MemoryStore {
        async fn row_exists(&mut self, entity: Entity, id: i32) -> Result<bool, RepositoryError> {
            Ok(self.tables.get(&entity).is_some_and(|rows| rows.contains_key(&id)))
        }

        async fn referencing_ids(
            &mut self,
            fk: &ForeignKey,
            parents: &[i32],
        ) -> Result<Vec<i32>, RepositoryError> {
            Ok(self
                .tables
                .get(&fk.child)
                .map(|rows| {
                    rows.iter()
                        .filter(|(_, cols)| {
                            cols.get(fk.column)
                                .copied()
                                .flatten()
                                .is_some_and(|p| parents.contains(&p))
                        })
                        .map(|(id, _)| *id)
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn clear_references(
            &mut self,
            fk: &ForeignKey,
            parents: &[i32],
        ) -> Result<u64, RepositoryError> {
            let mut cleared = 0;
            if let Some(rows) = self.tables.get_mut(&fk.child) {
                for cols in rows.values_mut() {
                    if let Some(value) = cols.get_mut(fk.column)
                        && value.is_some_and(|p| parents.contains(&p))
                    {
                        *value = None;
                        cleared += 1;
                    }
                }
            }
            Ok(cleared)
        }

        async fn delete_rows(
            &mut self,
            entity: Entity,
            ids: &[i32],
        ) -> Result<u64, RepositoryError> {
            for id in ids {
                if self.is_referenced(entity, *id) {
                    return Err(RepositoryError::Conflict(format!(
                        "{entity} {id} is still referenced"
                    )));
                }
            }
            let rows = self.tables.entry(entity).or_default();
            let before = rows.len();
            rows.retain(|id, _| !ids.contains(id));
            Ok((before - rows.len()) as u64)
        }
    }

    /// Two users, a category tree with one subcategory, two products, and an
    /// order that references product 10.
    fn shop() -> MemoryStore {
        let mut s = MemoryStore::default();
        s.insert(Entity::User, 1, &[]);
        s.insert(Entity::User, 2, &[]);
        s.insert(Entity::Customer, 1, &[("user_id", Some(1))]);
        s.insert(Entity::Category, 1, &[("parent_id", None)]);
        s.insert(Entity::Category, 2, &[("parent_id", Some(1))]);
        s.insert(Entity::Category, 3, &[("parent_id", None)]);
        s.insert(Entity::Product, 10, &[("category_id", Some(1))]);
        s.insert(Entity::Product, 20, &[("category_id", Some(2))]);
        s.insert(Entity::Product, 30, &[("category_id", Some(3))]);
        s.insert(Entity::Gallery, 100, &[("product_id", Some(10))]);
        s.insert(Entity::Gallery, 200, &[("product_id", Some(20))]);
        s.insert(
            Entity::Review,
            1,
            &[("author_id", Some(2)), ("product_id", Some(10))],
        );
        s.insert(
            Entity::Review,
            2,
            &[("author_id", Some(2)), ("product_id", Some(30))],
        );
        s.insert(
            Entity::FavouriteProduct,
            1,
            &[("user_id", Some(1)), ("product_id", Some(20))],
        );
        s.insert(Entity::Order, 1, &[("customer_id", Some(1))]);
        s.insert(
            Entity::OrderProduct,
            1,
            &[("product_id", Some(10)), ("order_id", Some(1))],
        );
        s.insert(
            Entity::OrderProduct,
            2,
            &[("product_id", Some(30)), ("order_id", Some(1))],
        );
        s.insert(
            Entity::ShippingAddress,
            1,
            &[("customer_id", Some(1)), ("order_id", Some(1))],
        );
        s
    }

    #[tokio::test]
    async fn test_deleting_category_cascades_through_subcategories() {
        let mut store = shop();
        let report = delete_cascading(&mut store, Entity::Category, 1)
            .await
            .unwrap();

        assert_eq!(store.ids(Entity::Category), vec![3]);
        assert_eq!(store.ids(Entity::Product), vec![30]);
        assert!(store.ids(Entity::Gallery).is_empty());
        assert_eq!(store.ids(Entity::Review), vec![2]);
        assert!(store.ids(Entity::FavouriteProduct).is_empty());

        assert_eq!(report.deleted(Entity::Category), 2);
        assert_eq!(report.deleted(Entity::Product), 2);
        assert_eq!(report.deleted(Entity::Gallery), 2);
        assert_eq!(report.deleted(Entity::Review), 1);
        assert_eq!(report.deleted(Entity::FavouriteProduct), 1);
    }

    #[tokio::test]
    async fn test_deleting_category_in_parent_cycle() {
        let mut store = MemoryStore::default();
        store.insert(Entity::Category, 1, &[("parent_id", Some(2))]);
        store.insert(Entity::Category, 2, &[("parent_id", Some(1))]);
        store.insert(Entity::Category, 3, &[("parent_id", None)]);
        store.insert(Entity::Product, 10, &[("category_id", Some(2))]);

        let report = delete_cascading(&mut store, Entity::Category, 1)
            .await
            .unwrap();

        assert_eq!(store.ids(Entity::Category), vec![3]);
        assert!(store.ids(Entity::Product).is_empty());
        assert_eq!(report.deleted(Entity::Category), 2);
        assert_eq!(report.deleted(Entity::Product), 1);
        assert_eq!(report.detached(Entity::Category), 0);
    }

    #[tokio::test]
    async fn test_deleting_product_detaches_order_lines() {
        let mut store = shop();
        let report = delete_cascading(&mut store, Entity::Product, 10)
            .await
            .unwrap();

        assert_eq!(store.ids(Entity::OrderProduct), vec![1, 2]);
        assert_eq!(store.reference(Entity::OrderProduct, 1, "product_id"), None);
        assert_eq!(
            store.reference(Entity::OrderProduct, 1, "order_id"),
            Some(1)
        );
        assert_eq!(
            store.reference(Entity::OrderProduct, 2, "product_id"),
            Some(30)
        );
        assert_eq!(report.detached(Entity::OrderProduct), 1);
        assert_eq!(report.deleted(Entity::OrderProduct), 0);
        assert_eq!(report.deleted(Entity::Product), 1);
    }

    #[tokio::test]
    async fn test_deleting_customer_keeps_orders_and_addresses() {
        let mut store = shop();
        let report = delete_cascading(&mut store, Entity::Customer, 1)
            .await
            .unwrap();

        assert!(store.ids(Entity::Customer).is_empty());
        assert_eq!(store.ids(Entity::Order), vec![1]);
        assert_eq!(store.reference(Entity::Order, 1, "customer_id"), None);
        assert_eq!(
            store.reference(Entity::ShippingAddress, 1, "customer_id"),
            None
        );
        assert_eq!(
            store.reference(Entity::ShippingAddress, 1, "order_id"),
            Some(1)
        );
        assert_eq!(report.total_deleted(), 1);
        assert_eq!(report.detached(Entity::Order), 1);
        assert_eq!(report.detached(Entity::ShippingAddress), 1);
    }

    #[tokio::test]
    async fn test_deleting_order_detaches_lines_and_address() {
        let mut store = shop();
        delete_cascading(&mut store, Entity::Order, 1).await.unwrap();

        assert!(store.ids(Entity::Order).is_empty());
        assert_eq!(store.ids(Entity::OrderProduct), vec![1, 2]);
        assert_eq!(store.reference(Entity::OrderProduct, 1, "order_id"), None);
        assert_eq!(
            store.reference(Entity::ShippingAddress, 1, "order_id"),
            None
        );
    }

    #[tokio::test]
    async fn test_deleting_user_removes_reviews_and_favourites_only() {
        let mut store = shop();
        let report = delete_cascading(&mut store, Entity::User, 1).await.unwrap();

        assert_eq!(store.ids(Entity::User), vec![2]);
        assert!(store.ids(Entity::FavouriteProduct).is_empty());
        assert_eq!(store.ids(Entity::Customer), vec![1]);
        assert_eq!(store.reference(Entity::Customer, 1, "user_id"), None);
        assert_eq!(report.detached(Entity::Customer), 1);

        let report = delete_cascading(&mut store, Entity::User, 2).await.unwrap();
        assert!(store.ids(Entity::Review).is_empty());
        assert_eq!(report.deleted(Entity::Review), 2);
        assert_eq!(store.ids(Entity::Product), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let mut store = shop();
        let err = delete_cascading(&mut store, Entity::Product, 999)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(store.ids(Entity::Product), vec![10, 20, 30]);
    }

    #[test]
    fn test_report_display() {
        let mut report = DeletionReport::default();
        assert_eq!(report.to_string(), "nothing");
        report.deleted.insert(Entity::Product, 2);
        report.detached.insert(Entity::OrderProduct, 1);
        assert_eq!(report.to_string(), "deleted 2 product, detached 1 order_product");
    }
}
