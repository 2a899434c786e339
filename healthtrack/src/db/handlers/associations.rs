//! Database repository for association link tables.

use std::marker::PhantomData;

use sqlx::{PgConnection, Postgres, QueryBuilder, Row};
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::associations::{AssociationLink, LinkAttribute, LinkKind},
};
use crate::types::{EntityId, raw_ids};

/// Postgres caps a statement at 65535 bind parameters; stay well below it.
const MAX_LINKS_PER_INSERT: usize = 1000;

/// The two store primitives the association synchronizer is built on.
#[async_trait::async_trait]
pub trait LinkStore<K: LinkKind>: Send {
    /// Delete every link whose parent is in `parent_ids`, returning the number removed
    async fn delete_by_parents(&mut self, parent_ids: &[K::Parent]) -> Result<u64>;

    /// Insert `links`, returning the number of rows stored
    async fn insert_links(&mut self, links: &[AssociationLink<K>]) -> Result<u64>;
}

pub struct Associations<'c, K> {
    db: &'c mut PgConnection,
    kind: PhantomData<K>,
}

impl<'c, K: LinkKind> Associations<'c, K> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db, kind: PhantomData }
    }

    /// Current links of the given parents, ordered by parent then child
    #[instrument(skip(self, parent_ids), fields(association = K::TABLE, count = parent_ids.len()), err)]
    pub async fn list_for_parents(&mut self, parent_ids: &[K::Parent]) -> Result<Vec<AssociationLink<K>>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let attribute = K::ATTRIBUTE_COLUMN.map(|column| format!(", {column}")).unwrap_or_default();
        let sql = format!(
            "SELECT {parent}, {child}{attribute} FROM {table} WHERE {parent} = ANY($1) ORDER BY {parent}, {child}",
            parent = K::PARENT_COLUMN,
            child = K::CHILD_COLUMN,
            table = K::TABLE,
        );

        let rows = sqlx::query(&sql).bind(raw_ids(parent_ids)).fetch_all(&mut *self.db).await?;

        let mut links = Vec::with_capacity(rows.len());
        for row in rows {
            let parent_id: i64 = row.try_get(K::PARENT_COLUMN)?;
            let child_id: i64 = row.try_get(K::CHILD_COLUMN)?;
            let attribute = K::Attribute::from_row(&row, K::ATTRIBUTE_COLUMN)?;
            links.push(AssociationLink::new(K::Parent::from(parent_id), K::Child::from(child_id), attribute));
        }

        Ok(links)
    }
}

#[async_trait::async_trait]
impl<'c, K: LinkKind> LinkStore<K> for Associations<'c, K> {
    #[instrument(skip(self, parent_ids), fields(association = K::TABLE, count = parent_ids.len()), err)]
    async fn delete_by_parents(&mut self, parent_ids: &[K::Parent]) -> Result<u64> {
        if parent_ids.is_empty() {
            return Ok(0);
        }

        let sql = format!("DELETE FROM {} WHERE {} = ANY($1)", K::TABLE, K::PARENT_COLUMN);
        let result = sqlx::query(&sql).bind(raw_ids(parent_ids)).execute(&mut *self.db).await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, links), fields(association = K::TABLE, count = links.len()), err)]
    async fn insert_links(&mut self, links: &[AssociationLink<K>]) -> Result<u64> {
        let mut inserted = 0;

        for chunk in links.chunks(MAX_LINKS_PER_INSERT) {
            let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!("INSERT INTO {} ({}, {}", K::TABLE, K::PARENT_COLUMN, K::CHILD_COLUMN));
            if let Some(column) = K::ATTRIBUTE_COLUMN {
                query.push(", ");
                query.push(column);
            }
            query.push(") ");

            query.push_values(chunk, |mut row, link| {
                row.push_bind(link.parent_id.get());
                row.push_bind(link.child_id.get());
                link.attribute.push_bind(&mut row);
            });

            inserted += query.build().execute(&mut *self.db).await?.rows_affected();
        }

        Ok(inserted)
    }
}
