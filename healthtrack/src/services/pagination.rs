//! Paginated listings over a parent ⟕ link ⟕ child join.
//!
//! The window query returns one row per `(parent, child)` pair, so its row count says nothing
//! about how many parents match. [`PaginatedAggregateQuery`] therefore runs a second,
//! unpaginated query counting distinct parents for the same filter and builds the page metadata
//! from that count alone. Offset and limit apply to joined rows: a parent with many children may
//! be split across two pages or push later parents to the next page.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, instrument};

use crate::api::models::pagination::{PageRequest, PageResponse};
use crate::config::PaginationConfig;
use crate::db::errors::Result as DbResult;
use crate::errors::Result;

/// Store side of a paginated listing.
#[async_trait::async_trait]
pub trait DetailSource: Send {
    type Filter: Send + Sync;
    /// One joined row
    type Row: Send;
    /// One parent with its nested children
    type Detail: Send;

    /// Joined rows for the filter, ordered, skipping `offset` rows and returning at most `limit`
    async fn fetch_window(&mut self, filter: &Self::Filter, offset: i64, limit: i64) -> DbResult<Vec<Self::Row>>;

    /// Number of distinct parents matching the filter, ignoring pagination
    async fn count_parents(&mut self, filter: &Self::Filter) -> DbResult<i64>;

    /// Fold joined rows into one detail per parent, keeping row order
    fn assemble(rows: Vec<Self::Row>) -> Vec<Self::Detail>;
}

pub struct PaginatedAggregateQuery<S> {
    source: S,
    bounds: PaginationConfig,
}

impl<S: DetailSource> PaginatedAggregateQuery<S> {
    pub fn new(source: S, bounds: PaginationConfig) -> Self {
        Self { source, bounds }
    }

    /// Validate `page`, then build the page from the window and distinct-parent count.
    ///
    /// When no parent matches, the explicit empty page is returned and the window query is
    /// skipped.
    #[instrument(skip_all, fields(current = ?page.current, size = ?page.size), err)]
    pub async fn list(&mut self, filter: &S::Filter, page: &PageRequest) -> Result<PageResponse<S::Detail>> {
        let page = page.resolve(&self.bounds)?;

        let total = self.source.count_parents(filter).await?;
        if total < 1 {
            debug!("No matching parents");
            return Ok(PageResponse::empty());
        }

        let rows = self.source.fetch_window(filter, page.offset(), page.limit()).await?;
        debug!(total, rows = rows.len(), "Fetched page window");

        Ok(PageResponse::new(page, total, S::assemble(rows)))
    }
}

/// Group joined rows by parent key, preserving first-appearance order.
///
/// `split` turns a row into its parent part and its child part; rows without a child (outer join
/// misses) still produce the parent, with no children.
pub fn group_rows<R, K, P, C>(rows: Vec<R>, key: impl Fn(&R) -> K, split: impl Fn(R) -> (P, Option<C>)) -> Vec<(P, Vec<C>)>
where
    K: Eq + Hash,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(P, Vec<C>)> = Vec::new();

    for row in rows {
        let row_key = key(&row);
        let (parent, child) = split(row);
        let position = *index.entry(row_key).or_insert_with(|| {
            groups.push((parent, Vec::new()));
            groups.len() - 1
        });
        if let Some(child) = child {
            groups[position].1.push(child);
        }
    }

    groups
}
