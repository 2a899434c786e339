//! Replace-semantics synchronization of association links.
//!
//! [`AssociationSynchronizer::replace`] makes the stored link set of every named parent exactly
//! equal to the links passed in: existing links of those parents are deleted, then the new ones
//! are inserted. Links are never merged.
//!
//! The synchronizer does not open or commit transactions. It runs both steps on the store it was
//! given, which for Postgres is a repository over the caller's transaction. Any error leaves that
//! transaction uncommitted, so dropping it rolls the deletion back together with the rest of the
//! unit of work.

use std::collections::HashSet;
use std::marker::PhantomData;

use tracing::{debug, instrument};

use crate::db::{
    handlers::associations::LinkStore,
    models::associations::{AssociationLink, LinkKind},
};
use crate::errors::{Error, Result};

pub struct AssociationSynchronizer<S, K> {
    store: S,
    kind: PhantomData<K>,
}

impl<S, K> AssociationSynchronizer<S, K>
where
    S: LinkStore<K>,
    K: LinkKind,
{
    pub fn new(store: S) -> Self {
        Self { store, kind: PhantomData }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Replace the links of `parent_ids` with `links`.
    ///
    /// A parent in `parent_ids` with no entry in `links` ends up with no links at all. Every link
    /// must belong to one of `parent_ids` and pairs must be unique.
    #[instrument(skip_all, fields(association = K::TABLE, parents = parent_ids.len(), links = links.len()), err)]
    pub async fn replace(&mut self, parent_ids: &[K::Parent], links: Vec<AssociationLink<K>>) -> Result<()> {
        check_links(parent_ids, &links)?;

        if parent_ids.is_empty() {
            return Ok(());
        }

        let deleted = self
            .store
            .delete_by_parents(parent_ids)
            .await
            .map_err(|source| Error::AssociationDeleteFailure {
                association: K::TABLE,
                source,
            })?;

        if deleted == 0 {
            debug!("No previous links to remove");
        }

        if links.is_empty() {
            return Ok(());
        }

        let expected = links.len();
        let inserted = self
            .store
            .insert_links(&links)
            .await
            .map_err(|source| Error::AssociationSaveFailure {
                association: K::TABLE,
                expected,
                inserted: 0,
                source: Some(source),
            })?;

        if inserted != expected as u64 {
            return Err(Error::AssociationSaveFailure {
                association: K::TABLE,
                expected,
                inserted,
                source: None,
            });
        }

        debug!(deleted, inserted, "Replaced links");
        Ok(())
    }
}

fn check_links<K: LinkKind>(parent_ids: &[K::Parent], links: &[AssociationLink<K>]) -> Result<()> {
    let parents: HashSet<K::Parent> = parent_ids.iter().copied().collect();
    let mut pairs = HashSet::with_capacity(links.len());

    for link in links {
        if !parents.contains(&link.parent_id) {
            return Err(Error::Internal {
                operation: format!("replace {} links: parent {} is not being synchronized", K::TABLE, link.parent_id),
            });
        }
        if !pairs.insert((link.parent_id, link.child_id)) {
            return Err(Error::BadRequest {
                message: format!("{} {} is linked to {} more than once", K::PARENT_COLUMN, link.parent_id, link.child_id),
            });
        }
    }

    Ok(())
}
