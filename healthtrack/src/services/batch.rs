//! Helpers shared by the batch create/update services.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use chrono::{DateTime, Utc};

use crate::db::errors::DbError;
use crate::db::models::associations::{AssociationLink, LinkKind};
use crate::errors::{Error, Result};

/// Build the links of a batch by zipping persisted parent ids with the requests that produced
/// them. `children` yields the `(child, attribute)` pairs one request asks for.
pub fn pair_links<K, R, F, I>(parent_ids: &[K::Parent], requests: &[R], children: F) -> Result<Vec<AssociationLink<K>>>
where
    K: LinkKind,
    F: Fn(&R) -> I,
    I: IntoIterator<Item = (K::Child, K::Attribute)>,
{
    if parent_ids.len() != requests.len() {
        return Err(Error::Internal {
            operation: format!(
                "pair {} links: {} parent ids for {} requests",
                K::TABLE,
                parent_ids.len(),
                requests.len()
            ),
        });
    }

    Ok(parent_ids
        .iter()
        .zip(requests)
        .flat_map(|(parent_id, request)| {
            children(request)
                .into_iter()
                .map(move |(child_id, attribute)| AssociationLink::new(*parent_id, child_id, attribute))
        })
        .collect())
}

/// Parent ids of `links`, in first-seen order
pub fn distinct_parents<K: LinkKind>(links: &[AssociationLink<K>]) -> Vec<K::Parent> {
    let mut seen = HashSet::new();
    links.iter().map(|link| link.parent_id).filter(|id| seen.insert(*id)).collect()
}

/// First value that appears twice, if any
pub fn first_duplicate<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    values.into_iter().find(|value| !seen.insert(*value))
}

/// Reject an empty batch before anything touches the store
pub fn ensure_not_empty<R>(requests: &[R], what: &str) -> Result<()> {
    if requests.is_empty() {
        return Err(Error::BadRequest {
            message: format!("At least one {what} is required"),
        });
    }
    Ok(())
}

/// Reject a blank or over-long text field
pub fn check_text(field: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} must not be blank"),
        });
    }
    check_length(field, Some(value), max_chars)
}

/// Reject an over-long optional text field
pub fn check_length(field: &str, value: Option<&str>, max_chars: usize) -> Result<()> {
    match value {
        Some(value) if value.chars().count() > max_chars => Err(Error::BadRequest {
            message: format!("{field} must be at most {max_chars} characters"),
        }),
        _ => Ok(()),
    }
}

/// Reject a time range whose start lies after its end
pub fn check_time_range(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(Error::BadRequest {
            message: format!("start {start} is after end {end}"),
        }),
        _ => Ok(()),
    }
}

/// Reject a batch naming the same record twice
pub fn check_unique_ids<I: Eq + Hash + Copy + Display>(ids: impl IntoIterator<Item = I>, what: &str) -> Result<()> {
    match first_duplicate(ids) {
        Some(id) => Err(Error::BadRequest {
            message: format!("{what} {id} appears more than once in the batch"),
        }),
        None => Ok(()),
    }
}

/// Turn a repository miss into a [`Error::NotFound`] for `resource`
pub fn or_not_found(resource: &'static str, id: impl Display) -> impl FnOnce(DbError) -> Error {
    move |error| match error {
        DbError::NotFound => Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    }
}

/// Comma-separated ids for error messages
pub fn join_ids<I: Display>(ids: &[I]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
