//! Common type definitions.
//!
//! Every table uses a `BIGINT` identity column. Each entity gets its own transparent newtype
//! so a food id can never be passed where an exercise type id is expected, while still
//! encoding to and decoding from Postgres as a plain `BIGINT`.
//!
//! - [`UserId`]: owning user of every parent record
//! - [`FoodId`], [`ExerciseTypeId`]: child reference entities
//! - [`DietRecordId`], [`ExerciseRecordId`], [`HealthGoalId`], [`HealthDataId`]: parent records
//! - [`HealthProfileId`]: the single health profile a user may keep

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common bounds of every entity identifier.
///
/// Association links and paginated queries are generic over this, and convert to the raw
/// `i64` when binding `= ANY($1)` arrays.
pub trait EntityId: Copy + Eq + Ord + std::hash::Hash + fmt::Debug + fmt::Display + From<i64> + Send + Sync + 'static {
    fn get(self) -> i64;
}

macro_rules! entity_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
            #[serde(transparent)]
            #[sqlx(transparent)]
            pub struct $name(pub i64);

            impl EntityId for $name {
                fn get(self) -> i64 {
                    self.0
                }
            }

            impl From<i64> for $name {
                fn from(id: i64) -> Self {
                    Self(id)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

entity_id!(
    /// User account identifier
    UserId,
    /// Food (diet reference entity) identifier
    FoodId,
    /// Exercise type identifier
    ExerciseTypeId,
    /// Diet record identifier
    DietRecordId,
    /// Exercise record identifier
    ExerciseRecordId,
    /// Health goal identifier
    HealthGoalId,
    /// Health data (body measurement) identifier
    HealthDataId,
    /// Health profile identifier
    HealthProfileId,
);

/// Collect raw ids for binding as a Postgres array.
pub fn raw_ids<I: EntityId>(ids: &[I]) -> Vec<i64> {
    ids.iter().map(|id| id.get()).collect()
}
