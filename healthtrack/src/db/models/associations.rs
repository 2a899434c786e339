//! Typed many-to-many links between parent records and child reference entities.
//!
//! Each association table gets one [`LinkKind`] marker type naming its table, key columns and
//! the scalar attribute the link carries (if any). Links are therefore checked at compile time:
//! an [`AssociationLink<DietRecordFoods>`] can only ever pair a diet record with a food and a
//! quantity.

use rust_decimal::Decimal;
use sqlx::{Postgres, Row, postgres::PgRow, query_builder::Separated};
use std::fmt;

use crate::types::{DietRecordId, EntityId, ExerciseRecordId, ExerciseTypeId, FoodId, HealthGoalId};

/// Scalar payload stored alongside a link.
pub trait LinkAttribute: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Bind the attribute as the trailing value(s) of one inserted row.
    fn push_bind<'qb, 'args>(&self, row: &mut Separated<'qb, 'args, Postgres, &'static str>);

    /// Read the attribute back from a link row.
    fn from_row(row: &PgRow, column: Option<&str>) -> Result<Self, sqlx::Error>;
}

/// Links without an attribute
impl LinkAttribute for () {
    fn push_bind<'qb, 'args>(&self, _row: &mut Separated<'qb, 'args, Postgres, &'static str>) {}

    fn from_row(_row: &PgRow, _column: Option<&str>) -> Result<Self, sqlx::Error> {
        Ok(())
    }
}

/// Quantity-carrying links
impl LinkAttribute for Decimal {
    fn push_bind<'qb, 'args>(&self, row: &mut Separated<'qb, 'args, Postgres, &'static str>) {
        row.push_bind(*self);
    }

    fn from_row(row: &PgRow, column: Option<&str>) -> Result<Self, sqlx::Error> {
        let column = column.ok_or_else(|| sqlx::Error::ColumnNotFound("attribute".to_string()))?;
        row.try_get(column)
    }
}

/// One association table.
pub trait LinkKind: Send + Sync + 'static {
    type Parent: EntityId;
    type Child: EntityId;
    type Attribute: LinkAttribute;

    /// Table name, also used to name the association in errors and spans
    const TABLE: &'static str;
    const PARENT_COLUMN: &'static str;
    const CHILD_COLUMN: &'static str;
    /// Column holding [`LinkKind::Attribute`], `None` when the link carries nothing
    const ATTRIBUTE_COLUMN: Option<&'static str>;
}

/// A single `(parent, child)` link.
pub struct AssociationLink<K: LinkKind> {
    pub parent_id: K::Parent,
    pub child_id: K::Child,
    pub attribute: K::Attribute,
}

impl<K: LinkKind> AssociationLink<K> {
    pub fn new(parent_id: K::Parent, child_id: K::Child, attribute: K::Attribute) -> Self {
        Self {
            parent_id,
            child_id,
            attribute,
        }
    }
}

impl<K: LinkKind<Attribute = ()>> AssociationLink<K> {
    /// Link without an attribute
    pub fn between(parent_id: K::Parent, child_id: K::Child) -> Self {
        Self::new(parent_id, child_id, ())
    }
}

// Manual impls: derives would put bounds on the marker type instead of its associated types
impl<K: LinkKind> Clone for AssociationLink<K> {
    fn clone(&self) -> Self {
        Self::new(self.parent_id, self.child_id, self.attribute.clone())
    }
}

impl<K: LinkKind> PartialEq for AssociationLink<K> {
    fn eq(&self, other: &Self) -> bool {
        self.parent_id == other.parent_id && self.child_id == other.child_id && self.attribute == other.attribute
    }
}

impl<K: LinkKind> fmt::Debug for AssociationLink<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::TABLE)
            .field("parent_id", &self.parent_id)
            .field("child_id", &self.child_id)
            .field("attribute", &self.attribute)
            .finish()
    }
}

/// Diet record ↔ food, carrying the consumed quantity in grams
#[derive(Debug, Clone, Copy)]
pub struct DietRecordFoods;

impl LinkKind for DietRecordFoods {
    type Parent = DietRecordId;
    type Child = FoodId;
    type Attribute = Decimal;

    const TABLE: &'static str = "diet_records_foods";
    const PARENT_COLUMN: &'static str = "diet_record_id";
    const CHILD_COLUMN: &'static str = "food_id";
    const ATTRIBUTE_COLUMN: Option<&'static str> = Some("quantity");
}

/// Exercise record ↔ exercise type
#[derive(Debug, Clone, Copy)]
pub struct ExerciseRecordTypes;

impl LinkKind for ExerciseRecordTypes {
    type Parent = ExerciseRecordId;
    type Child = ExerciseTypeId;
    type Attribute = ();

    const TABLE: &'static str = "exercise_records_types";
    const PARENT_COLUMN: &'static str = "exercise_record_id";
    const CHILD_COLUMN: &'static str = "exercise_type_id";
    const ATTRIBUTE_COLUMN: Option<&'static str> = None;
}

/// Health goal ↔ exercise type
#[derive(Debug, Clone, Copy)]
pub struct HealthGoalExerciseTypes;

impl LinkKind for HealthGoalExerciseTypes {
    type Parent = HealthGoalId;
    type Child = ExerciseTypeId;
    type Attribute = ();

    const TABLE: &'static str = "health_goals_exercise_types";
    const PARENT_COLUMN: &'static str = "health_goal_id";
    const CHILD_COLUMN: &'static str = "exercise_type_id";
    const ATTRIBUTE_COLUMN: Option<&'static str> = None;
}
