//! Repositories, one per table or link table.

pub mod associations;
pub mod diet_foods;
pub mod diet_records;
pub mod exercise_records;
pub mod exercise_types;
pub mod health_data;
pub mod health_goals;
pub mod health_profiles;
pub mod repository;
pub mod users;

pub use associations::{Associations, LinkStore};
pub use diet_foods::DietFoods;
pub use diet_records::DietRecords;
pub use exercise_records::ExerciseRecords;
pub use exercise_types::ExerciseTypes;
pub use health_data::HealthData;
pub use health_goals::HealthGoals;
pub use health_profiles::HealthProfiles;
pub use repository::Repository;
pub use users::Users;

/// Case-insensitive substring pattern for `LOWER(column) LIKE .. ESCAPE '\'`, with the LIKE
/// wildcards in `search` matched literally.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
