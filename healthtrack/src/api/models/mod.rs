pub mod diet_foods;
pub mod diet_records;
pub mod exercise_records;
pub mod exercise_types;
pub mod health_data;
pub mod health_goals;
pub mod health_profiles;
pub mod pagination;
