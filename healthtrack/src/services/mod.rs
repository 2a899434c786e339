//! Core components and the per-domain services built on them.

pub mod aggregation;
pub mod associations;
pub mod batch;
pub mod body_metrics;
pub mod pagination;

pub mod diet_records;
pub mod exercise_records;
pub mod health_data;
pub mod health_goals;
pub mod health_profiles;
pub mod reference_data;

pub use diet_records::DietRecordsService;
pub use exercise_records::ExerciseRecordsService;
pub use health_data::HealthDataService;
pub use health_goals::HealthGoalsService;
pub use health_profiles::HealthProfilesService;
pub use reference_data::ReferenceDataService;
