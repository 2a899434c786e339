//! # healthtrack: persistence core for diet, exercise and body tracking
//!
//! `healthtrack` stores what a person eats, how they train, the goals they set and the body
//! measurements they take, in PostgreSQL. The HTTP surface is out of scope; the crate exposes
//! the services that such a surface would call.
//!
//! ## Building blocks
//!
//! Every domain is a parent record linked many-to-many to a reference entity: meals to foods
//! (with the eaten quantity), workouts and goals to exercise types. Four components carry the
//! shared behavior:
//!
//! - [`services::associations::AssociationSynchronizer`] makes a parent's stored links exactly
//!   equal to a requested set (delete, then insert) inside the caller's transaction.
//! - [`services::pagination::PaginatedAggregateQuery`] lists parents with their nested children
//!   from a joined window query, taking page metadata from a separate distinct-parent count.
//! - [`services::aggregation::WeightedSumAggregator`] totals per-100 g nutrient values scaled by
//!   eaten quantity, rounding half-up to two places.
//! - [`services::body_metrics::bmi`] derives body-mass index from height and weight.
//!
//! Alongside them, [`services::ReferenceDataService`] pages through the food and exercise type
//! catalogues and [`services::HealthProfilesService`] keeps each user's single health profile.
//!
//! Domain services in [`services`] open one transaction per batch and run repositories from
//! [`db::handlers`] on it, so a failure at any step leaves nothing behind.
//!
//! ## Configuration
//!
//! See [`config::Config`]: a YAML file overlaid with `HEALTHTRACK_`-prefixed environment
//! variables, plus the standard `DATABASE_URL`.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod services;
pub mod telemetry;
#[cfg(any(test, feature = "postgres-tests"))]
pub mod test_utils;
pub mod types;

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

pub use config::Config;

/// Get the healthtrack database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect a pool with the configured settings and bring the schema up to date.
pub async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let url = config
        .database_url()
        .context("No database url configured: set database.url or DATABASE_URL")?;
    let settings = &config.database.pool;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(settings.idle_timeout())
        .max_lifetime(settings.max_lifetime())
        .connect(url)
        .await
        .context("Failed to connect to the database")?;

    migrator().run(&pool).await.context("Failed to run migrations")?;
    info!("Database migrations applied");

    Ok(pool)
}
