//! Database layer: row models, repositories and error mapping.
//!
//! Repositories borrow a `&mut PgConnection`, so the same repository runs on a pooled
//! connection or inside a transaction:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let record = DietRecords::new(&mut tx).create(&request).await?;
//! tx.commit().await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
