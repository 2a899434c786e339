//! Request and response shapes exchanged with callers.

pub mod models;
