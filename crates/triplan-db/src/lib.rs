//! Storage layer for trips and their waypoints.
//!
//! Owns the PostgreSQL schema (embedded migrations), the row models, and
//! single-statement query functions. Multi-statement operations are composed
//! into transactions by `triplan-core`.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
