//! Query functions, one module per table group.
//!
//! Functions that only run a single statement are generic over
//! [`sqlx::PgExecutor`] so the same call works against the pool or inside a
//! transaction (`&mut *tx`).

pub mod locations;
pub mod trips;
