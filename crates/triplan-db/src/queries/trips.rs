//! Database query functions for the `trips` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{NewTrip, Trip, non_empty};

/// Insert a new trip row. Returns the inserted trip with server-generated
/// defaults (id, created_at, updated_at).
pub async fn insert_trip<'e, E>(executor: E, new: &NewTrip) -> Result<Trip>
where
    E: PgExecutor<'e>,
{
    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (user_id, name, description, start_position, end_position, start_date, end_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(&new.user_id)
    .bind(&new.name)
    .bind(non_empty(new.description.as_deref()))
    .bind(&new.start_position)
    .bind(&new.end_position)
    .bind(new.start_date)
    .bind(new.end_date)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert trip {:?}", new.name))?;

    Ok(trip)
}

/// Fetch a trip by its ID.
pub async fn get_trip<'e, E>(executor: E, id: Uuid) -> Result<Option<Trip>>
where
    E: PgExecutor<'e>,
{
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch trip")?;

    Ok(trip)
}

/// List a user's trips, newest first.
pub async fn list_trips_for_user<'e, E>(executor: E, user_id: &str) -> Result<Vec<Trip>>
where
    E: PgExecutor<'e>,
{
    let trips = sqlx::query_as::<_, Trip>(
        "SELECT * FROM trips WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list trips for user {user_id:?}"))?;

    Ok(trips)
}

/// Delete a trip row. Join rows go with it via `ON DELETE CASCADE`.
///
/// Returns `false` when no trip with that ID existed.
pub async fn delete_trip<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM trips WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .context("failed to delete trip")?;

    Ok(result.rows_affected() > 0)
}
