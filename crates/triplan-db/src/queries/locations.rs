//! Database query functions for the `locations` and `trip_locations` tables.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Location, LocationRow, NewLocation, TripLocation, non_empty};

/// Insert a location row. Coordinates are written in their text form.
pub async fn insert_location<'e, E>(executor: E, new: &NewLocation) -> Result<Location>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, LocationRow>(
        "INSERT INTO locations (name, address, site_url, latitude, longitude, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(&new.name)
    .bind(non_empty(new.address.as_deref()))
    .bind(non_empty(new.site_url.as_deref()))
    .bind(new.latitude.to_string())
    .bind(new.longitude.to_string())
    .bind(non_empty(new.notes.as_deref()))
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert location {:?}", new.name))?;

    Ok(row.into())
}

/// Place a location at `position` (1-based) within a trip.
pub async fn link_trip_location<'e, E>(
    executor: E,
    trip_id: Uuid,
    location_id: Uuid,
    position: i32,
) -> Result<TripLocation>
where
    E: PgExecutor<'e>,
{
    let link = sqlx::query_as::<_, TripLocation>(
        "INSERT INTO trip_locations (trip_id, location_id, position) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(location_id)
    .bind(position)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to link location {location_id} to trip {trip_id}"))?;

    Ok(link)
}

/// Get the locations of a trip in itinerary (position) order.
pub async fn get_locations_for_trip<'e, E>(executor: E, trip_id: Uuid) -> Result<Vec<Location>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT l.* FROM locations l \
         JOIN trip_locations tl ON tl.location_id = l.id \
         WHERE tl.trip_id = $1 \
         ORDER BY tl.position",
    )
    .bind(trip_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to get locations for trip {trip_id}"))?;

    Ok(rows.into_iter().map(Location::from).collect())
}

/// Get the join rows of a trip in position order.
pub async fn get_trip_links<'e, E>(executor: E, trip_id: Uuid) -> Result<Vec<TripLocation>>
where
    E: PgExecutor<'e>,
{
    let links = sqlx::query_as::<_, TripLocation>(
        "SELECT * FROM trip_locations WHERE trip_id = $1 ORDER BY position",
    )
    .bind(trip_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to get links for trip {trip_id}"))?;

    Ok(links)
}

/// Delete those of `ids` that no trip links to any more.
///
/// Returns the number of locations removed.
pub async fn delete_unlinked_locations<'e, E>(executor: E, ids: &[Uuid]) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM locations l \
         WHERE l.id = ANY($1) \
           AND NOT EXISTS ( \
               SELECT 1 FROM trip_locations tl WHERE tl.location_id = l.id \
           )",
    )
    .bind(ids)
    .execute(executor)
    .await
    .context("failed to delete unlinked locations")?;

    Ok(result.rows_affected())
}
