//! Trip persistence.
//!
//! Every write runs inside a single transaction begun with `pool.begin()`.
//! Each step propagates with `?` and commit is the last statement, so any
//! early return drops the transaction and rolls it back: a trip is either
//! stored with all its waypoints or not at all.

use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use triplan_db::models::{NewLocation, NewTrip, Trip, TripWithLocations};
use triplan_db::queries::{locations as location_queries, trips as trip_queries};

use super::TripError;

/// Store a trip and its ordered waypoints.
///
/// Waypoint `i` of `locations` is linked at position `i + 1`. If any insert
/// fails (for example a waypoint with an empty name), nothing is stored.
pub async fn save_trip_with_locations(
    pool: &PgPool,
    new_trip: &NewTrip,
    locations: &[NewLocation],
) -> Result<TripWithLocations, TripError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    // 1. Trip row.
    let trip = trip_queries::insert_trip(&mut *tx, new_trip).await?;

    // 2. One location row and one join row per waypoint.
    let mut saved = Vec::with_capacity(locations.len());
    for (idx, new_loc) in locations.iter().enumerate() {
        let position = i32::try_from(idx + 1).context("too many waypoints")?;
        let location = location_queries::insert_location(&mut *tx, new_loc)
            .await
            .with_context(|| format!("waypoint {position}"))?;
        location_queries::link_trip_location(&mut *tx, trip.id, location.id, position).await?;
        debug!(trip_id = %trip.id, position, name = %location.name, "waypoint linked");
        saved.push(location);
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(trip_id = %trip.id, user_id = %trip.user_id, count = saved.len(), "trip saved");
    Ok(TripWithLocations {
        trip,
        locations: saved,
    })
}

/// Load a trip with its waypoints in position order.
pub async fn get_trip_with_locations(pool: &PgPool, id: Uuid) -> Result<TripWithLocations, TripError> {
    let trip = trip_queries::get_trip(pool, id)
        .await?
        .ok_or(TripError::NotFound(id))?;
    with_locations(pool, trip).await
}

/// All trips of a user, newest first, each with its waypoints.
pub async fn list_user_trips(pool: &PgPool, user_id: &str) -> Result<Vec<TripWithLocations>, TripError> {
    let trips = trip_queries::list_trips_for_user(pool, user_id).await?;
    let mut out = Vec::with_capacity(trips.len());
    for trip in trips {
        out.push(with_locations(pool, trip).await?);
    }
    debug!(user_id, count = out.len(), "listed trips");
    Ok(out)
}

/// Delete a trip, its join rows, and every waypoint no other trip uses.
pub async fn delete_trip(pool: &PgPool, id: Uuid) -> Result<(), TripError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    // 1. Remember the trip's locations before the cascade removes the links.
    let location_ids: Vec<Uuid> = location_queries::get_trip_links(&mut *tx, id)
        .await?
        .into_iter()
        .map(|link| link.location_id)
        .collect();

    // 2. Trip row; join rows go with it.
    if !trip_queries::delete_trip(&mut *tx, id).await? {
        return Err(TripError::NotFound(id));
    }

    // 3. Orphaned locations.
    let removed = location_queries::delete_unlinked_locations(&mut *tx, &location_ids).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(trip_id = %id, locations_removed = removed, "trip deleted");
    Ok(())
}

async fn with_locations(pool: &PgPool, trip: Trip) -> Result<TripWithLocations, TripError> {
    let locations = location_queries::get_locations_for_trip(pool, trip.id).await?;
    Ok(TripWithLocations { trip, locations })
}
