use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A trip -- the owner of an ordered sequence of waypoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_position: String,
    pub end_position: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted place. Coordinates of `0.0` mean "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub site_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw `locations` row. Coordinates are stored as text and only become
/// numbers through [`Location::from`].
#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub site_url: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        let latitude = parse_coordinate(row.latitude.as_deref());
        let longitude = parse_coordinate(row.longitude.as_deref());
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            site_url: row.site_url,
            latitude,
            longitude,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// Join row placing a location at a 1-based position within a trip.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripLocation {
    pub trip_id: Uuid,
    pub location_id: Uuid,
    pub position: i32,
}

/// A trip together with its waypoints in position order.
#[derive(Debug, Clone, Serialize)]
pub struct TripWithLocations {
    #[serde(flatten)]
    pub trip: Trip,
    pub locations: Vec<Location>,
}

// ---------------------------------------------------------------------------
// Insert payloads
// ---------------------------------------------------------------------------

/// Fields supplied by the caller when creating a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrip {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_position: String,
    #[serde(default)]
    pub end_position: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Fields supplied by the caller for one waypoint of a trip being saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a stored coordinate. Missing, blank, non-numeric and non-finite
/// values all read as `0.0`.
pub fn parse_coordinate(raw: Option<&str>) -> f64 {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0.0;
    };
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(value = text, "malformed stored coordinate, using 0.0");
            0.0
        }
    }
}

/// Collapse empty optional text to `None` so the store sees NULL rather than
/// an empty-string sentinel.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
