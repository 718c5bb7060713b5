//! Trip service: previewing plans and persisting trips with their waypoints.

pub mod preview;
pub mod service;

use thiserror::Error;
use uuid::Uuid;

use crate::itinerary::ExtractError;
use crate::planner::UpstreamError;

pub use preview::{TripPreview, preview_trip};
pub use service::{delete_trip, get_trip_with_locations, list_user_trips, save_trip_with_locations};

#[derive(Debug, Error)]
pub enum TripError {
    #[error("trip planner unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error(transparent)]
    DateParseFailure(#[from] ExtractError),

    /// Store failure. The transaction it happened in was rolled back.
    #[error("persistence failed: {0:#}")]
    PersistenceFailure(anyhow::Error),

    #[error("trip {0} not found")]
    NotFound(Uuid),
}

impl From<anyhow::Error> for TripError {
    fn from(err: anyhow::Error) -> Self {
        Self::PersistenceFailure(err)
    }
}
