//! Itinerary extraction: turning planner output into dated, ordered days.
//!
//! - [`segment`] splits a free-text route summary into day blocks.
//! - [`infer`] guesses a place and address hint from block text.
//! - [`fallback`] produces a deterministic itinerary when nothing parses.
//! - [`extract`] applies the structured > parsed > fallback policy.

pub mod extract;
pub mod fallback;
pub mod infer;
pub mod segment;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use triplan_db::models::NewLocation;

pub use extract::{ExtractError, Extractor, Itinerary, ItinerarySource};
pub use fallback::{FALLBACK_MAX_DAYS, fallback_itinerary};
pub use infer::{PlaceGuess, PlaceRule, PlaceTable, UNSPECIFIED_PLACE};
pub use segment::{DayBlocks, HeaderPattern, HeaderPatternError, MalformedDayHeader, Segmenter};

/// One day of an itinerary. Never persisted directly; saving turns it into a
/// location row plus a join row (see [`waypoints`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub date: NaiveDate,
    #[serde(rename = "name")]
    pub location_name: String,
    #[serde(rename = "address")]
    pub address_hint: String,
    pub details: String,
    pub notes: String,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl From<&DayPlan> for NewLocation {
    fn from(plan: &DayPlan) -> Self {
        let text = |s: &str| Some(s.to_owned()).filter(|s| !s.trim().is_empty());
        Self {
            name: plan.location_name.clone(),
            address: text(&plan.address_hint),
            site_url: plan.site_url.clone(),
            latitude: plan.latitude,
            longitude: plan.longitude,
            notes: text(&plan.notes),
        }
    }
}

/// Translate an itinerary into the ordered waypoints a trip is saved with.
pub fn waypoints(days: &[DayPlan]) -> Vec<NewLocation> {
    days.iter().map(NewLocation::from).collect()
}
