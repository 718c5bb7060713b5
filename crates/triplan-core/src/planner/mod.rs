//! The upstream plan generator and its wire types.
//!
//! A [`TripPlanner`] takes a [`PlanRequest`] and answers with a
//! [`PlanResponse`]: a trip echo carrying a free-text route summary, plus an
//! optional structured daily plan. [`HttpTripPlanner`] is the production
//! implementation; tests substitute their own.

pub mod http;
pub mod trait_def;

use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::itinerary::extract::DATE_FORMAT;
use crate::itinerary::{DayPlan, UNSPECIFIED_PLACE};

pub use http::{DEFAULT_TIMEOUT, HttpTripPlanner};
pub use trait_def::TripPlanner;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("planner did not answer within {0:?}")]
    Timeout(Duration),

    #[error("planner request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("planner returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("planner response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

/// What the caller asks the planner to plan. Dates stay as the caller sent
/// them; only the extractor interprets `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_position: String,
    #[serde(default)]
    pub end_position: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub trip: Option<TripSummary>,
    #[serde(default)]
    pub daily_plan: Vec<UpstreamDayPlan>,
}

impl PlanResponse {
    pub fn route_summary(&self) -> Option<&str> {
        self.trip.as_ref().map(|t| t.route_summary.as_str())
    }
}

/// The trip as echoed back by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripSummary {
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub start_position: String,
    pub end_position: String,
    pub start_date: String,
    pub end_date: String,
    pub total_days: u32,
    pub route_summary: String,
}

impl From<&PlanRequest> for TripSummary {
    fn from(req: &PlanRequest) -> Self {
        Self {
            user_id: req.user_id.clone(),
            name: req.name.clone(),
            description: req.description.clone(),
            start_position: req.start_position.clone(),
            end_position: req.end_position.clone(),
            start_date: req.start_date.clone(),
            end_date: req.end_date.clone(),
            total_days: 0,
            route_summary: String::new(),
        }
    }
}

/// One structured day from the planner. `date` is kept as sent; it is only
/// interpreted when the day is turned into a [`DayPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamDayPlan {
    pub day: u32,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: Option<UpstreamLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamLocation {
    pub name: String,
    pub address: String,
    pub site_url: String,
    pub notes: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl UpstreamDayPlan {
    /// Convert to a [`DayPlan`].
    ///
    /// A `date` that is not `YYYY-MM-DD` is replaced by
    /// `start_date + (day - 1)`; without a usable start date the day is
    /// dropped. A missing or blank place name becomes [`UNSPECIFIED_PLACE`].
    pub fn to_day_plan(&self, start_date: Option<NaiveDate>) -> Option<DayPlan> {
        let date = match NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                let derived = start_date.zip(self.day.checked_sub(1)).and_then(|(start, offset)| {
                    start.checked_add_days(Days::new(u64::from(offset)))
                });
                let Some(derived) = derived else {
                    warn!(day = self.day, date = %self.date, "dropping planner day without a usable date");
                    return None;
                };
                debug!(day = self.day, date = %self.date, %derived, "planner date replaced");
                derived
            }
        };

        let loc = self.location.clone().unwrap_or_default();
        let location_name = if loc.name.trim().is_empty() {
            UNSPECIFIED_PLACE.to_owned()
        } else {
            loc.name
        };
        let site_url = Some(loc.site_url).filter(|s| !s.trim().is_empty());
        Some(DayPlan {
            day: self.day,
            date,
            location_name,
            address_hint: loc.address,
            details: loc.notes.clone(),
            notes: loc.notes,
            site_url,
            latitude: loc.latitude,
            longitude: loc.longitude,
        })
    }
}

/// Structured days usable as an itinerary, in the order the planner sent them.
pub fn structured_days(plans: &[UpstreamDayPlan], start_date: Option<NaiveDate>) -> Vec<DayPlan> {
    plans.iter().filter_map(|plan| plan.to_day_plan(start_date)).collect()
}
