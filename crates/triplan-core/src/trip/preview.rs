//! Previewing a trip: ask the planner, then extract a daily plan.

use serde::Serialize;
use tracing::{info, warn};

use crate::itinerary::extract::parse_start_date;
use crate::itinerary::{DayPlan, Extractor, ItinerarySource};
use crate::planner::{PlanRequest, TripPlanner, TripSummary, structured_days};

use super::TripError;

/// Outbound preview: the trip echo plus the extracted days.
#[derive(Debug, Clone, Serialize)]
pub struct TripPreview {
    pub trip: TripSummary,
    pub daily_plan: Vec<DayPlan>,
    pub source: ItinerarySource,
    /// Skipped day headers, one message each.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Generate a plan for `request` and turn it into a daily itinerary.
///
/// A planner failure (including timeout) is returned as
/// [`TripError::UpstreamUnavailable`] without attempting extraction. A
/// missing trip echo is replaced by one built from the request. Structured
/// days the planner could not date are dropped; if none remain, the route
/// summary is parsed instead.
pub async fn preview_trip(
    planner: &dyn TripPlanner,
    extractor: &Extractor,
    request: &PlanRequest,
) -> Result<TripPreview, TripError> {
    let response = planner.generate(request).await.inspect_err(|err| {
        warn!(planner = planner.name(), user_id = %request.user_id, error = %err, "plan generation failed");
    })?;

    let structured = structured_days(&response.daily_plan, parse_start_date(&request.start_date).ok());
    let itinerary = extractor.extract(structured, response.route_summary(), &request.start_date)?;

    let trip = response
        .trip
        .unwrap_or_else(|| TripSummary::from(request));

    info!(
        user_id = %request.user_id,
        source = %itinerary.source,
        count = itinerary.days.len(),
        "trip previewed"
    );
    Ok(TripPreview {
        trip,
        daily_plan: itinerary.days,
        source: itinerary.source,
        warnings: itinerary
            .malformed_headers
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}
