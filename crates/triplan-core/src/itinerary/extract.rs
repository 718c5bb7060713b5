//! The extraction policy: structured plans, then parsed text, then fallback.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::DayPlan;
use super::fallback::fallback_itinerary;
use super::segment::{MalformedDayHeader, Segmenter};

/// Format of the anchor date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("start date {value:?} is not a YYYY-MM-DD calendar date")]
    DateParseFailure { value: String },
}

/// Which rule produced an itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItinerarySource {
    Structured,
    Parsed,
    Fallback,
}

impl std::fmt::Display for ItinerarySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Structured => "structured",
            Self::Parsed => "parsed",
            Self::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub source: ItinerarySource,
    pub days: Vec<DayPlan>,
    /// Headers skipped while parsing; empty for other sources.
    pub malformed_headers: Vec<MalformedDayHeader>,
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    segmenter: Segmenter,
}

impl Extractor {
    pub fn new(segmenter: Segmenter) -> Self {
        Self { segmenter }
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Produce a non-empty itinerary.
    ///
    /// 1. Non-empty `structured` plans are returned as-is.
    /// 2. Otherwise `start_date` must parse, or `DateParseFailure` is
    ///    returned and nothing else runs.
    /// 3. A non-blank `route_summary` is segmented; any resulting days are
    ///    sorted by day number with later duplicates dropped.
    /// 4. If that yields nothing, the fallback itinerary is used.
    pub fn extract(
        &self,
        structured: Vec<DayPlan>,
        route_summary: Option<&str>,
        start_date: &str,
    ) -> Result<Itinerary, ExtractError> {
        if !structured.is_empty() {
            info!(source = %ItinerarySource::Structured, count = structured.len(), "itinerary extracted");
            return Ok(Itinerary {
                source: ItinerarySource::Structured,
                days: structured,
                malformed_headers: Vec::new(),
            });
        }

        let anchor = parse_start_date(start_date)?;

        let mut malformed_headers = Vec::new();
        if let Some(text) = route_summary.filter(|t| !t.trim().is_empty()) {
            let (days, skipped) = self.segmenter.segment(text, anchor).collect_with_warnings();
            malformed_headers = skipped;
            let days = normalize(days);
            if !days.is_empty() {
                info!(source = %ItinerarySource::Parsed, count = days.len(), "itinerary extracted");
                return Ok(Itinerary {
                    source: ItinerarySource::Parsed,
                    days,
                    malformed_headers,
                });
            }
        }

        let days = fallback_itinerary(anchor);
        info!(source = %ItinerarySource::Fallback, count = days.len(), "itinerary extracted");
        Ok(Itinerary {
            source: ItinerarySource::Fallback,
            days,
            malformed_headers,
        })
    }
}

/// Parse an anchor date in `YYYY-MM-DD` form, tolerating surrounding space.
pub fn parse_start_date(value: &str) -> Result<NaiveDate, ExtractError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ExtractError::DateParseFailure {
            value: value.to_owned(),
        }
    })
}

/// Order days by number and keep the first block seen for each number.
fn normalize(mut days: Vec<DayPlan>) -> Vec<DayPlan> {
    days.sort_by_key(|plan| plan.day);
    let mut seen = HashSet::new();
    days.retain(|plan| {
        let first = seen.insert(plan.day);
        if !first {
            warn!(day = plan.day, "dropping duplicate day block");
        }
        first
    });
    days
}
