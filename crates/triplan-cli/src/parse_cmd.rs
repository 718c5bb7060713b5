use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use triplan_core::itinerary::{DayPlan, Extractor, ItinerarySource};

#[derive(Debug, Serialize)]
pub struct ParseOutput {
    pub source: ItinerarySource,
    pub daily_plan: Vec<DayPlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Run the extractor over a route summary held in `text`.
pub fn parse_summary(extractor: &Extractor, text: &str, start_date: &str) -> Result<ParseOutput> {
    let itinerary = extractor.extract(Vec::new(), Some(text), start_date)?;
    Ok(ParseOutput {
        source: itinerary.source,
        daily_plan: itinerary.days,
        warnings: itinerary
            .malformed_headers
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// Execute `triplan parse`: print the daily plan extracted from a file.
pub fn run_parse(extractor: &Extractor, file: &Path, start_date: &str) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read route summary {}", file.display()))?;
    let output = parse_summary(extractor, &text, start_date)?;

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
