//! Core of the trip planning service.
//!
//! - [`itinerary`] turns planner output into dated, ordered day plans.
//! - [`planner`] is the seam to the upstream plan generator.
//! - [`trip`] previews plans and persists trips atomically.

pub mod itinerary;
pub mod planner;
pub mod trip;
