//! The `TripPlanner` trait -- the seam to whatever generates trip plans.

use async_trait::async_trait;

use super::{PlanRequest, PlanResponse, UpstreamError};

/// Generates a plan for a requested trip.
///
/// Object-safe, so the server can hold an `Arc<dyn TripPlanner>` and tests
/// can swap in a canned implementation.
#[async_trait]
pub trait TripPlanner: Send + Sync {
    /// Short name used in logs (e.g. "http").
    fn name(&self) -> &str;

    /// Ask for a plan. Implementations bound their own latency and report
    /// expiry as [`UpstreamError::Timeout`].
    async fn generate(&self, request: &PlanRequest) -> Result<PlanResponse, UpstreamError>;
}

// Compile-time assertion: TripPlanner must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TripPlanner) {}
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::TripSummary;

    struct EchoPlanner;

    #[async_trait]
    impl TripPlanner for EchoPlanner {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &PlanRequest) -> Result<PlanResponse, UpstreamError> {
            Ok(PlanResponse {
                trip: Some(TripSummary::from(request)),
                daily_plan: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let planner: Box<dyn TripPlanner> = Box::new(EchoPlanner);
        assert_eq!(planner.name(), "echo");

        let req = PlanRequest {
            user_id: "u1".to_string(),
            name: "Trip".to_string(),
            description: String::new(),
            start_position: String::new(),
            end_position: String::new(),
            start_date: "2025-08-13".to_string(),
            end_date: "2025-08-14".to_string(),
        };
        let resp = planner.generate(&req).await.unwrap();
        assert_eq!(resp.trip.unwrap().name, "Trip");
    }
}
