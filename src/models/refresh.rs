use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a price refresh actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Upstream answered. `inserted` new points were written; `skipped` tracked
    /// assets already had today's point or were missing from the response.
    Updated { inserted: usize, skipped: usize },
    /// Seeding or the price fetch could not reach the upstream provider.
    UpstreamUnavailable,
    /// Nothing to refresh, even after seeding.
    NoAssetsTracked,
}

impl RefreshOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            RefreshOutcome::Updated { .. } => "updated",
            RefreshOutcome::UpstreamUnavailable => "upstream_unavailable",
            RefreshOutcome::NoAssetsTracked => "no_assets_tracked",
        }
    }

    pub fn inserted(&self) -> usize {
        match self {
            RefreshOutcome::Updated { inserted, .. } => *inserted,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePricesResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub inserted: usize,
}

impl From<RefreshOutcome> for UpdatePricesResponse {
    fn from(outcome: RefreshOutcome) -> Self {
        let message = match outcome {
            RefreshOutcome::Updated { inserted, skipped } => format!(
                "Crypto prices updated successfully ({} new, {} unchanged).",
                inserted, skipped
            ),
            RefreshOutcome::UpstreamUnavailable => {
                "Price provider unavailable; no prices were updated.".to_string()
            }
            RefreshOutcome::NoAssetsTracked => "No crypto assets are tracked yet.".to_string(),
        };

        // Upstream trouble is reported in `status`, never as a failed request.
        Self {
            success: true,
            status: outcome.status().to_string(),
            message,
            inserted: outcome.inserted(),
        }
    }
}
