use std::sync::Arc;

use atlas_observer::AtlasMetrics;

/// Shared state behind the HTTP surface.
pub struct AppState {
    /// Environment label reported by `/healthz`.
    pub env: String,
    pub metrics: Arc<AtlasMetrics>,
}
