//! Shared application state

use std::sync::Arc;

use crate::db::Connector;
use crate::llm::Llm;
use crate::pipeline::QueryPipeline;

/// Pipeline with the model and connector behind trait objects
pub type SharedPipeline = QueryPipeline<Arc<dyn Llm>, Arc<dyn Connector>>;

/// Shared application state
///
/// Read-only after startup; each request builds its own database handle.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SharedPipeline>,
    /// Model name, for the health endpoint
    pub model: String,
    /// Whether a provider API key was configured at startup
    pub provider_configured: bool,
}

impl AppState {
    /// Create new app state
    pub fn new(llm: Arc<dyn Llm>, connector: Arc<dyn Connector>, provider_configured: bool) -> Self {
        let model = llm.model().to_string();
        Self {
            pipeline: Arc::new(QueryPipeline::new(llm, connector)),
            model,
            provider_configured,
        }
    }
}
