//! Application state: prompts, generation settings, and the completion service.
//!
//! Everything here is read-only after startup. Per-user state lives in the
//! caller-owned `Session` record, never in the server.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::completion::CompletionService;
use crate::config::{load_tutor_config_from_env, GenerationSettings, Prompts};
use crate::error::AppError;
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub completion: Option<Arc<dyn CompletionService>>,
    pub prompts: Prompts,
    pub settings: GenerationSettings,
}

impl AppState {
    /// Build state from env: load config, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let cfg = load_tutor_config_from_env().unwrap_or_default();

        let completion: Option<Arc<dyn CompletionService>> = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "lc_maths_tutor", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                warn!(target: "lc_maths_tutor", "OpenAI disabled (no OPENAI_API_KEY). Generation endpoints will answer 503.");
                None
            }
        };

        info!(
            target: "lc_maths_tutor",
            markup = ?cfg.generation.markup,
            strip_ordinals = cfg.generation.strip_ordinals,
            curriculum = %cfg.generation.curriculum,
            "Generation settings"
        );

        Self::new(completion, cfg.prompts, cfg.generation)
    }

    pub fn new(
        completion: Option<Arc<dyn CompletionService>>,
        prompts: Prompts,
        settings: GenerationSettings,
    ) -> Self {
        Self { completion, prompts, settings }
    }

    pub fn completion(&self) -> Result<&dyn CompletionService, AppError> {
        self.completion.as_deref().ok_or(AppError::Unavailable)
    }
}
