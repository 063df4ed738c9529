//! Server module containing the MbtiServer implementation

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::narrative::{NarrativeAugmenter, TextGenerator, create_generator};

pub mod router;

/// MCP server exposing the questionnaire tools
#[derive(Clone)]
pub struct MbtiServer {
    pub config: Arc<Config>,
    pub augmenter: Arc<NarrativeAugmenter>,
}

impl MbtiServer {
    /// Build with the narrative provider chosen by configuration
    pub fn new(config: Config) -> Result<Self> {
        let generator = create_generator(&config.narrative, &config.runtime)?;
        Ok(Self::with_generator(config, generator))
    }

    pub fn with_generator(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let augmenter = Arc::new(NarrativeAugmenter::from_config(generator, &config.narrative));
        Self {
            config: Arc::new(config),
            augmenter,
        }
    }
}
