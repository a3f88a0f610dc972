use serde::{Deserialize, Serialize};

use crate::magick::{MagickConfig, ProcessorConfig};
use crate::placer::PlacerConfig;
use crate::processor::PipelineConfig;

/// Top-level configuration.
///
/// Every section is optional; an empty file yields one ImageMagick
/// processor with default options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub magick: MagickConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub placer: PlacerConfig,

    /// ImageMagick processors, applied in order.
    #[serde(default = "default_processors")]
    pub processors: Vec<ProcessorConfig>,
}

fn default_processors() -> Vec<ProcessorConfig> {
    vec![ProcessorConfig::default()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            magick: MagickConfig::default(),
            pipeline: PipelineConfig::default(),
            placer: PlacerConfig::default(),
            processors: default_processors(),
        }
    }
}
