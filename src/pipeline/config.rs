use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::Params;
use crate::errors::PipelineError;

/// Post-processing pipeline configuration: an ordered list of steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub steps: Vec<StepConfig>,
}

/// One select → filter → act unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Target domain: info, styles, events or misc
    pub target: String,

    /// Select function name
    #[serde(default = "default_select")]
    pub select: String,

    /// Filters applied in order; a candidate must pass all of them
    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    /// Action function name
    pub action: String,

    /// Parameters passed to select and action
    #[serde(default)]
    pub params: Params,
}

/// A named filter with its own parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub name: String,

    #[serde(default)]
    pub params: Params,
}

fn default_select() -> String {
    "all".to_string()
}

impl PipelineConfig {
    /// Parse a JSON pipeline definition
    pub fn parse(content: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(content).map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    /// Load a JSON pipeline definition from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }
}
