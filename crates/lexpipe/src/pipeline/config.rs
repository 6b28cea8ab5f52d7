use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

use super::stage::StagePolicies;

pub struct PipelineConfig {
    pub output_directory: PathBuf,
    pub stage_timeout: Option<Duration>,
    pub run_deadline: Option<Duration>,
    pub policies: StagePolicies,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_directory: PathBuf::from(&config.output_directory),
            stage_timeout: config.stage_timeout(),
            run_deadline: config.run_deadline(),
            policies: config.policies(),
        }
    }
}
