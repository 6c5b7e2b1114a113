//! Explicit run context handed to every stage.

use crate::config::ToolConfig;
use crate::error::Result;
use crate::prompt::PromptProvider;
use crate::runner::{ProcessRunner, ToolRunner};
use std::path::Path;
use std::sync::Arc;

/// Everything a stage needs: read-only tool configuration plus the runner and
/// prompt capabilities. Built once by the caller.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: ToolConfig,
    pub runner: Arc<dyn ToolRunner>,
    pub prompts: Arc<dyn PromptProvider>,
}

impl PipelineContext {
    pub fn new(
        config: ToolConfig,
        runner: Arc<dyn ToolRunner>,
        prompts: Arc<dyn PromptProvider>,
    ) -> Self {
        Self {
            config,
            runner,
            prompts,
        }
    }

    /// Context that spawns real processes, honouring the configured timeout.
    pub fn with_process_runner(config: ToolConfig, prompts: Arc<dyn PromptProvider>) -> Self {
        let runner = Arc::new(ProcessRunner::new(config.timeout_secs));
        Self::new(config, runner, prompts)
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Create the output directory if it is missing. Existing content is kept.
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(self.output_dir())?;
        Ok(())
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
