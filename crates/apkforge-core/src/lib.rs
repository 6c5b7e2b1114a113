//! apkforge core - APK decompile/recompile pipeline
//!
//! Drives external tools through a fixed sequence:
//! - `apktool d` to decompile an APK for editing
//! - `apktool b` → `zipalign` → `apksigner` to rebuild, align and sign it
//! - `keytool` when a fresh keystore is needed
//!
//! All tool calls go through [`ToolRunner`] and all user input through
//! [`PromptProvider`], both carried by an explicit [`PipelineContext`].

pub mod artifact;
pub mod config;
pub mod context;
pub mod error;
pub mod fakes;
pub mod keystore;
pub mod pipeline;
pub mod prompt;
pub mod runner;
pub mod stage;
pub mod telemetry;
pub mod tool;
pub mod validate;

// Re-export key types
pub use artifact::{derive_output_path, ArtifactStage};
pub use config::ToolConfig;
pub use context::PipelineContext;
pub use error::{PipelineError, Result};
pub use keystore::{DistinguishedName, KeystoreConfig, KeystoreManager, SignedArtifact};
pub use pipeline::{Outcome, Pipeline, PipelineResult, SignOutcome, StageRecord};
pub use prompt::{PromptProvider, Secret};
pub use runner::{ProcessRunner, ToolOutput, ToolRunner};
pub use stage::{Action, PipelineStage, SignChoice};
pub use telemetry::{init_tracing, open_run_log};
pub use tool::ToolInvocation;
