//! Error types for the APK pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input file, directory, keystore or tool is missing
    #[error("{} Path does not exist.", path.display())]
    PathNotFound { path: PathBuf },

    /// Input has the wrong shape (e.g. not an `.apk` file)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External tool exited non-zero
    #[error("Command '{command}' returned with error (code {code}): {output}")]
    CommandExecution {
        command: String,
        code: i32,
        output: String,
    },

    /// Unrecognised interactive menu selection
    #[error("Invalid choice '{0}'. Please enter 1, 2 or 3.")]
    InvalidChoice(String),

    /// A tool location was never configured
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Configuration file or environment value could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// External tool could not be started at all
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External tool exceeded the configured timeout
    #[error("Command '{command}' timed out after {secs} seconds")]
    Timeout { command: String, secs: u64 },

    /// Interactive prompt failed (closed stdin, no terminal)
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Shorthand for a [`PipelineError::PathNotFound`].
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        PipelineError::PathNotFound { path: path.into() }
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_path() {
        let err = PipelineError::not_found("/opt/android/zipalign");
        assert_eq!(
            err.to_string(),
            "/opt/android/zipalign Path does not exist."
        );
    }

    #[test]
    fn test_command_execution_message() {
        let err = PipelineError::CommandExecution {
            command: "apktool b app -o out.apk".to_string(),
            code: 1,
            output: "brut.androlib.AndrolibException".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("apktool b app -o out.apk"));
        assert!(msg.contains("code 1"));
    }
}
