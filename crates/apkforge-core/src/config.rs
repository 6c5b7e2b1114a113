//! Tool locations and directory layout.
//!
//! Loaded once at startup from an optional TOML file and then overridden by
//! environment variables. Tool paths are not validated here; each stage checks
//! the tools it needs right before invoking them.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "apkforge.toml";

/// Default directory for generated artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default directory for per-run log files.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// External tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// apktool launcher (decompile and build).
    #[serde(default)]
    pub apktool_path: Option<PathBuf>,

    /// Android SDK build-tools directory holding `zipalign` and `apksigner`.
    #[serde(default)]
    pub sdk_tools_dir: Option<PathBuf>,

    /// keytool program; a bare name is resolved through `PATH`.
    #[serde(default = "default_keytool")]
    pub keytool_path: PathBuf,

    /// Where every stage writes its artifact.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where `app_<timestamp>.log` files go.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Per-tool timeout in seconds (0 = wait indefinitely).
    #[serde(default)]
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            apktool_path: None,
            sdk_tools_dir: None,
            keytool_path: default_keytool(),
            output_dir: default_output_dir(),
            log_dir: default_log_dir(),
            timeout_secs: 0,
        }
    }
}

impl ToolConfig {
    /// Parse a TOML configuration document.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load the configuration for a run.
    ///
    /// Reads `explicit` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it
    /// exists, otherwise starts from defaults. Environment variables win over
    /// file values.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let base = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(PipelineError::not_found(path));
                }
                debug!(path = %path.display(), "Loading tool configuration");
                Self::from_file(path)?
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                debug!(path = DEFAULT_CONFIG_FILE, "Loading tool configuration");
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `APKTOOL_PATH`, `ANDROID_SDK_TOOLS`, `KEYTOOL_PATH`,
    /// `APKFORGE_OUTPUT_DIR`, `APKFORGE_LOG_DIR` and
    /// `APKFORGE_TOOL_TIMEOUT_SECS` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APKTOOL_PATH") {
            self.apktool_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ANDROID_SDK_TOOLS") {
            self.sdk_tools_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("KEYTOOL_PATH") {
            self.keytool_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("APKFORGE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("APKFORGE_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("APKFORGE_TOOL_TIMEOUT_SECS") {
            self.timeout_secs = v.trim().parse().map_err(|_| {
                PipelineError::Config(format!("APKFORGE_TOOL_TIMEOUT_SECS is not a number: {v}"))
            })?;
        }
        Ok(self)
    }

    /// apktool location, or `MissingConfig` when unset.
    pub fn apktool(&self) -> Result<&Path> {
        self.apktool_path
            .as_deref()
            .ok_or(PipelineError::MissingConfig("APKTOOL_PATH"))
    }

    /// `<sdk_tools_dir>/zipalign`
    pub fn zipalign(&self) -> Result<PathBuf> {
        self.sdk_tool("zipalign")
    }

    /// `<sdk_tools_dir>/apksigner`
    pub fn apksigner(&self) -> Result<PathBuf> {
        self.sdk_tool("apksigner")
    }

    fn sdk_tool(&self, tool: &str) -> Result<PathBuf> {
        self.sdk_tools_dir
            .as_deref()
            .map(|dir| dir.join(tool))
            .ok_or(PipelineError::MissingConfig("ANDROID_SDK_TOOLS"))
    }
}

fn default_keytool() -> PathBuf {
    PathBuf::from("keytool")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ToolConfig::default();
        assert!(config.apktool_path.is_none());
        assert_eq!(config.keytool_path, PathBuf::from("keytool"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.timeout_secs, 0);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ToolConfig::from_toml(
            r#"
            apktool_path = "/opt/apktool/apktool"
            sdk_tools_dir = "/opt/android/build-tools/34.0.0"
            "#,
        )
        .unwrap();

        assert_eq!(config.apktool().unwrap(), Path::new("/opt/apktool/apktool"));
        assert_eq!(
            config.zipalign().unwrap(),
            PathBuf::from("/opt/android/build-tools/34.0.0/zipalign")
        );
        assert_eq!(
            config.apksigner().unwrap(),
            PathBuf::from("/opt/android/build-tools/34.0.0/apksigner")
        );
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ToolConfig::from_toml("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("APKTOOL_PATH", "/env/apktool"),
            ("ANDROID_SDK_TOOLS", "/env/sdk"),
            ("APKFORGE_TOOL_TIMEOUT_SECS", "120"),
        ]
        .into_iter()
        .collect();

        let config = ToolConfig::from_toml("apktool_path = \"/file/apktool\"")
            .unwrap()
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.apktool().unwrap(), Path::new("/env/apktool"));
        assert_eq!(config.zipalign().unwrap(), PathBuf::from("/env/sdk/zipalign"));
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_bad_timeout_override() {
        let err = ToolConfig::default()
            .with_overrides(|k| (k == "APKFORGE_TOOL_TIMEOUT_SECS").then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_missing_tools_reported_by_name() {
        let config = ToolConfig::default();
        assert!(matches!(
            config.apktool(),
            Err(PipelineError::MissingConfig("APKTOOL_PATH"))
        ));
        assert!(matches!(
            config.apksigner(),
            Err(PipelineError::MissingConfig("ANDROID_SDK_TOOLS"))
        ));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ToolConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, PipelineError::PathNotFound { .. }));
    }
}
