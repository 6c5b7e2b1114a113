//! Precondition checks run before any tool is invoked.

use crate::artifact::APK_EXTENSION;
use crate::error::{PipelineError, Result};
use std::path::Path;
use tracing::debug;

/// Fail with `PathNotFound` unless `path` exists.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::not_found(path))
    }
}

/// Fail with `InvalidInput` unless `path` ends in `.apk`.
pub fn ensure_apk_extension(path: &Path) -> Result<()> {
    let is_apk = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(APK_EXTENSION))
        .unwrap_or(false);

    if is_apk {
        Ok(())
    } else {
        Err(PipelineError::InvalidInput(format!(
            "{} is not an APK file.",
            path.display()
        )))
    }
}

/// Check a tool location.
///
/// Anything that looks like a path (absolute, or more than one component) must
/// exist. A bare program name is left for `PATH` lookup at spawn time.
pub fn ensure_tool(tool: &Path) -> Result<()> {
    if tool.is_absolute() || tool.components().count() > 1 {
        ensure_exists(tool)
    } else {
        debug!(tool = %tool.display(), "Resolving tool through PATH");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_exists() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("app.apk");
        std::fs::write(&file, b"PK").unwrap();

        assert!(ensure_exists(&file).is_ok());
        assert!(ensure_exists(dir.path()).is_ok());

        let missing = dir.path().join("missing.apk");
        match ensure_exists(&missing) {
            Err(PipelineError::PathNotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected PathNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_apk_extension() {
        assert!(ensure_apk_extension(Path::new("app.apk")).is_ok());
        assert!(ensure_apk_extension(Path::new("dir/App.APK")).is_ok());
        assert!(matches!(
            ensure_apk_extension(Path::new("app.zip")),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            ensure_apk_extension(Path::new("app")),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ensure_tool() {
        let dir = tempdir().unwrap();
        let tool = dir.path().join("zipalign");

        assert!(matches!(
            ensure_tool(&tool),
            Err(PipelineError::PathNotFound { .. })
        ));
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();
        assert!(ensure_tool(&tool).is_ok());

        assert!(ensure_tool(Path::new("keytool")).is_ok());
        assert!(ensure_tool(Path::new("bin/keytool")).is_err());
    }
}
