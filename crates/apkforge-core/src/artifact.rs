//! Artifact naming between pipeline stages.
//!
//! Every stage writes a new artifact named after its predecessor: the
//! predecessor's suffix is stripped from the base name and the new suffix is
//! appended, so `app.apk` becomes `app-decompiled`, then `app-unsigned.apk`,
//! `app-zipaligned.apk` and finally `app-signed.apk`.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension shared by every packaged artifact.
pub const APK_EXTENSION: &str = "apk";

/// Where an artifact sits in the pipeline, encoded as a filename suffix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStage {
    /// The APK the user started from.
    Source,

    /// apktool output directory.
    Decompiled,

    /// Rebuilt by apktool, not yet aligned.
    Unsigned,

    /// Output of zipalign.
    Zipaligned,

    /// Output of apksigner.
    Signed,
}

impl ArtifactStage {
    /// Filename suffix for this stage.
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactStage::Source => "",
            ArtifactStage::Decompiled => "-decompiled",
            ArtifactStage::Unsigned => "-unsigned",
            ArtifactStage::Zipaligned => "-zipaligned",
            ArtifactStage::Signed => "-signed",
        }
    }

    /// File extension, `None` for the decompiled directory.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ArtifactStage::Decompiled => None,
            _ => Some(APK_EXTENSION),
        }
    }
}

/// Base name of `input` with `from`'s suffix removed.
///
/// Packaged artifacts lose their extension; the decompiled directory keeps
/// its full name (it may legitimately contain dots).
pub fn base_name(input: &Path, from: ArtifactStage) -> Result<String> {
    let raw = match from.extension() {
        Some(_) => input.file_stem(),
        None => input.file_name(),
    }
    .ok_or_else(|| {
        PipelineError::InvalidInput(format!("{} has no file name", input.display()))
    })?
    .to_string_lossy();

    let stem = raw.strip_suffix(from.suffix()).unwrap_or(&*raw);
    if stem.is_empty() {
        return Err(PipelineError::InvalidInput(format!(
            "{} has an empty base name",
            input.display()
        )));
    }
    Ok(stem.to_string())
}

/// Derive the path of the artifact produced from `input` by the next stage.
///
/// Pure: the filesystem is never touched. Applying the same stage to the same
/// input always yields the same path.
pub fn derive_output_path(
    output_dir: &Path,
    input: &Path,
    from: ArtifactStage,
    to: ArtifactStage,
) -> Result<PathBuf> {
    let mut name = base_name(input, from)?;
    name.push_str(to.suffix());
    if let Some(ext) = to.extension() {
        name.push('.');
        name.push_str(ext);
    }
    Ok(output_dir.join(name))
}
