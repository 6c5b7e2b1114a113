//! Stage execution and forward chaining.
//!
//! Decompile is terminal. Compile chains into Zipalign, which chains into the
//! interactive Sign stage. Every stage validates its inputs before invoking a
//! tool and returns a `Result`; the first error ends the run.

use crate::artifact::{derive_output_path, ArtifactStage};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::keystore::{KeystoreManager, SignedArtifact};
use crate::stage::{Action, PipelineStage, SignChoice, SIGN_MENU};
use crate::tool;
use crate::validate::{ensure_apk_extension, ensure_exists, ensure_tool};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Advisory printed after a successful decompile.
pub const MANIFEST_ADVISORY: &str = "Make sure you add 'android:extractNativeLibs=\"true\"' in the AndroidManifest file of your compiled code at the <application> level";

/// One executed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: PipelineStage,

    pub input: PathBuf,

    /// Artifact produced, `None` when signing was skipped.
    pub output: Option<PathBuf>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    Signed(SignedArtifact),

    /// User declined to sign; the aligned artifact is the final product.
    Skipped { artifact: PathBuf },
}

/// Final product of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Decompiled { directory: PathBuf },
    Signed(SignedArtifact),
    SigningSkipped { artifact: PathBuf },
}

/// Result of a complete pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub action: Action,

    /// Stages in execution order.
    pub stages: Vec<StageRecord>,

    pub outcome: Outcome,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineResult {
    /// Path of the last artifact the run produced.
    pub fn final_artifact(&self) -> &Path {
        match &self.outcome {
            Outcome::Decompiled { directory } => directory,
            Outcome::Signed(signed) => &signed.apk,
            Outcome::SigningSkipped { artifact } => artifact,
        }
    }
}

/// Pipeline orchestrator.
pub struct Pipeline {
    ctx: PipelineContext,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Run the stages for `action` starting from `input`.
    pub async fn run(&self, action: Action, input: &Path) -> Result<PipelineResult> {
        let start = Instant::now();
        self.ctx.ensure_output_dir()?;

        let mut stages = Vec::new();
        let outcome = match action {
            Action::Decompile => {
                let started = Instant::now();
                let directory = self.decompile(input).await?;
                stages.push(record(PipelineStage::Decompile, input, Some(&directory), started));
                Outcome::Decompiled { directory }
            }
            Action::Compile => {
                let started = Instant::now();
                let unsigned = self.compile(input).await?;
                stages.push(record(PipelineStage::Compile, input, Some(&unsigned), started));

                let started = Instant::now();
                let aligned = self.zipalign(&unsigned).await?;
                stages.push(record(PipelineStage::Zipalign, &unsigned, Some(&aligned), started));

                let started = Instant::now();
                match self.sign(&aligned).await? {
                    SignOutcome::Signed(artifact) => {
                        stages.push(record(PipelineStage::Sign, &aligned, Some(&artifact.apk), started));
                        Outcome::Signed(artifact)
                    }
                    SignOutcome::Skipped { artifact } => {
                        stages.push(record(PipelineStage::Sign, &aligned, None, started));
                        Outcome::SigningSkipped { artifact }
                    }
                }
            }
        };

        Ok(PipelineResult {
            action,
            stages,
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Decompile an APK into `<output>/<name>-decompiled`.
    ///
    /// An existing directory for the same artifact is removed first.
    pub async fn decompile(&self, apk: &Path) -> Result<PathBuf> {
        ensure_exists(apk)?;
        ensure_apk_extension(apk)?;
        let apktool = self.ctx.config.apktool()?;
        ensure_tool(apktool)?;

        let output = derive_output_path(
            self.ctx.output_dir(),
            apk,
            ArtifactStage::Source,
            ArtifactStage::Decompiled,
        )?;
        remove_stale_output(&output)?;

        info!(stage = %PipelineStage::Decompile, input = %apk.display(), "Decompiling APK");
        self.ctx
            .runner
            .run(&tool::apktool_decode(apktool, apk, &output))
            .await?;

        info!("Successfully Decompiled APK to {}", output.display());
        info!("{}", MANIFEST_ADVISORY);
        Ok(output)
    }

    /// Rebuild a decompiled directory into `<output>/<name>-unsigned.apk`.
    pub async fn compile(&self, decompiled_dir: &Path) -> Result<PathBuf> {
        info!("Compiling the Code at {}", decompiled_dir.display());
        ensure_exists(decompiled_dir)?;
        let apktool = self.ctx.config.apktool()?;
        ensure_tool(apktool)?;

        let output = derive_output_path(
            self.ctx.output_dir(),
            decompiled_dir,
            ArtifactStage::Decompiled,
            ArtifactStage::Unsigned,
        )?;

        self.ctx
            .runner
            .run(&tool::apktool_build(apktool, decompiled_dir, &output))
            .await?;

        info!("Successfully Compiled APK to {}", output.display());
        Ok(output)
    }

    /// Align an unsigned APK into `<output>/<name>-zipaligned.apk`.
    pub async fn zipalign(&self, unsigned: &Path) -> Result<PathBuf> {
        ensure_exists(unsigned)?;
        let zipalign = self.ctx.config.zipalign()?;
        ensure_exists(&zipalign)?;

        let output = derive_output_path(
            self.ctx.output_dir(),
            unsigned,
            ArtifactStage::Unsigned,
            ArtifactStage::Zipaligned,
        )?;

        info!("Starting zipalign process for {}", unsigned.display());
        self.ctx
            .runner
            .run(&tool::zipalign(&zipalign, unsigned, &output))
            .await?;

        info!("Successfully Zipaligned APK to {}", output.display());
        Ok(output)
    }

    /// Ask how to sign `aligned` and act on the answer.
    pub async fn sign(&self, aligned: &Path) -> Result<SignOutcome> {
        ensure_exists(aligned)?;
        info!("Starting APK Signing Process for {}", aligned.display());

        let prompts = self.ctx.prompts.as_ref();
        let keystores = KeystoreManager::new(&self.ctx);

        match prompts.input(SIGN_MENU)?.parse::<SignChoice>()? {
            SignChoice::CreateKeystore => Ok(SignOutcome::Signed(
                keystores.create_new(aligned).await?,
            )),
            SignChoice::ExistingKeystore => {
                let keystore = PathBuf::from(prompts.input("Keystore Path: ")?.trim());
                let alias = prompts.input("Alias: ")?.trim().to_string();
                Ok(SignOutcome::Signed(
                    keystores.use_existing(&keystore, &alias, aligned).await?,
                ))
            }
            SignChoice::Skip => {
                info!("Your unsigned apk file is stored at {}", aligned.display());
                Ok(SignOutcome::Skipped {
                    artifact: aligned.to_path_buf(),
                })
            }
        }
    }
}

fn record(
    stage: PipelineStage,
    input: &Path,
    output: Option<&Path>,
    started: Instant,
) -> StageRecord {
    StageRecord {
        stage,
        input: input.to_path_buf(),
        output: output.map(Path::to_path_buf),
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

/// Remove a previous decompile of the same artifact. Last run wins.
fn remove_stale_output(output: &Path) -> Result<()> {
    if output.is_dir() {
        info!("Existing Decompiled Version found");
        std::fs::remove_dir_all(output)?;
        info!("Removed Existing Decompiled Version");
    } else if output.exists() {
        std::fs::remove_file(output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::SignedArtifact;

    #[test]
    fn test_final_artifact() {
        let decompiled = PipelineResult {
            action: Action::Decompile,
            stages: vec![],
            outcome: Outcome::Decompiled {
                directory: PathBuf::from("output/app-decompiled"),
            },
            duration_ms: 10,
        };
        assert_eq!(decompiled.final_artifact(), Path::new("output/app-decompiled"));

        let signed = PipelineResult {
            action: Action::Compile,
            stages: vec![],
            outcome: Outcome::Signed(SignedArtifact {
                apk: PathBuf::from("output/app-signed.apk"),
                keystore: PathBuf::from("release.keystore"),
            }),
            duration_ms: 10,
        };
        assert_eq!(signed.final_artifact(), Path::new("output/app-signed.apk"));
    }

    #[test]
    fn test_remove_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("app-decompiled");
        std::fs::create_dir_all(stale.join("res")).unwrap();
        std::fs::write(stale.join("apktool.yml"), b"version: 2").unwrap();

        remove_stale_output(&stale).unwrap();
        assert!(!stale.exists());

        remove_stale_output(&stale).unwrap();
    }
}
