//! Keystore creation and APK signing.
//!
//! Two entry points, both ending in an apksigner run:
//! - [`KeystoreManager::create_new`] collects key details, runs keytool and
//!   signs with the fresh keystore.
//! - [`KeystoreManager::use_existing`] signs with a keystore the user already
//!   has.

use crate::artifact::{derive_output_path, ArtifactStage};
use crate::context::PipelineContext;
use crate::error::{PipelineError, Result};
use crate::prompt::{PromptProvider, Secret};
use crate::tool::{apksigner_sign, keytool_genkeypair, GenKeyPair};
use crate::validate::{ensure_exists, ensure_tool};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Extension given to generated keystores.
pub const KEYSTORE_EXTENSION: &str = "keystore";

/// Certificate subject fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistinguishedName {
    pub common_name: String,
    pub organisational_unit: String,
    pub organisation: String,
    pub locality: String,
    pub state: String,
    pub country: String,
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CN={}, OU={}, O={}, L={}, S={}, C={}",
            escape_rdn(&self.common_name),
            escape_rdn(&self.organisational_unit),
            escape_rdn(&self.organisation),
            escape_rdn(&self.locality),
            escape_rdn(&self.state),
            escape_rdn(&self.country),
        )
    }
}

/// Escape characters that would otherwise split or end an RDN value.
fn escape_rdn(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Everything keytool needs to create a keystore. Used once, never persisted.
#[derive(Debug, Clone)]
pub struct KeystoreConfig {
    pub alias: String,
    pub validity_days: u32,
    /// Keystore name without extension.
    pub file_name: String,
    pub dname: DistinguishedName,
    pub store_password: Secret,
    pub key_password: Secret,
}

impl KeystoreConfig {
    /// Collect a keystore configuration interactively.
    pub fn prompt(prompts: &dyn PromptProvider) -> Result<Self> {
        let alias = required(prompts.input("Whats your alias: ")?, "alias")?;
        let validity = prompts.input("Keystore Validity: ")?;
        let validity_days = validity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "Keystore validity must be a positive number of days, got '{}'",
                    validity.trim()
                ))
            })?;
        let file_name = required(prompts.input("Keystore filename: ")?, "keystore filename")?;
        plain_file_name(&file_name)?;

        let dname = DistinguishedName {
            common_name: prompts.input("UserName: ")?,
            organisational_unit: prompts.input("Organisation Unit: ")?,
            organisation: prompts.input("Organisation: ")?,
            locality: prompts.input("City: ")?,
            state: prompts.input("State: ")?,
            country: prompts.input("Country (eg US): ")?,
        };

        let store_password = prompts.password("Keystore password: ")?;
        let key_password = prompts.password("Key password: ")?;

        Ok(Self {
            alias,
            validity_days,
            file_name,
            dname,
            store_password,
            key_password,
        })
    }

    /// `<output_dir>/<file_name>.keystore`
    ///
    /// The name must be a single plain file name so the keystore stays inside
    /// `output_dir`.
    pub fn keystore_path(&self, output_dir: &Path) -> Result<PathBuf> {
        let name = plain_file_name(&self.file_name)?;
        let name = name.strip_suffix(".keystore").unwrap_or(name);
        Ok(output_dir.join(format!("{name}.{KEYSTORE_EXTENSION}")))
    }
}

fn plain_file_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(std::path::is_separator) => {
            Ok(name)
        }
        _ => Err(PipelineError::InvalidInput(format!(
            "Keystore filename must be a plain file name, got '{name}'"
        ))),
    }
}

fn required(value: String, what: &str) -> Result<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(PipelineError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(value)
}

/// Result of a successful signing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedArtifact {
    pub apk: PathBuf,
    pub keystore: PathBuf,
}

/// Creates keystores and signs APKs with them.
pub struct KeystoreManager<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> KeystoreManager<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Create a keystore interactively, then sign `apk` with it.
    pub async fn create_new(&self, apk: &Path) -> Result<SignedArtifact> {
        self.check_signer(apk)?;

        info!("Creating a new keystore");
        let config = KeystoreConfig::prompt(self.ctx.prompts.as_ref())?;
        let keystore = self.create_keystore(&config).await?;
        self.sign(
            &keystore,
            &config.alias,
            &config.store_password,
            &config.key_password,
            apk,
        )
        .await
    }

    /// Run keytool for `config` and return the new keystore path.
    pub async fn create_keystore(&self, config: &KeystoreConfig) -> Result<PathBuf> {
        let keytool = &self.ctx.config.keytool_path;
        ensure_tool(keytool)?;

        let keystore = config.keystore_path(self.ctx.output_dir())?;
        let invocation = keytool_genkeypair(
            keytool,
            &GenKeyPair {
                alias: &config.alias,
                validity_days: config.validity_days,
                keystore: &keystore,
                store_password: &config.store_password,
                key_password: &config.key_password,
                dname: &config.dname,
            },
        );
        self.ctx.runner.run(&invocation).await?;

        info!(keystore = %keystore.display(), "Keystore Created Successfully at {}", keystore.display());
        Ok(keystore)
    }

    /// Sign `apk` with an existing keystore, prompting for its passwords.
    pub async fn use_existing(
        &self,
        keystore: &Path,
        alias: &str,
        apk: &Path,
    ) -> Result<SignedArtifact> {
        ensure_exists(keystore)?;
        self.check_signer(apk)?;

        let store_password = self.ctx.prompts.password("Keystore password: ")?;
        let key_password = self.ctx.prompts.password("Key password: ")?;

        self.sign(keystore, alias, &store_password, &key_password, apk)
            .await
    }

    async fn sign(
        &self,
        keystore: &Path,
        alias: &str,
        store_password: &Secret,
        key_password: &Secret,
        apk: &Path,
    ) -> Result<SignedArtifact> {
        info!(
            "Signing APK at {} with keystore {}",
            apk.display(),
            keystore.display()
        );
        let apksigner = self.ctx.config.apksigner()?;

        let output = derive_output_path(
            self.ctx.output_dir(),
            apk,
            ArtifactStage::Zipaligned,
            ArtifactStage::Signed,
        )?;

        let invocation = apksigner_sign(
            &apksigner,
            keystore,
            alias,
            store_password,
            key_password,
            apk,
            &output,
        );
        self.ctx.runner.run(&invocation).await?;

        info!(path = %output.display(), "Your Signed APK is ready at {}", output.display());
        Ok(SignedArtifact {
            apk: output,
            keystore: keystore.to_path_buf(),
        })
    }

    /// apksigner and the APK to sign must exist before anything is run.
    fn check_signer(&self, apk: &Path) -> Result<()> {
        ensure_exists(&self.ctx.config.apksigner()?)?;
        ensure_exists(apk)
    }
}
