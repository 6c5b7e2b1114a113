//! Pipeline stage, entry action and signing menu definitions.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the user asked for on the command line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// `c`: compile → zipalign → sign
    Compile,

    /// `d`: decompile only
    Decompile,
}

impl FromStr for Action {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "c" => Ok(Action::Compile),
            "d" => Ok(Action::Decompile),
            other => Err(PipelineError::InvalidInput(format!(
                "Unknown action '{other}', expected 'c' or 'd'"
            ))),
        }
    }
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// apktool d
    Decompile,

    /// apktool b
    Compile,

    /// zipalign
    Zipalign,

    /// keytool (optional) + apksigner
    Sign,
}

impl PipelineStage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Decompile => "decompile",
            PipelineStage::Compile => "compile",
            PipelineStage::Zipalign => "zipalign",
            PipelineStage::Sign => "sign",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Menu shown before signing.
pub const SIGN_MENU: &str = "
    Do you want to create a new keystore or use an existing one?
    1. Create new keystore
    2. Use an existing keystore
    3. No thanks, I'm done
    ";

/// Answer to [`SIGN_MENU`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignChoice {
    CreateKeystore,
    ExistingKeystore,
    Skip,
}

impl FromStr for SignChoice {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(SignChoice::CreateKeystore),
            "2" => Ok(SignChoice::ExistingKeystore),
            "3" => Ok(SignChoice::Skip),
            other => Err(PipelineError::InvalidChoice(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Decompile.name(), "decompile");
        assert_eq!(PipelineStage::Compile.name(), "compile");
        assert_eq!(PipelineStage::Zipalign.name(), "zipalign");
        assert_eq!(PipelineStage::Sign.to_string(), "sign");
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("c".parse::<Action>().unwrap(), Action::Compile);
        assert_eq!("d".parse::<Action>().unwrap(), Action::Decompile);
        assert!(matches!(
            "x".parse::<Action>(),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sign_choice_parse() {
        assert_eq!("1".parse::<SignChoice>().unwrap(), SignChoice::CreateKeystore);
        assert_eq!(" 2\n".parse::<SignChoice>().unwrap(), SignChoice::ExistingKeystore);
        assert_eq!("3".parse::<SignChoice>().unwrap(), SignChoice::Skip);

        for bad in ["4", "", "yes", "12"] {
            match bad.parse::<SignChoice>() {
                Err(PipelineError::InvalidChoice(choice)) => assert_eq!(choice, bad.trim()),
                other => panic!("expected InvalidChoice for {bad:?}, got {:?}", other),
            }
        }
    }
}
