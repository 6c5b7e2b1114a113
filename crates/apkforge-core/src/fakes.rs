//! In-memory fakes for the runner and prompt traits (testing only)
//!
//! `RecordingRunner` records every invocation and materialises the artifact
//! the real tool would have written, so chained stages see their inputs.
//! `ScriptedPrompter` answers prompts from pre-loaded queues.

use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{PipelineError, Result};
use crate::prompt::{PromptProvider, Secret};
use crate::runner::{ToolOutput, ToolRunner};
use crate::tool::ToolInvocation;

// ---------------------------------------------------------------------------
// RecordingRunner
// ---------------------------------------------------------------------------

/// Runner that never spawns anything.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `tool` exit with code 1.
    pub fn fail_tool(self, tool: &str) -> Self {
        self.failing.lock().unwrap().insert(tool.to_string());
        self
    }

    /// All invocations so far, in order.
    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Tool names invoked so far, in order.
    pub fn tools(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|c| c.tool).collect()
    }
}

/// Path the real tool would write, taken from its argument vector.
fn produced_path(invocation: &ToolInvocation) -> Option<(PathBuf, bool)> {
    let args: Vec<OsString> = invocation.process_args();
    let after = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from)
    };

    match invocation.tool {
        "apktool" if args.first().is_some_and(|a| a == "d") => after("-o").map(|p| (p, true)),
        "apktool" => after("-o").map(|p| (p, false)),
        "zipalign" => args.last().map(|p| (PathBuf::from(p), false)),
        "keytool" => after("-keystore").map(|p| (p, false)),
        "apksigner" => after("--out").map(|p| (p, false)),
        _ => None,
    }
}

#[async_trait]
impl ToolRunner for RecordingRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        if self.failing.lock().unwrap().contains(invocation.tool) {
            return Err(PipelineError::CommandExecution {
                command: invocation.to_string(),
                code: 1,
                output: format!("{} failed", invocation.tool),
            });
        }

        if let Some((path, is_dir)) = produced_path(invocation) {
            if is_dir {
                std::fs::create_dir_all(&path)?;
            } else {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, b"PK\x03\x04")?;
            }
        }

        Ok(ToolOutput {
            tool: invocation.tool.to_string(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedPrompter
// ---------------------------------------------------------------------------

/// Prompt provider answering from queues; running dry is a `Prompt` error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    inputs: Mutex<VecDeque<String>>,
    passwords: Mutex<VecDeque<Secret>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs
            .lock()
            .unwrap()
            .extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn with_passwords<I, S>(self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passwords
            .lock()
            .unwrap()
            .extend(answers.into_iter().map(Secret::new));
        self
    }

    /// Labels of every prompt shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    /// Unused text answers.
    pub fn remaining_inputs(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

impl PromptProvider for ScriptedPrompter {
    fn input(&self, label: &str) -> Result<String> {
        self.asked.lock().unwrap().push(label.to_string());
        self.inputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PipelineError::Prompt(format!("no scripted answer for {label:?}")))
    }

    fn password(&self, label: &str) -> Result<Secret> {
        self.asked.lock().unwrap().push(label.to_string());
        self.passwords
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PipelineError::Prompt(format!("no scripted password for {label:?}")))
    }
}
