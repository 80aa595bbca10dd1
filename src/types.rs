use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a new trigger arrives for a task that is already part of
/// the active run.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   finishes (default behaviour).
/// - `Cancel`: drop any previously queued run and only keep the latest
///   trigger. The active run itself always runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// What a task does when one of its files fails to transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the task; dependents in the same run fail with it.
    #[default]
    Fail,
    /// Log the error, drop the offending file and keep going.
    Log,
}

/// Pipeline stage a task belongs to. Ordered the way the default pipeline
/// progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Clean,
    Compile,
    Optimize,
    Convert,
    Assemble,
    Minify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Clean => "clean",
            Stage::Compile => "compile",
            Stage::Optimize => "optimize",
            Stage::Convert => "convert",
            Stage::Assemble => "assemble",
            Stage::Minify => "minify",
        };
        f.write_str(s)
    }
}

/// Overall state of a `sitepipe` session.
///
/// `Idle → Cleaning → Compiling → Optimizing → Converting → Assembling →
/// Minifying → (Serving ⇄ Watching)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Idle,
    Cleaning,
    Compiling,
    Optimizing,
    Converting,
    Assembling,
    Minifying,
    /// Startup build finished; waiting for changes.
    Serving,
    /// A change-triggered run is in progress.
    Watching,
}

impl From<Stage> for RunPhase {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Clean => RunPhase::Cleaning,
            Stage::Compile => RunPhase::Compiling,
            Stage::Optimize => RunPhase::Optimizing,
            Stage::Convert => RunPhase::Converting,
            Stage::Assemble => RunPhase::Assembling,
            Stage::Minify => RunPhase::Minifying,
        }
    }
}
