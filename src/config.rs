use crate::heuristics::HeuristicKind;
use crate::solver::DuplicatePolicy;
use std::path::{Path, PathBuf};

/// Solver configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Evaluator used to order the open set.
    #[serde(default)]
    pub heuristic: HeuristicKind,

    /// Stop after this many expansions. Unlimited when absent.
    #[serde(default)]
    pub max_expansions: Option<u64>,

    /// Whether successors already queued at a lower or equal cost are enqueued again.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// When set, the host advances the search this many steps per tick instead
    /// of running it to completion in one go.
    #[serde(default)]
    pub steps_per_tick: Option<u32>,

    /// Pause between ticks, in milliseconds. Only used with `steps_per_tick`.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    16
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl SearchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Log a warning for settings that are legal but probably a mistake.
    pub fn validate(&self) {
        if self.max_expansions == Some(0) {
            tracing::warn!("max_expansions = 0; only a level that starts solved can succeed");
        }
        if self.steps_per_tick == Some(0) {
            tracing::warn!("steps_per_tick = 0; the paced search would never advance");
        }
        if !self.heuristic.is_admissible() {
            tracing::info!(
                heuristic = %self.heuristic,
                "heuristic is not admissible; solutions may be longer than optimal"
            );
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            heuristic: HeuristicKind::default(),
            max_expansions: None,
            duplicate_policy: DuplicatePolicy::default(),
            steps_per_tick: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}
