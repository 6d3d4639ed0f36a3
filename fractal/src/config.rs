//! Engine configuration: search bounds, scoring policy, remote-call timeouts.
//!
//! Built with `with_*` setters or read from `FRACTAL_*` environment variables
//! (after the `config` crate has applied `.env` / XDG values).

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::engine::prompt::DEFAULT_CRITIC_INSTRUCTION;

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// Which child wins best-path selection when scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Lowest insertion index wins.
    #[default]
    FirstCreated,
    /// Highest insertion index wins.
    LastCreated,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "first" | "first_created" => Ok(Self::FirstCreated),
            "last" | "last_created" => Ok(Self::LastCreated),
            _ => Err(format!(
                "unknown tie break: {} (use first_created or last_created)",
                s
            )),
        }
    }
}

/// Configuration for [`FractalEngine`](crate::FractalEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Nodes at this depth are never expanded.
    pub max_depth: usize,
    /// Maximum children per expansion.
    pub branch_factor: usize,
    /// Score assigned when the critic fails or replies with a non-number.
    pub neutral_score: f64,
    pub tie_break: TieBreak,
    pub explorer_timeout: Duration,
    pub critic_timeout: Duration,
    /// System instruction for the critic (the scoring rubric).
    pub critic_instruction: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            branch_factor: 3,
            neutral_score: 0.5,
            tie_break: TieBreak::FirstCreated,
            explorer_timeout: Duration::from_secs(30),
            critic_timeout: Duration::from_secs(15),
            critic_instruction: DEFAULT_CRITIC_INSTRUCTION.trim().to_string(),
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

impl EngineConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_branch_factor(mut self, branch_factor: usize) -> Self {
        self.branch_factor = branch_factor;
        self
    }

    pub fn with_neutral_score(mut self, score: f64) -> Self {
        self.neutral_score = score;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_explorer_timeout(mut self, timeout: Duration) -> Self {
        self.explorer_timeout = timeout;
        self
    }

    pub fn with_critic_timeout(mut self, timeout: Duration) -> Self {
        self.critic_timeout = timeout;
        self
    }

    pub fn with_critic_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.critic_instruction = instruction.into();
        self
    }

    /// Defaults overridden by `FRACTAL_MAX_DEPTH`, `FRACTAL_BRANCH_FACTOR`,
    /// `FRACTAL_NEUTRAL_SCORE`, `FRACTAL_TIE_BREAK`, `FRACTAL_EXPLORER_TIMEOUT_SECS`,
    /// `FRACTAL_CRITIC_TIMEOUT_SECS` and `FRACTAL_CRITIC_INSTRUCTION`. The result is validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = env_parse("FRACTAL_MAX_DEPTH")? {
            config.max_depth = v;
        }
        if let Some(v) = env_parse("FRACTAL_BRANCH_FACTOR")? {
            config.branch_factor = v;
        }
        if let Some(v) = env_parse("FRACTAL_NEUTRAL_SCORE")? {
            config.neutral_score = v;
        }
        if let Some(v) = env_parse("FRACTAL_TIE_BREAK")? {
            config.tie_break = v;
        }
        if let Some(secs) = env_parse::<u64>("FRACTAL_EXPLORER_TIMEOUT_SECS")? {
            config.explorer_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("FRACTAL_CRITIC_TIMEOUT_SECS")? {
            config.critic_timeout = Duration::from_secs(secs);
        }
        if let Ok(instruction) = std::env::var("FRACTAL_CRITIC_INSTRUCTION") {
            if !instruction.trim().is_empty() {
                config.critic_instruction = instruction;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks bounds the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branch_factor == 0 {
            return Err(ConfigError::Invalid("branch_factor must be at least 1".into()));
        }
        if !self.neutral_score.is_finite() || !(0.0..=1.0).contains(&self.neutral_score) {
            return Err(ConfigError::Invalid(format!(
                "neutral_score must be within [0, 1], got {}",
                self.neutral_score
            )));
        }
        if self.explorer_timeout.is_zero() || self.critic_timeout.is_zero() {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    /// Upper bound on nodes in a fully expanded tree: `sum(branch_factor^d)` for `d` in `0..=max_depth`.
    pub fn max_nodes(&self) -> usize {
        let mut total: usize = 0;
        let mut level: usize = 1;
        for _ in 0..=self.max_depth {
            total = total.saturating_add(level);
            level = level.saturating_mul(self.branch_factor);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const KEYS: [&str; 7] = [
        "FRACTAL_MAX_DEPTH",
        "FRACTAL_BRANCH_FACTOR",
        "FRACTAL_NEUTRAL_SCORE",
        "FRACTAL_TIE_BREAK",
        "FRACTAL_EXPLORER_TIMEOUT_SECS",
        "FRACTAL_CRITIC_TIMEOUT_SECS",
        "FRACTAL_CRITIC_INSTRUCTION",
    ];

    /// Env-var tests share process state; run them under one lock.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn clear_env() {
        for k in KEYS {
            env::remove_var(k);
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = EngineConfig::default();
        assert_eq!(c.max_depth, 3);
        assert_eq!(c.branch_factor, 3);
        assert_eq!(c.neutral_score, 0.5);
        assert_eq!(c.tie_break, TieBreak::FirstCreated);
        assert!(c.validate().is_ok());
        assert_eq!(c.max_nodes(), 40);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(EngineConfig::default().with_branch_factor(0).validate().is_err());
        assert!(EngineConfig::default().with_neutral_score(1.5).validate().is_err());
        assert!(EngineConfig::default()
            .with_neutral_score(f64::NAN)
            .validate()
            .is_err());
        assert!(EngineConfig::default()
            .with_critic_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn tie_break_from_str() {
        assert_eq!("first".parse::<TieBreak>().unwrap(), TieBreak::FirstCreated);
        assert_eq!("Last-Created".parse::<TieBreak>().unwrap(), TieBreak::LastCreated);
        assert!("random".parse::<TieBreak>().is_err());
    }

    #[test]
    fn from_env_reads_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("FRACTAL_MAX_DEPTH", "2");
        env::set_var("FRACTAL_BRANCH_FACTOR", "4");
        env::set_var("FRACTAL_NEUTRAL_SCORE", "0.25");
        env::set_var("FRACTAL_TIE_BREAK", "last_created");
        env::set_var("FRACTAL_CRITIC_TIMEOUT_SECS", "5");
        let result = EngineConfig::from_env();
        clear_env();

        let c = result.unwrap();
        assert_eq!(c.max_depth, 2);
        assert_eq!(c.branch_factor, 4);
        assert_eq!(c.neutral_score, 0.25);
        assert_eq!(c.tie_break, TieBreak::LastCreated);
        assert_eq!(c.critic_timeout, Duration::from_secs(5));
        assert_eq!(c.explorer_timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_env_reports_unparseable_value() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("FRACTAL_BRANCH_FACTOR", "three");
        let result = EngineConfig::from_env();
        clear_env();

        match result {
            Err(ConfigError::InvalidValue { key, value, .. }) => {
                assert_eq!(key, "FRACTAL_BRANCH_FACTOR");
                assert_eq!(value, "three");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn from_env_validates_result() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("FRACTAL_NEUTRAL_SCORE", "2.0");
        let result = EngineConfig::from_env();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
