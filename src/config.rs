//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::decode::DEFAULT_ZERO_TOLERANCE;
use crate::engine::PlanOptions;
use crate::error::{Error, Result};
use crate::solver::SolveOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            username: None,
        }
    }
}

/// `$XDG_CACHE_HOME/rebalance`, falling back to `$HOME/.cache/rebalance`.
fn default_cache_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));
    base.join("rebalance")
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_zero_tolerance")]
    pub zero_tolerance: f64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            zero_tolerance: default_zero_tolerance(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_zero_tolerance() -> f64 {
    DEFAULT_ZERO_TOLERANCE
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_audit_path(),
        }
    }
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("./logs/plans.jsonl")
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let tol = self.solver.zero_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(Error::Config("zero_tolerance must be finite and >= 0".into()));
        }
        if let Some(name) = &self.cache.username {
            if name.is_empty() {
                return Err(Error::Config("username must not be empty".into()));
            }
        }
        if self.cache.dir.as_os_str().is_empty() {
            return Err(Error::Config("cache dir must not be empty".into()));
        }
        Ok(())
    }

    /// Solver deadline; `None` when `timeout_secs` is zero.
    pub fn deadline(&self) -> Option<Duration> {
        match self.solver.timeout_secs {
            0 => None,
            s => Some(Duration::from_secs(s)),
        }
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            zero_tolerance: self.solver.zero_tolerance,
            solve: SolveOptions {
                deadline: self.deadline(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[cache]
dir = "/var/cache/rebalance"
username = "1234567"

[solver]
zero_tolerance = 1e-4
timeout_secs = 10

[audit]
enabled = true
path = "./logs/plans.jsonl"
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("/var/cache/rebalance"));
        assert_eq!(config.cache.username.as_deref(), Some("1234567"));
        assert_eq!(config.solver.zero_tolerance, 1e-4);
        assert_eq!(config.deadline(), Some(Duration::from_secs(10)));
        assert!(config.audit.enabled);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.solver.zero_tolerance, DEFAULT_ZERO_TOLERANCE);
        assert_eq!(config.solver.timeout_secs, 30);
        assert!(!config.audit.enabled);
        assert!(config.cache.dir.ends_with("rebalance"));
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let config = Config::from_toml("[solver]\ntimeout_secs = 0\n").unwrap();
        assert_eq!(config.deadline(), None);
        assert_eq!(config.plan_options().solve.deadline, None);
    }

    #[test]
    fn validate_catches_negative_tolerance() {
        assert!(Config::from_toml("[solver]\nzero_tolerance = -1.0\n").is_err());
    }

    #[test]
    fn validate_catches_empty_username() {
        assert!(Config::from_toml("[cache]\nusername = \"\"\n").is_err());
    }

    #[test]
    fn missing_default_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("rebalance.toml")).unwrap();
        assert!(config.cache.username.is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
