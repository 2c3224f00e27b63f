use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::policy::{
    CompileConfig, DEFAULT_SANDBOX_PATH, FileExtension, LanguagePolicy, RunConfig,
};
use crate::types::{MountConfig, ResourceLimits};

pub mod policy;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../judgehouse.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level judgehouse configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the Isolate binary (uses PATH if not specified).
    #[serde(default)]
    pub isolate_path: Option<PathBuf>,

    /// Use cgroup memory limiting instead of RLIMIT_AS.
    ///
    /// When enabled, isolate uses `--cg` and `--cg-mem` which limit actual memory
    /// usage (RSS) rather than virtual address space. This is required for runtimes
    /// like the JVM and Go that map large amounts of virtual memory.
    #[serde(default)]
    pub cgroup: bool,

    /// Cgroup root path for isolate. Must match isolate's `cg_root` config value.
    ///
    /// When `cgroup = true`, judgehouse will attempt to create this cgroup directory
    /// and enable the memory controller before invoking isolate. This replaces the
    /// need for `isolate-cg-keeper` / systemd in container environments.
    #[serde(default = "default_cg_root")]
    pub cg_root: PathBuf,

    /// Global directory mounts applied to all sandbox invocations
    /// (both compilation and execution).
    #[serde(default)]
    pub sandbox_mounts: Vec<MountConfig>,

    /// Default resource limits applied to all executions.
    /// This will be overridden if the code execution request specifies different limits
    #[serde(default)]
    pub default_limits: ResourceLimits,

    /// Language policies keyed by the lowercase [`crate::language::Language`]
    /// tag (`"java"`, `"cpp"`, ...).
    #[serde(default)]
    pub languages: HashMap<String, LanguagePolicy>,

    /// Admission and HTTP-facing settings. Absent from the embedded default
    /// TOML's `[languages]` tables, so it gets its own section.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Request validation bounds.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-Execution workspace root and retention policy.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Create a new config with embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            isolate_path: None,
            cgroup: false,
            cg_root: default_cg_root(),
            sandbox_mounts: Vec::new(),
            default_limits: ResourceLimits::default(),
            languages: HashMap::new(),
            admission: AdmissionConfig::default(),
            validation: ValidationConfig::default(),
            server: ServerConfig::default(),
            workspace: WorkspaceConfig::default(),
        }
    }

    /// Get a language policy by its configuration ID (the lowercase
    /// language tag used as the TOML table key).
    pub fn get_language(&self, id: &str) -> Result<&LanguagePolicy, ConfigError> {
        self.languages
            .get(id)
            .ok_or_else(|| ConfigError::LanguageNotFound(id.to_string()))
    }

    /// Get the path to the isolate binary
    pub fn isolate_binary(&self) -> PathBuf {
        self.isolate_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("isolate"))
    }

    /// Merge resource limits with defaults
    pub fn effective_limits(&self, overrides: Option<&ResourceLimits>) -> ResourceLimits {
        match overrides {
            Some(limits) => self.default_limits.with_overrides(limits),
            None => self.default_limits.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_cg_root() -> PathBuf {
    PathBuf::from("/sys/fs/cgroup/isolate")
}

/// Admission ceiling and workspace root — [`crate::admission::AdmissionController`]
/// settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum number of concurrently in-flight judgments before new
    /// requests are throttled with 429.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
        }
    }
}

fn default_max_requests() -> usize {
    16
}

/// Bounds enforced by [`crate::validator`] before any sandbox work begins.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_time")]
    pub min_execution_time: f64,
    #[serde(default = "default_max_time")]
    pub max_execution_time: f64,
    #[serde(default = "default_min_memory")]
    pub min_execution_memory: u64,
    #[serde(default = "default_max_memory")]
    pub max_execution_memory: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_execution_time: default_min_time(),
            max_execution_time: default_max_time(),
            min_execution_memory: default_min_memory(),
            max_execution_memory: default_max_memory(),
        }
    }
}

fn default_min_time() -> f64 {
    1.0
}
fn default_max_time() -> f64 {
    15.0
}
fn default_min_memory() -> u64 {
    1
}
fn default_max_memory() -> u64 {
    10_000
}

/// HTTP gateway bind settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_owned()
}

/// Per-Execution workspace root and retention policy.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory under which each Execution gets its own subdirectory.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,

    /// Whether to recursively remove the workspace (and sandbox box) once a
    /// verdict has been emitted. Set `false` to retain artifacts for
    /// post-mortem debugging.
    #[serde(default = "default_true")]
    pub delete_on_exit: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            delete_on_exit: true,
        }
    }
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("/tmp/judgehouse/workspaces")
}

fn default_true() -> bool {
    true
}
