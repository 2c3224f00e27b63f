//! Judging core: sandboxed compile-and-run pipeline for online judge submissions.
//!
//! This crate has no HTTP or config-file-format dependency in its own API: it
//! exposes a [`Service`](service::Service) that a transport (the `judgehouse`
//! binary's HTTP gateway, or a one-shot CLI command) drives directly. It
//! validates a [`Request`](service::Request), admits it under a concurrency
//! ceiling, runs it through an IOI Isolate sandbox, and classifies the result
//! into a terminal [`Verdict`](verdict::Verdict).
//!
//! # Features
//!
//! - **Sandboxed execution** — pool-based lifecycle for running untrusted code safely using Isolate.
//! - **Multi-language** — a closed [`Language`] enum bound to a per-language [`LanguagePolicy`].
//! - **TOML configuration** — layered, embedded-default-plus-override configuration.
//! - **Admission control** — a semaphore-backed ceiling on concurrent judgments, with throttle metrics.
//! - **Resource limits** — enforce CPU time, memory, wall time, processes, and output constraints.
//! - **cgroup v2 support** — memory limiting in container environments.

pub use admission::{AdmissionController, AdmissionError, AdmissionPermit};
pub use config::{Config, ConfigError, EXAMPLE_CONFIG, LanguagePolicy};
pub use execution::{Execution, ExecutionError};
pub use isolate::{BoxPool, IsolateBox, IsolateError, prepare_cgroup};
pub use language::{Language, LanguageRegistry, UnknownLanguage};
pub use runner::{
    CompileAndRunError, CompileAndRunRequest, CompileError, CompileResult, ExecuteError, Runner,
};
pub use service::{GatewayError, Request, Response, Service};
pub use types::{ExecutionResult, ExecutionStatus, LimitExceeded, MountConfig, ResourceLimits};
pub use validator::{ValidationError, validate};
pub use verdict::{BuildResult, RunResult, Verdict, classify, normalize_output};

pub mod admission;
pub mod config;
pub mod execution;
pub mod isolate;
pub mod language;
pub mod runner;
pub mod service;
pub mod types;
pub mod validator;
pub mod verdict;
