//! Composition root: wires validation, admission, the sandbox driver, and
//! the classifier into one call a transport can drive.
//!
//! [`Service::judge`] is the single entry point both the HTTP gateway and the
//! CLI's one-shot commands call. It owns no transport concerns — it returns
//! a [`GatewayError`] that a caller maps to whatever status surface it has
//! (HTTP status codes for the gateway, a process exit code for the CLI).

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::admission::{AdmissionController, AdmissionError};
use crate::config::{Config, LanguagePolicy};
use crate::execution::{Execution, ExecutionError};
use crate::isolate::BoxPool;
use crate::language::{Language, LanguageRegistry};
use crate::runner::{CompileError, ExecuteError, Runner};
use crate::types::{ExecutionStatus, LimitExceeded, ResourceLimits};
use crate::validator::ValidationError;
use crate::verdict::{BuildResult, RunResult, Verdict, classify};

/// A validated submission, ready for admission. Constructed only by
/// [`crate::validator::validate`].
#[derive(Debug, Clone)]
pub struct Request {
    pub language: Language,
    pub source: Vec<u8>,
    pub expected_output: Vec<u8>,
    pub input: Option<Vec<u8>>,
    pub time_limit: f64,
    pub memory_limit_mb: u64,
}

/// The HTTP-facing response shape: `{ statusCode, status, output? }`. The
/// `error` field of the full JSON contract is added by the transport layer
/// only for a [`GatewayError`] path; a completed judgment never has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u32,
    pub status: String,
    pub output: Option<String>,
}

impl From<Verdict> for Response {
    fn from(verdict: Verdict) -> Self {
        Response {
            status_code: verdict.status_code(),
            status: verdict.status().to_string(),
            output: verdict.output().map(str::to_string),
        }
    }
}

/// The HTTP-facing error union every pipeline error funnels into before
/// being turned into a response. Submission-caused failures never reach
/// here — those are [`Verdict`]s. Only validation, throttling, and
/// infrastructure faults do.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 400. Validation failed before any sandbox work began.
    #[error("{0}")]
    BadRequest(#[from] ValidationError),

    /// 429. The admission ceiling was already saturated.
    #[error("Request throttled, service reached max allowed requests")]
    Throttled(#[from] AdmissionError),

    /// 500. The sandbox engine itself failed, independent of the submitted program.
    #[error("sandbox unavailable: {0}")]
    SandboxUnavailable(String),

    /// 500. Any other unexpected fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ExecutionError> for GatewayError {
    fn from(err: ExecutionError) -> Self {
        GatewayError::SandboxUnavailable(err.to_string())
    }
}

impl From<CompileError> for GatewayError {
    fn from(err: CompileError) -> Self {
        GatewayError::SandboxUnavailable(err.to_string())
    }
}

impl From<ExecuteError> for GatewayError {
    fn from(err: ExecuteError) -> Self {
        GatewayError::SandboxUnavailable(err.to_string())
    }
}

/// Composition root binding a [`Config`], sandbox box pool, language
/// registry, and admission ceiling into one judging pipeline.
#[derive(Debug, Clone)]
pub struct Service {
    config: Config,
    registry: LanguageRegistry,
    admission: AdmissionController,
    pool: std::sync::Arc<BoxPool>,
    runner: Runner,
}

impl Service {
    /// Build a service from `config`. The box pool is sized to
    /// `config.admission.max_requests` boxes starting at box id 0.
    pub fn new(config: Config) -> Self {
        let registry = LanguageRegistry::from_config(&config);
        let admission = AdmissionController::new(config.admission.max_requests);
        let pool = std::sync::Arc::new(BoxPool::new(
            0,
            config.admission.max_requests as u32,
            config.isolate_binary(),
            config.cgroup,
        ));
        let runner = Runner::new(config.clone());
        Self {
            config,
            registry,
            admission,
            pool,
            runner,
        }
    }

    /// The bound configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The bound language registry.
    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Admit, build, run, and classify one submission.
    ///
    /// Releases its admission slot and execution workspace on every exit
    /// path, including sandbox infrastructure errors.
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn judge(&self, request: Request) -> Result<Response, GatewayError> {
        let policy = self
            .registry
            .get(request.language)
            .map_err(|err| GatewayError::Internal(err.to_string()))?
            .clone();

        let permit = self.admission.try_admit()?;
        info!("admitted");

        let limits = self.effective_limits(&request, &policy);
        let execution = Execution::admit(
            &self.config,
            &self.pool,
            request.language,
            policy,
            limits,
            &request.source,
            request.input.as_deref(),
            &request.expected_output,
        )
        .await?;
        let execution_id = execution.id();

        let outcome = self.run_pipeline(&execution, &request).await;
        execution.release().await;
        drop(permit);

        match &outcome {
            Ok(verdict) => info!(execution_id = %execution_id, status = verdict.status(), "verdict emitted"),
            Err(err) => warn!(execution_id = %execution_id, error = %err, "judging failed"),
        }

        outcome.map(Response::from)
    }

    fn effective_limits(&self, request: &Request, policy: &LanguagePolicy) -> ResourceLimits {
        // Every other field stays `None` here deliberately: `ResourceLimits::default()`
        // is *not* an all-`None` value (it carries the library's own baked-in
        // defaults), so `..Default::default()` would make every `with_overrides`
        // call below clobber the config/language-tuned limits for those fields
        // with those baked-in values instead of falling through to them.
        let overrides = ResourceLimits {
            time_limit: Some(request.time_limit),
            memory_limit: Some(request.memory_limit_mb * ResourceLimits::MB),
            wall_time_limit: None,
            stack_limit: None,
            max_processes: None,
            max_output: None,
            max_open_files: None,
            extra_time: None,
        };
        let base = self.config.effective_limits(Some(&overrides));
        match policy.run.limits.as_ref() {
            Some(lang_limits) => base.with_overrides(lang_limits).with_overrides(&overrides),
            None => base,
        }
    }

    async fn run_pipeline(
        &self,
        execution: &Execution,
        request: &Request,
    ) -> Result<Verdict, GatewayError> {
        let policy = execution.policy();
        let limits = execution.limits();
        let sandbox = execution.sandbox();

        let build = if policy.is_compiled() {
            // The build phase runs under its own fixed budget
            // (`default_compile_limits()`), never the submission's own
            // run-time bounds — passing `None` here means `compile::compile`
            // applies only its built-in 30s/60s-wall/512MB defaults (plus any
            // per-language compile limits), independent of `request.time_limit`
            // / `request.memory_limit_mb`.
            let compile_result = self.runner.compile(sandbox, &request.source, policy, None).await?;
            BuildResult {
                ok: compile_result.success,
                output: compile_result.output,
            }
        } else {
            BuildResult::skipped()
        };

        if !build.ok {
            return Ok(classify(&build, None, &request.expected_output));
        }

        let run_result = if policy.is_compiled() {
            self.runner
                .run(sandbox, request.input.as_deref(), policy, Some(limits))
                .await?
        } else {
            self.runner
                .run_interpreted(
                    sandbox,
                    &request.source,
                    request.input.as_deref(),
                    policy,
                    Some(limits),
                )
                .await?
        };

        let run = RunResult {
            timed_out: matches!(run_result.status, ExecutionStatus::TimeLimitExceeded),
            memory_killed: matches!(run_result.limit_exceeded, LimitExceeded::Memory),
            exit_code: run_result.exit_code,
            stdout: run_result.stdout.unwrap_or_default(),
            stderr: run_result.stderr.unwrap_or_default(),
        };

        Ok(classify(&build, Some(&run), &request.expected_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_from_accepted_has_no_output() {
        let response = Response::from(Verdict::Accepted);
        assert_eq!(response.status_code, 1);
        assert_eq!(response.status, "Accepted");
        assert_eq!(response.output, None);
    }

    #[test]
    fn response_from_wrong_answer_carries_output() {
        let response = Response::from(Verdict::WrongAnswer {
            output: "41".to_string(),
        });
        assert_eq!(response.status_code, 2);
        assert_eq!(response.output.as_deref(), Some("41"));
    }

    #[test]
    fn gateway_error_bad_request_message_passes_through() {
        let err = GatewayError::from(ValidationError::UnknownLanguage("cobol".to_string()));
        assert!(err.to_string().contains("cobol"));
    }

    #[test]
    fn gateway_error_throttled_message_is_fixed() {
        let err = GatewayError::from(AdmissionError);
        assert_eq!(
            err.to_string(),
            "Request throttled, service reached max allowed requests"
        );
    }

    #[test]
    fn effective_limits_preserves_language_limits_the_request_never_overrides() {
        use crate::config::{DEFAULT_SANDBOX_PATH, FileExtension, RunConfig};

        let policy = LanguagePolicy {
            name: "Test".to_string(),
            extension: FileExtension::new("t").unwrap(),
            compile: None,
            run: RunConfig {
                command: vec!["./main".to_string()],
                env: Default::default(),
                mounts: vec![],
                path: DEFAULT_SANDBOX_PATH.to_string(),
                limits: Some(ResourceLimits {
                    time_limit: None,
                    wall_time_limit: None,
                    memory_limit: None,
                    stack_limit: None,
                    max_processes: Some(32),
                    max_output: None,
                    max_open_files: None,
                    extra_time: None,
                }),
            },
        };
        let service = Service::new(Config::empty());
        let request = Request {
            language: Language::Cpp,
            source: Vec::new(),
            expected_output: Vec::new(),
            input: None,
            time_limit: 2.0,
            memory_limit_mb: 256,
        };

        let limits = service.effective_limits(&request, &policy);

        // The request never touched max_processes; the language policy's
        // value must survive, not get clobbered by ResourceLimits::default()'s
        // baked-in Some(1) via the request override struct.
        assert_eq!(limits.max_processes, Some(32));
        assert_eq!(limits.time_limit, Some(2.0));
        assert_eq!(limits.memory_limit, Some(256 * ResourceLimits::MB));
    }
}
