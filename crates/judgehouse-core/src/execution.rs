//! Execution Object (C3): the per-submission sandbox lifecycle.
//!
//! An [`Execution`] binds one admitted submission to one workspace directory
//! on disk and one borrowed [`IsolateBox`], and guarantees both are released
//! no matter which path the submission takes out of the pipeline (a verdict,
//! a sandbox error, or a panic unwinding through the caller).

use std::path::PathBuf;

use thiserror::Error;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::{Config, LanguagePolicy};
use crate::isolate::{BoxPool, IsolateBox, IsolateError};
use crate::language::Language;
use crate::types::ResourceLimits;

/// Errors raised while materializing or tearing down an [`Execution`].
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("workspace I/O error at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sandbox error: {0}")]
    Sandbox(#[from] IsolateError),
}

/// A live submission: one workspace directory plus one borrowed isolate box.
///
/// Constructed by [`Execution::admit`] after the [`crate::admission`] ceiling
/// and [`crate::validator`] checks have passed. Always call
/// [`release`](Self::release) when done with it. The `Drop` impl only
/// attempts a best-effort, synchronous workspace cleanup as a backstop (the
/// same pattern [`IsolateBox`] uses for the sandbox box itself) — it is not a
/// substitute for calling `release()`.
#[derive(Debug)]
pub struct Execution {
    id: Uuid,
    workspace_path: PathBuf,
    policy: LanguagePolicy,
    language: Language,
    limits: ResourceLimits,
    sandbox: IsolateBox,
    delete_on_exit: bool,
    released: bool,
}

impl Execution {
    /// Create the on-disk workspace, persist audit copies of the submission,
    /// and acquire a sandbox box from `pool`.
    ///
    /// `limits` should already be the fully-merged effective limits (config
    /// defaults, then language policy, then the request's own overrides) with
    /// `memory_limit` already converted from the request's megabytes to the
    /// kilobytes [`ResourceLimits`] expects — see [`ResourceLimits::MB`].
    #[instrument(skip(config, pool, policy, source, input, expected_output))]
    pub async fn admit(
        config: &Config,
        pool: &BoxPool,
        language: Language,
        policy: LanguagePolicy,
        limits: ResourceLimits,
        source: &[u8],
        input: Option<&[u8]>,
        expected_output: &[u8],
    ) -> Result<Self, ExecutionError> {
        let id = Uuid::new_v4();
        let workspace_path = config.workspace.root.join(id.to_string());
        tokio::fs::create_dir_all(&workspace_path)
            .await
            .map_err(|source| ExecutionError::Workspace {
                path: workspace_path.clone(),
                source,
            })?;

        // From here on, any failure (audit file write, box pool exhaustion)
        // must remove the workspace directory just created above — no
        // `Execution` value exists yet to do it via `release()`/`Drop`.
        match Self::materialize(&workspace_path, pool, &policy, source, input, expected_output)
            .await
        {
            Ok(sandbox) => Ok(Self {
                id,
                workspace_path,
                policy,
                language,
                limits,
                sandbox,
                delete_on_exit: config.workspace.delete_on_exit,
                released: false,
            }),
            Err(err) => {
                if let Err(cleanup_err) = tokio::fs::remove_dir_all(&workspace_path).await {
                    warn!(
                        execution_id = %id,
                        path = %workspace_path.display(),
                        error = %cleanup_err,
                        "failed to clean up workspace after a failed admission"
                    );
                }
                Err(err)
            }
        }
    }

    async fn materialize(
        workspace_path: &PathBuf,
        pool: &BoxPool,
        policy: &LanguagePolicy,
        source: &[u8],
        input: Option<&[u8]>,
        expected_output: &[u8],
    ) -> Result<IsolateBox, ExecutionError> {
        write_audit_file(workspace_path, &policy.source_name(), source).await?;
        if let Some(input) = input {
            write_audit_file(workspace_path, "input.txt", input).await?;
        }
        write_audit_file(workspace_path, "expected_output.txt", expected_output).await?;

        Ok(pool.acquire().await?)
    }

    /// The submission's unique id, also used as the workspace directory name.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The on-disk directory holding audit copies of this submission's files.
    pub fn workspace_path(&self) -> &PathBuf {
        &self.workspace_path
    }

    /// The declared language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// The language policy bound for this submission.
    pub fn policy(&self) -> &LanguagePolicy {
        &self.policy
    }

    /// The effective, already-merged resource limits for this submission.
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// The borrowed sandbox box.
    pub fn sandbox(&self) -> &IsolateBox {
        &self.sandbox
    }

    /// Release the workspace directory and sandbox box.
    ///
    /// Safe to call exactly once; consumes `self` so a second call is a
    /// compile error rather than a runtime one. Errors are logged, not
    /// returned — a failed release should not change the verdict already
    /// computed for the submission.
    #[instrument(skip(self))]
    pub async fn release(mut self) {
        self.release_mut().await;
    }

    async fn release_mut(&mut self) {
        if let Err(err) = self.sandbox.cleanup().await {
            warn!(execution_id = %self.id, error = %err, "failed to clean up sandbox box");
        }
        if self.delete_on_exit
            && let Err(err) = tokio::fs::remove_dir_all(&self.workspace_path).await
        {
            warn!(
                execution_id = %self.id,
                path = %self.workspace_path.display(),
                error = %err,
                "failed to remove execution workspace"
            );
        }
        self.released = true;
    }
}

impl Drop for Execution {
    fn drop(&mut self) {
        if self.released || !self.delete_on_exit {
            return;
        }
        warn!(
            execution_id = %self.id,
            path = %self.workspace_path.display(),
            "Execution dropped without explicit release()! \
             Attempting best-effort synchronous workspace cleanup."
        );
        if let Err(err) = std::fs::remove_dir_all(&self.workspace_path) {
            warn!(
                execution_id = %self.id,
                error = %err,
                "best-effort workspace cleanup failed"
            );
        }
        // The sandbox box is dropped right after this impl returns; IsolateBox's
        // own Drop logs and attempts best-effort cleanup if it is still initialized.
    }
}

async fn write_audit_file(
    workspace_path: &PathBuf,
    name: &str,
    content: &[u8],
) -> Result<(), ExecutionError> {
    let path = workspace_path.join(name);
    tokio::fs::write(&path, content)
        .await
        .map_err(|source| ExecutionError::Workspace { path, source })
}
