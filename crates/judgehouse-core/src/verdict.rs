//! Verdict Classifier (C4): maps a build result and a run result to a
//! terminal [`Verdict`].
//!
//! The classifier is a pure function of its inputs — no I/O, no sandbox
//! handle — so it is unit-testable directly against constructed
//! [`BuildResult`]/[`RunResult`] fixtures rather than real sandbox runs.

use std::borrow::Cow;

/// The build (compile) half of a submission's outcome.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Whether the submission's language requires a build step at all.
    /// Interpreted languages always have `ok: true` here.
    pub ok: bool,
    /// Compiler stdout+stderr, present whether or not the build succeeded.
    pub output: String,
}

impl BuildResult {
    /// The trivial build result for interpreted languages, which have
    /// nothing to compile.
    pub fn skipped() -> Self {
        Self {
            ok: true,
            output: String::new(),
        }
    }
}

/// The run half of a submission's outcome. Absent entirely if the build
/// failed.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The sandboxed program ran past its wall-clock limit.
    pub timed_out: bool,
    /// The sandboxed program was killed for exceeding its memory limit
    /// (either an explicit memory-controller signal, or the 137-without-timeout
    /// fallback the sandbox driver already applies before handing this in).
    pub memory_killed: bool,
    /// Process exit code, if the program exited normally.
    pub exit_code: Option<i32>,
    /// Raw (not yet normalized) captured stdout.
    pub stdout: Vec<u8>,
    /// Raw (not yet normalized) captured stderr.
    pub stderr: Vec<u8>,
}

/// A submission's terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    WrongAnswer { output: String },
    CompilationError { output: String },
    RuntimeError { output: String },
    TimeLimitExceeded,
    OutOfMemory,
}

impl Verdict {
    /// The numeric status code used in the HTTP gateway's JSON response.
    ///
    /// Frozen by the HTTP contract: 1=Accepted, 2=Wrong Answer,
    /// 3=Compilation Error, 4=Runtime Error, 5=Time Limit Exceeded,
    /// 6=Out Of Memory.
    pub fn status_code(&self) -> u32 {
        match self {
            Verdict::Accepted => 1,
            Verdict::WrongAnswer { .. } => 2,
            Verdict::CompilationError { .. } => 3,
            Verdict::RuntimeError { .. } => 4,
            Verdict::TimeLimitExceeded => 5,
            Verdict::OutOfMemory => 6,
        }
    }

    /// The human-readable status string used in the HTTP gateway's JSON response.
    pub fn status(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer { .. } => "Wrong Answer",
            Verdict::CompilationError { .. } => "Compilation Error",
            Verdict::RuntimeError { .. } => "Runtime Error",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::OutOfMemory => "Out Of Memory",
        }
    }

    /// The payload text carried by verdicts that have one (compiler output,
    /// stderr, or actual stdout). `None` for verdicts with no payload.
    pub fn output(&self) -> Option<&str> {
        match self {
            Verdict::WrongAnswer { output }
            | Verdict::CompilationError { output }
            | Verdict::RuntimeError { output } => Some(output),
            Verdict::Accepted | Verdict::TimeLimitExceeded | Verdict::OutOfMemory => None,
        }
    }
}

/// Normalize a captured output stream for comparison.
///
/// - Decodes as UTF-8, replacing invalid sequences with U+FFFD.
/// - Converts `\r\n` to `\n`.
/// - Strips exactly one trailing `\n`, if present.
///
/// Internal whitespace and blank lines are left untouched.
pub fn normalize_output(bytes: &[u8]) -> String {
    let decoded = match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Cow::Owned(s),
        Err(_) => String::from_utf8_lossy(bytes).into_owned().into(),
    };
    let decoded = decoded.replace("\r\n", "\n");
    match decoded.strip_suffix('\n') {
        Some(stripped) => stripped.to_string(),
        None => decoded,
    }
}

/// Classify a submission's outcome into a terminal [`Verdict`].
///
/// `run` is `None` when the build failed (there is nothing to run).
/// Decision order (first match wins), per the classifier contract:
/// compilation failure, then timeout, then OOM, then non-zero exit, then
/// output comparison.
pub fn classify(build: &BuildResult, run: Option<&RunResult>, expected_output: &[u8]) -> Verdict {
    if !build.ok {
        return Verdict::CompilationError {
            output: build.output.trim().to_string(),
        };
    }

    let Some(run) = run else {
        // A successful build always has an accompanying run; treat a missing
        // one defensively as an internal state the classifier can still
        // resolve rather than panicking.
        return Verdict::RuntimeError {
            output: String::new(),
        };
    };

    if run.timed_out {
        return Verdict::TimeLimitExceeded;
    }

    if run.memory_killed || (run.exit_code == Some(137) && !run.timed_out) {
        return Verdict::OutOfMemory;
    }

    if run.exit_code != Some(0) {
        return Verdict::RuntimeError {
            output: normalize_output(&run.stderr).trim().to_string(),
        };
    }

    let actual = normalize_output(&run.stdout);
    let expected = normalize_output(expected_output);
    if actual == expected {
        Verdict::Accepted
    } else {
        Verdict::WrongAnswer { output: actual }
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in ".*") {
            let once = normalize_output(s.as_bytes());
            let twice = normalize_output(once.as_bytes());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn classify_is_deterministic(
            build_ok in any::<bool>(),
            timed_out in any::<bool>(),
            memory_killed in any::<bool>(),
            exit_code in proptest::option::of(-255i32..255),
            stdout in proptest::collection::vec(any::<u8>(), 0..32),
            stderr in proptest::collection::vec(any::<u8>(), 0..32),
            expected in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            let build = BuildResult { ok: build_ok, output: String::new() };
            let run = RunResult { timed_out, memory_killed, exit_code, stdout, stderr };
            let run = if build_ok { Some(&run) } else { None };
            let first = classify(&build, run, &expected);
            let second = classify(&build, run, &expected);
            prop_assert_eq!(first, second);
        }
    }
}
