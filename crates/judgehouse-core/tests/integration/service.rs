//! End-to-end exercises of the composed [`Service::judge`] pipeline — the
//! HTTP-facing judging path itself, not its individual `Runner`/`IsolateBox`
//! collaborators (covered elsewhere in this directory). Each test below maps
//! directly onto one of the SPEC_FULL §8 end-to-end scenarios (S1-S3).
//!
//! Every `Service` in this file is built with its own `test_config()`, and
//! `Service::new` always starts its box pool at box id 0 — run this file with
//! `--test-threads=1` (in addition to `--include-ignored`) to avoid box id
//! collisions between tests running concurrently.

use judgehouse_core::service::Request;
use judgehouse_core::{Language, Service, Verdict};

use super::{fixture_source, test_config};

fn service() -> Service {
    let mut config = test_config();
    config.admission.max_requests = 1;
    Service::new(config)
}

#[tokio::test]
#[ignore = "requires root"]
async fn s1_accepted() {
    let request = Request {
        language: Language::Cpp,
        source: fixture_source("hello.cpp"),
        expected_output: b"Hello, World!\n".to_vec(),
        input: None,
        time_limit: 10.0,
        memory_limit_mb: 500,
    };

    let response = service().judge(request).await.expect("judging failed");

    assert_eq!(response.status, Verdict::Accepted.status());
    assert_eq!(response.status_code, Verdict::Accepted.status_code());
    assert_eq!(response.output, None);
}

#[tokio::test]
#[ignore = "requires root"]
async fn s2_time_limit_exceeded() {
    let request = Request {
        language: Language::Cpp,
        source: fixture_source("infinite_loop.cpp"),
        expected_output: b"anything\n".to_vec(),
        input: None,
        time_limit: 1.0,
        memory_limit_mb: 500,
    };

    let response = service().judge(request).await.expect("judging failed");

    assert_eq!(response.status, Verdict::TimeLimitExceeded.status());
    assert_eq!(response.status_code, Verdict::TimeLimitExceeded.status_code());
}

#[tokio::test]
#[ignore = "requires root"]
async fn s3_compilation_error() {
    let request = Request {
        language: Language::Cpp,
        source: fixture_source("compile_error.cpp"),
        expected_output: b"anything\n".to_vec(),
        input: None,
        time_limit: 10.0,
        memory_limit_mb: 500,
    };

    let response = service().judge(request).await.expect("judging failed");

    assert_eq!(response.status, Verdict::CompilationError { output: String::new() }.status());
    assert_eq!(
        response.status_code,
        Verdict::CompilationError { output: String::new() }.status_code()
    );
    assert!(response.output.is_some_and(|output| !output.is_empty()));
}

#[tokio::test]
#[ignore = "requires root"]
async fn tight_run_time_limit_does_not_starve_compilation() {
    // A submission that sets the tightest legal run-time limit must still
    // compile under the build budget, not the submission's own run bounds.
    let request = Request {
        language: Language::Cpp,
        source: fixture_source("hello.cpp"),
        expected_output: b"Hello, World!\n".to_vec(),
        input: None,
        time_limit: 1.0,
        memory_limit_mb: 500,
    };

    let response = service().judge(request).await.expect("judging failed");

    assert_eq!(response.status, Verdict::Accepted.status());
}
