//! Session lifecycle, script runs and configuration

mod common;

use common::capture_session;
use nut::{CallError, ConfigError, ScriptStatus, Session, SessionConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_script_updates_root_table() {
    let session = Session::new();
    assert_eq!(session.run_script("x <- 6 * 7;"), ScriptStatus::Completed);
    assert_eq!(session.global::<i64>("x"), Some(42));
}

#[rstest]
#[case::compile("x <- ;", ScriptStatus::CompileFailed)]
#[case::unterminated("x <- \"open;", ScriptStatus::CompileFailed)]
#[case::runtime("missing_function();", ScriptStatus::ExecutionFailed)]
#[case::thrown("throw \"stop\";", ScriptStatus::ExecutionFailed)]
#[case::division("x <- 1 / 0;", ScriptStatus::ExecutionFailed)]
fn test_failures_are_reported_not_raised(#[case] source: &str, #[case] expected: ScriptStatus) {
    let (session, _, errors) = capture_session();
    session.stack().push("residue check");

    assert_eq!(session.run_script(source), expected);
    assert!(!errors.borrow().is_empty());
    assert_eq!(session.stack().top(), 1);

    assert_eq!(session.run_script("ok <- true;"), ScriptStatus::Completed);
    assert_eq!(session.global::<bool>("ok"), Some(true));
}

#[test]
fn test_runtime_error_names_label_and_line() {
    let (session, _, errors) = capture_session();
    let status = session.run_script_named("x <- 1;\nthrow \"bad state\";", "level.nut");
    assert_eq!(status, ScriptStatus::ExecutionFailed);
    assert_eq!(errors.borrow().as_slice(), ["level.nut:2:1: runtime error: bad state"]);
}

#[test]
fn test_print_reaches_sink() {
    let (session, printed, _) = capture_session();
    session.run_script("print(\"hello\"); print(1 + 2);");
    assert_eq!(*printed.borrow(), vec!["hello", "3"]);
}

#[test]
fn test_call_script_function() {
    let session = Session::new();
    session.run_script("function label(name, n) { return name + \"#\" + n; }");

    let result: Result<String, _> = session.call("label", ("unit", 7_i64));
    assert_eq!(result, Ok("unit#7".to_string()));

    let wrong: Result<f64, _> = session.call("label", ("unit", 7_i64));
    assert!(matches!(wrong, Err(CallError::ResultType(_))));
    assert_eq!(session.stack().top(), 0);
}

#[test]
fn test_call_depth_limit_comes_from_config() {
    common::init_tracing();
    let config = SessionConfig::new().with_max_call_depth(8);
    let session = Session::with_config(config).unwrap();
    session.run_script("function down(n) { if (n == 0) { return 0; } return down(n - 1); }");

    assert_eq!(session.call::<_, i64>("down", 4_i64), Ok(0));
    match session.call::<_, i64>("down", 50_i64) {
        Err(CallError::Runtime { source, .. }) => assert!(source.to_string().contains("stack overflow")),
        other => panic!("expected stack overflow, got {:?}", other),
    }
}

/// Run `source` with default limits on a thread with a 2 MiB stack
fn run_on_small_stack(source: String) -> (ScriptStatus, Vec<String>) {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let (session, _, errors) = capture_session();
            let status = session.run_script(&source);
            assert_eq!(session.run_script("after <- 1;"), ScriptStatus::Completed);
            let reported = errors.borrow().clone();
            (status, reported)
        })
        .unwrap()
        .join()
        .unwrap()
}

#[rstest]
#[case::within_limit(250, ScriptStatus::Completed)]
#[case::past_limit(300, ScriptStatus::ExecutionFailed)]
fn test_deep_recursion_respects_call_depth(#[case] depth: usize, #[case] expected: ScriptStatus) {
    assert_eq!(nut::acorn::DEFAULT_MAX_CALL_DEPTH, 256);
    let source = format!(
        "function f(n) {{ if (n < 1) return 0; return f(n - 1) + 1; }} r <- f({});",
        depth
    );

    let (status, errors) = run_on_small_stack(source);
    assert_eq!(status, expected);
    if expected == ScriptStatus::Completed {
        assert!(errors.is_empty());
    } else {
        assert!(errors[0].contains("stack overflow"), "unexpected report: {}", errors[0]);
    }
}

#[rstest]
#[case::parentheses(format!("r <- {}1{};", "(".repeat(100_000), ")".repeat(100_000)), "expression nested too deeply")]
#[case::blocks("{".repeat(100_000), "statement nested too deeply")]
fn test_deep_nesting_fails_to_compile(#[case] source: String, #[case] message: &str) {
    let (status, errors) = run_on_small_stack(source);
    assert_eq!(status, ScriptStatus::CompileFailed);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("error[AC1006]"), "unexpected report: {}", errors[0]);
    assert!(errors[0].contains(message));
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "initial_stack_size = 64").unwrap();
    writeln!(file, "default_label = \"from-file.nut\"").unwrap();

    let config = SessionConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.initial_stack_size(), 64);
    assert_eq!(config.max_call_depth(), 256);

    let errors = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&errors);
    let session = Session::builder()
        .config(config)
        .on_error(move |text| sink.borrow_mut().push(text.to_string()))
        .build()
        .unwrap();
    session.run_script("throw \"x\";");
    assert!(errors.borrow()[0].starts_with("from-file.nut:1:1"));
}

#[test]
fn test_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        SessionConfig::load_from_file(&missing),
        Err(ConfigError::NotFound(path)) if path == missing
    ));

    let mut bad = NamedTempFile::new().unwrap();
    writeln!(bad, "initial_stack_size = \"big\"").unwrap();
    assert!(matches!(
        SessionConfig::load_from_file(bad.path()),
        Err(ConfigError::TomlParseError { .. })
    ));

    let mut small = NamedTempFile::new().unwrap();
    writeln!(small, "initial_stack_size = 2").unwrap();
    assert!(matches!(
        SessionConfig::load_from_file(small.path()),
        Err(ConfigError::InvalidValue { .. })
    ));
}
