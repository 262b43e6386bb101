//! Shared helpers for nut integration tests

#![allow(dead_code)]

use nut::Session;
use std::cell::RefCell;
use std::rc::Rc;

/// Lines sent to a session sink
pub type Captured = Rc<RefCell<Vec<String>>>;

/// Route `tracing` output to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Session whose print and error sinks record every message
pub fn capture_session() -> (Session, Captured, Captured) {
    init_tracing();
    let printed: Captured = Rc::new(RefCell::new(Vec::new()));
    let errors: Captured = Rc::new(RefCell::new(Vec::new()));
    let print_sink = Rc::clone(&printed);
    let error_sink = Rc::clone(&errors);

    let session = Session::builder()
        .on_print(move |text| print_sink.borrow_mut().push(text.to_string()))
        .on_error(move |text| error_sink.borrow_mut().push(text.to_string()))
        .build()
        .expect("default configuration is valid");
    (session, printed, errors)
}
