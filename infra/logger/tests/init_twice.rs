use kw_logger::{Logger, LoggerError};

#[test]
fn second_init_is_rejected() {
    let logger = Logger::builder().name("kuwaiba-first").init().expect("first init");
    assert!(!logger.writes_files());

    let err = Logger::builder().name("kuwaiba-second").init().expect_err("second init");
    assert!(matches!(err, LoggerError::Subscriber { .. }));
}
