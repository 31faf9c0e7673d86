use slf::{
    CancelToken, Config, DEFAULT_FILE_NAME_FORMAT, DEFAULT_KEEP_LOGFILES, DEFAULT_MAX_FILE_SIZE,
    Error, Sink, WriterSink,
};

#[test]
fn test_defaults() {
    let config = Config::builder().build().unwrap();
    assert_eq!(config.path(), std::path::Path::new("./logs"));
    assert_eq!(config.file_name_format(), DEFAULT_FILE_NAME_FORMAT);
    assert_eq!(config.max_file_size(), DEFAULT_MAX_FILE_SIZE);
    assert_eq!(config.keep_logfiles(), Some(DEFAULT_KEEP_LOGFILES));
    assert!(config.cipher().is_none());
    // the app name falls back to the executable name, never empty
    assert!(!config.app_name().is_empty());
}

#[test]
fn test_zero_size_cap_is_rejected() {
    let err = Config::builder().max_file_size(0).build().unwrap_err();
    assert!(matches!(err, Error::InvalidArg(_)));
}

#[test]
fn test_explicit_options_stick() {
    let config = Config::builder()
        .app_name("configured")
        .path("/tmp/elsewhere")
        .file_name_format("{app-name}.log")
        .max_file_size(1024)
        .keep_logfiles(None)
        .console_beautified(true)
        .build()
        .unwrap();
    assert_eq!(config.app_name(), "configured");
    assert_eq!(config.path(), std::path::Path::new("/tmp/elsewhere"));
    assert_eq!(config.file_name_format(), "{app-name}.log");
    assert_eq!(config.max_file_size(), 1024);
    assert_eq!(config.keep_logfiles(), None);
}

#[test]
fn test_default_registry_covers_builtins() {
    let config = Config::builder().build().unwrap();
    let registry = config.formatters();
    assert!(registry.get(slf::DetailKind::Message).is_some());
    assert!(registry.get(slf::DetailKind::Binary).is_some());
    assert!(registry.get(slf::DetailKind::EventId).is_some());
    assert!(registry.get(slf::DetailKind::Exception).is_some());
    assert!(registry.get(slf::DetailKind::Hierarchy).is_none());
}

#[test]
fn test_writer_sink_collects_text() {
    let cancel = CancelToken::new();
    let mut sink = WriterSink::new(Vec::new());
    sink.write("one\n", &cancel).unwrap();
    sink.write("two\n", &cancel).unwrap();
    sink.flush(&cancel).unwrap();
    assert_eq!(sink.into_inner(), b"one\ntwo\n");
}

#[test]
fn test_writer_sink_honours_cancellation() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut sink = WriterSink::new(Vec::new());
    assert!(matches!(
        sink.write("x", &cancel),
        Err(Error::Cancelled)
    ));
}
