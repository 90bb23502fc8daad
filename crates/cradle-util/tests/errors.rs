use cradle_util::errors::CradleError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = CradleError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_descriptor_error_display() {
    let err = CradleError::Descriptor {
        message: "missing build.gradle.kts".to_string(),
    };
    assert_eq!(err.to_string(), "Descriptor error: missing build.gradle.kts");
}

#[test]
fn test_config_error_display() {
    let err = CradleError::Config {
        message: "bad table".to_string(),
    };
    assert_eq!(err.to_string(), "Configuration error: bad table");
}

#[test]
fn test_generic_error_display() {
    let err = CradleError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: CradleError = io_err.into();
    assert!(matches!(err, CradleError::Io(_)));
}
