use kia_uvo::error::UvoError;

#[test]
fn error_constructors() {
    assert!(matches!(UvoError::config("x"), UvoError::Config { .. }));
    assert!(matches!(UvoError::io("x"), UvoError::Io { .. }));
    assert!(matches!(UvoError::network("x"), UvoError::Network { .. }));
    assert!(matches!(UvoError::api("x"), UvoError::Api { .. }));
    assert!(matches!(UvoError::auth("x"), UvoError::Auth { .. }));
    assert!(matches!(
        UvoError::validation("f", "m"),
        UvoError::Validation { .. }
    ));
    assert!(matches!(UvoError::timeout("x"), UvoError::Timeout { .. }));
    assert!(matches!(UvoError::generic("x"), UvoError::Generic { .. }));
}

#[test]
fn display_messages() {
    assert_eq!(
        UvoError::auth("bad password").to_string(),
        "Authentication error: bad password"
    );
    assert!(UvoError::validation("field", "bad")
        .to_string()
        .contains("Validation error"));
}
