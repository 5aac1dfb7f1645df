use cape_derive::cape_error;
use std::borrow::Cow;

#[cape_error]
pub enum StoreError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Record {id} not found{}", format_context(.context))]
    NotFound { id: i64, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn failing_io() -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk unplugged"))
}

#[test]
fn cape_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/cape_error_pass.rs");
}

#[test]
fn source_conversion_has_no_context() {
    let error: StoreError = std::io::Error::other("disk unplugged").into();

    assert!(matches!(error, StoreError::Io { context: None, .. }));
    assert_eq!(error.to_string(), "IO error: disk unplugged");
}

#[test]
fn ext_trait_wraps_source_with_context() {
    let error = failing_io().context("Reading snapshot").unwrap_err();

    assert_eq!(error.to_string(), "IO error (Reading snapshot): disk unplugged");
}

#[test]
fn ext_trait_replaces_context_on_own_errors() {
    let result: Result<(), StoreError> =
        Err(StoreError::NotFound { id: 7, context: Some("first".into()) });

    let error = result.context("second").unwrap_err();

    assert_eq!(error.to_string(), "Record 7 not found (second)");
}

#[test]
fn strings_become_internal_errors() {
    let borrowed: StoreError = "pool exhausted".into();
    let owned: StoreError = String::from("lock poisoned").into();

    assert_eq!(borrowed.to_string(), "Internal error: pool exhausted");
    assert!(matches!(owned, StoreError::Internal { message: Cow::Owned(_), context: None }));
}

#[test]
fn with_context_is_chainable() {
    let error = StoreError::from("boom").with_context("Flushing");

    assert_eq!(error.to_string(), "Internal error (Flushing): boom");
}
