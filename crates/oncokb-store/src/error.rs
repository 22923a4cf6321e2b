use thiserror::Error;

/// Failures reading upstream values inside a producer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("node `{0}` is not a declared upstream of this producer")]
    UndeclaredUpstream(String),

    #[error("node `{0}` holds a value of a different type")]
    TypeMismatch(String),
}
