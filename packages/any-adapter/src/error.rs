use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnyError {
    /// The dynamic value is not of the requested type.
    #[error("value is not a {expected}")]
    TypeMismatch { expected: &'static str },
}
