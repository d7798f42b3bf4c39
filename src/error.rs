use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradeError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GradeError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        GradeError::InvalidInput(reason.into())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid admin credentials")]
    InvalidCredentials,
    #[error("email address is required")]
    MissingEmail,
}
