use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("Member not found: {name}")]
    MemberNotFound { name: String },
    #[error("Member is not callable: {name}")]
    NotCallable { name: String },
    #[error("Member is read-only: {name}")]
    ReadOnly { name: String },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Type mismatch: expected {expected}, found {found}")]
    Type { expected: &'static str, found: &'static str },
    #[error("Execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, BuilderError>;

impl From<config::ConfigError> for BuilderError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
