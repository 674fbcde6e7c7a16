use std::env;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{0} is missing. Check your .env file.")]
    Missing(String),
}

/// Reads `name` from the process environment. Unset and blank values are
/// both treated as absent.
pub fn load_credential(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn require_credential(name: &str) -> Result<String, CredentialError> {
    load_credential(name).ok_or_else(|| CredentialError::Missing(name.to_string()))
}
