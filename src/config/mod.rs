pub mod credential;
pub mod prompt;
