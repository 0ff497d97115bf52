use std::io;
use thiserror::Error;

/// Errors that can occur while building a template from source
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse template YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid template at '{path}': {message}")]
    Invalid { path: String, message: String },
}

impl TemplateError {
    pub(crate) fn invalid(path: &str, message: impl Into<String>) -> Self {
        TemplateError::Invalid {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
