use std::io;
use thiserror::Error;

/// Errors raised while producing or querying a package schema
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The plugin exists but cannot hand out its schema.
    #[error("it looks like GetSchema is not implemented")]
    GetSchemaNotImplemented,

    #[error("Plugin '{0}' not found")]
    PluginNotFound(String),

    #[error("Plugin host is closed")]
    HostClosed,

    #[error("Schema load cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid schema: {0}")]
    Invalid(String),
}

impl SchemaError {
    /// True for the sentinel reported when a plugin does not serve schemas
    pub fn is_get_schema_not_implemented(&self) -> bool {
        matches!(self, SchemaError::GetSchemaNotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(SchemaError::GetSchemaNotImplemented.is_get_schema_not_implemented());
        assert!(!SchemaError::Cancelled.is_get_schema_not_implemented());
    }

    #[test]
    fn test_plugin_not_found_display() {
        let err = SchemaError::PluginNotFound("aws@6.0.0".to_string());
        assert_eq!(err.to_string(), "Plugin 'aws@6.0.0' not found");
    }
}
