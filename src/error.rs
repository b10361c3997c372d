use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Serialisable discriminant of a [`WarehouseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedRequest,
    ResourceNotFound,
    EngineExecution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedRequest => "MalformedRequest",
            ErrorKind::ResourceNotFound => "ResourceNotFound",
            ErrorKind::EngineExecution => "EngineExecutionError",
        };
        f.write_str(name)
    }
}

/// Failure of a single warehouse job. `target` is the table id or source uri
/// the job was working on.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("malformed request for {target}: {message}")]
    MalformedRequest { target: String, message: String },

    #[error("resource not found for {target}: {message}")]
    ResourceNotFound { target: String, message: String },

    #[error("engine execution failed for {target}: {message}")]
    EngineExecution { target: String, message: String },
}

impl WarehouseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WarehouseError::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            WarehouseError::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            WarehouseError::EngineExecution { .. } => ErrorKind::EngineExecution,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            WarehouseError::MalformedRequest { target, .. }
            | WarehouseError::ResourceNotFound { target, .. }
            | WarehouseError::EngineExecution { target, .. } => target,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WarehouseError::MalformedRequest { message, .. }
            | WarehouseError::ResourceNotFound { message, .. }
            | WarehouseError::EngineExecution { message, .. } => message,
        }
    }

    pub fn new(kind: ErrorKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        let target = target.into();
        let message = message.into();
        match kind {
            ErrorKind::MalformedRequest => WarehouseError::MalformedRequest { target, message },
            ErrorKind::ResourceNotFound => WarehouseError::ResourceNotFound { target, message },
            ErrorKind::EngineExecution => WarehouseError::EngineExecution { target, message },
        }
    }

    /// Map a DuckDB failure onto the error taxonomy
    pub fn from_engine(target: impl Into<String>, err: &duckdb::Error) -> Self {
        let message = err.to_string();
        Self::new(classify_message(&message), target, message)
    }
}

// DuckDB prefixes every error with its class, e.g. "Binder Error: ...".
// Only the class and the start of the detail are inspected, since the rest
// of the message echoes paths and SQL text.
const MALFORMED_CLASSES: [&str; 7] = [
    "parser error",
    "binder error",
    "conversion error",
    "invalid input error",
    "constraint error",
    "syntax error",
    "mismatch type error",
];

const NOT_FOUND_CLASSES: [&str; 1] = ["catalog error"];

// IO and HTTP errors are only a missing resource for these details
const MISSING_SOURCE_DETAILS: [&str; 2] = ["no files found", "cannot open file"];

/// Classify an engine message by its DuckDB error class
pub fn classify_message(message: &str) -> ErrorKind {
    let lowered = message.trim_start().to_lowercase();
    let Some((class, detail)) = lowered.split_once(": ") else {
        return ErrorKind::EngineExecution;
    };

    if MALFORMED_CLASSES.contains(&class) || class.starts_with("csv error") {
        ErrorKind::MalformedRequest
    } else if NOT_FOUND_CLASSES.contains(&class) {
        ErrorKind::ResourceNotFound
    } else if (class == "io error" || class == "http error")
        && (MISSING_SOURCE_DETAILS.iter().any(|d| detail.starts_with(d))
            || detail.contains("(http 404)")
            || detail.starts_with("http 404"))
    {
        ErrorKind::ResourceNotFound
    } else {
        ErrorKind::EngineExecution
    }
}

/// Problems reading or validating the pipeline configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let msg = r#"IO Error: No files found that match the pattern "/tmp/x/distributor_1/stock/2024-01-01.csv""#;
        assert_eq!(classify_message(msg), ErrorKind::ResourceNotFound);
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let msg = "Catalog Error: Table with name temp_fechas does not exist!";
        assert_eq!(classify_message(msg), ErrorKind::ResourceNotFound);
    }

    #[test]
    fn test_csv_problems_are_malformed() {
        let msg = "Invalid Input Error: CSV Error on Line: 2\nExpected Number of Columns: 7 Found: 8";
        assert_eq!(classify_message(msg), ErrorKind::MalformedRequest);
        let msg = "Conversion Error: Could not convert string 'abc' to INT64";
        assert_eq!(classify_message(msg), ErrorKind::MalformedRequest);
    }

    #[test]
    fn test_binder_not_found_column_is_malformed() {
        let msg = r#"Binder Error: Referenced column "ciudad_x" not found in FROM clause!"#;
        assert_eq!(classify_message(msg), ErrorKind::MalformedRequest);
    }

    #[test]
    fn test_http_404_is_not_found() {
        let msg = "HTTP Error: HTTP GET error on 'https://host/distributor_1/stock/2024-05-01.csv' (HTTP 404)";
        assert_eq!(classify_message(msg), ErrorKind::ResourceNotFound);
    }

    #[test]
    fn test_path_text_does_not_change_class() {
        let msg = "Out of Memory Error: failed reading /data/distributor_404/stock/not found.csv";
        assert_eq!(classify_message(msg), ErrorKind::EngineExecution);
        let msg = "IO Error: Read failed for /data/distributor_404/csv error/2024-05-01.csv";
        assert_eq!(classify_message(msg), ErrorKind::EngineExecution);
    }

    #[test]
    fn test_unknown_is_engine_execution() {
        assert_eq!(classify_message("Out of Memory Error: failed to allocate"), ErrorKind::EngineExecution);
    }

    #[test]
    fn test_error_accessors() {
        let err = WarehouseError::new(ErrorKind::ResourceNotFound, "p.d.t", "gone");
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(err.target(), "p.d.t");
        assert_eq!(err.message(), "gone");
        assert_eq!(err.to_string(), "resource not found for p.d.t: gone");
        assert_eq!(ErrorKind::EngineExecution.to_string(), "EngineExecutionError");
    }
}
