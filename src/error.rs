//! Error types for the report pipeline.
//!
//! Every variant is fatal: the binary prints the message to stderr and
//! exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, aggregating or writing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The database could not be reached or refused the login
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// A query failed or returned rows that do not match the expected schema
    #[error("Database query failed: {0}")]
    Query(String),

    /// The report could not be written to its destination
    #[error("Failed to write report to {}: {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTML template failed to compile or render
    #[error("Failed to render report template: {0}")]
    Template(#[from] minijinja::Error),

    /// JSON encoding of the report failed
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ReportError {
    /// Classify a driver error raised while executing a query.
    ///
    /// I/O and TLS failures mid-query mean the server went away, which is
    /// still a connection problem rather than a schema mismatch.
    pub fn from_query(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                ReportError::Connection(err.to_string())
            }
            other => ReportError::Query(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_classified() {
        let err = ReportError::from_query(sqlx::Error::ColumnNotFound("showdate".to_string()));
        assert!(matches!(err, ReportError::Query(_)));
        assert!(err.to_string().contains("showdate"));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = ReportError::from_query(sqlx::Error::Io(io));
        assert!(matches!(err, ReportError::Connection(_)));
    }

    #[test]
    fn test_render_error_message() {
        let err = ReportError::Render {
            path: PathBuf::from("/nope/report.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("/nope/report.html"));
        assert!(message.contains("denied"));
    }
}
