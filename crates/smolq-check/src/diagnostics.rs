//! 診断ログ

use crate::CheckError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One logged message; `line` is already corrected for the prelude
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: i64,
    pub severity: Severity,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, {}: {}", self.line, self.severity, self.message)
    }
}

/// Append-only diagnostics of one check
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsLog {
    entries: Vec<Diagnostic>,
    prelude_offset: i64,
}

impl DiagnosticsLog {
    pub fn new(prelude_offset: i64) -> Self {
        Self {
            entries: Vec::new(),
            prelude_offset,
        }
    }

    /// Record a message at raw source line `line`
    pub fn log(&mut self, message: impl Into<String>, line: i64, severity: Severity) {
        let diagnostic = Diagnostic {
            message: message.into(),
            line: line - self.prelude_offset,
            severity,
        };
        match severity {
            Severity::Warning => warn!(line = diagnostic.line, "{}", diagnostic.message),
            Severity::Error => error!(line = diagnostic.line, "{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    pub fn log_error(&mut self, err: &CheckError, line: i64) {
        self.log(err.to_string(), line, err.severity());
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Print every entry unless `silent`; true iff nothing has ERROR severity
    pub fn report(&self, silent: bool) -> bool {
        if !silent {
            for diagnostic in &self.entries {
                println!("{}", diagnostic);
            }
        }
        !self.has_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_only_report_success() {
        let mut log = DiagnosticsLog::new(0);
        log.log("placeholder constants are not supported yet", 3, Severity::Warning);
        assert!(log.report(true));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_error_fails_report() {
        let mut log = DiagnosticsLog::new(0);
        log.log("first", 1, Severity::Warning);
        log.log_error(&CheckError::NonSelectQuery, 2);
        assert!(!log.report(true));
        assert_eq!(log.entries()[1].message, "non-select queries are not supported yet");
        assert_eq!(log.entries()[1].severity, Severity::Error);
    }

    #[test]
    fn test_prelude_offset_applied() {
        let mut log = DiagnosticsLog::new(10);
        log.log("msg", 12, Severity::Error);
        assert_eq!(log.entries()[0].line, 2);
        assert_eq!(log.entries()[0].to_string(), "Line 2, ERROR: msg");
    }

    #[test]
    fn test_empty_log_reports_success() {
        let log = DiagnosticsLog::default();
        assert!(log.is_empty());
        assert!(log.report(false));
    }
}
