// Copyright (C) Brian G. Milnes 2025

//! Diagnostics reported by a migration run

pub mod diagnostics {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Diagnostic {
        pub kind: DiagnosticKind,
        pub message: String,
        pub severity: Severity,
        pub line: usize,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum DiagnosticKind {
        /// A call reported by a find-only recipe
        SiteFound,
        /// A candidate call site was left as written
        SiteUnchanged,
        /// The replacement did not compile against the symbol table
        TemplateCompileFailure,
        /// The replacement compiled but could not be put in place
        RewriteFailure,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
    pub enum Severity {
        Info,
        Warning,
        Error,
    }

    impl Diagnostic {
        pub fn info(kind: DiagnosticKind, line: usize, message: impl Into<String>) -> Self {
            Diagnostic { kind, message: message.into(), severity: Severity::Info, line }
        }

        pub fn warning(kind: DiagnosticKind, line: usize, message: impl Into<String>) -> Self {
            Diagnostic { kind, message: message.into(), severity: Severity::Warning, line }
        }
    }

    impl std::fmt::Display for Diagnostic {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "line {}: [{:?}] {:?}: {}", self.line, self.severity, self.kind, self.message)
        }
    }
}
