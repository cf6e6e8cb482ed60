//! Diagnostics reporting for the interpreter.
//!
//! The core never prints on its own: every recoverable problem goes through a
//! [`DiagnosticSink`] with a severity and an optional source line number. The
//! sink decides formatting and suppression, so tests can capture diagnostics
//! and the binary can color them.

use std::fmt;

/// How serious a reported diagnostic is.
///
/// `Debug` and `Trace` are only shown by [`ConsoleSink`] in verbose mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Trace => "TRACE",
        }
    }

    /// ANSI color sequence for the severity, matching conventional shell
    /// tooling output (red errors, yellow warnings, cyan info).
    fn color(self) -> &'static str {
        match self {
            Severity::Error => "\x1b[91m",
            Severity::Warning => "\x1b[93m",
            Severity::Info => "\x1b[96m",
            Severity::Debug | Severity::Trace => "\x1b[90m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the interpreter sends its diagnostics.
///
/// Implementations must not panic; the interpreter relies on reporting always
/// succeeding so that a failed line never takes down the whole run.
pub trait DiagnosticSink {
    /// Report one diagnostic. `line` is the 1-based script line when known.
    fn report(&self, severity: Severity, message: &str, line: Option<usize>);
}

/// Colored console sink writing to stderr.
///
/// Script and child-process output own stdout; diagnostics stay on stderr so
/// they can be separated or silenced by the caller's shell.
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn report(&self, severity: Severity, message: &str, line: Option<usize>) {
        if matches!(severity, Severity::Debug | Severity::Trace) && !self.verbose {
            return;
        }
        let reset = "\x1b[0m";
        match line {
            Some(n) => eprintln!(
                "{}[{}] {} at line {}{}",
                severity.color(),
                severity.label(),
                message,
                n,
                reset
            ),
            None => eprintln!("{}[{}] {}{}", severity.color(), severity.label(), message, reset),
        }
    }
}
