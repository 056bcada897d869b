//! Reporting of per-stage classification failures.
//!
//! The classifier holds no logging state of its own. Every stage that rejects an
//! input hands a [`Diagnostic`] to the [`DiagnosticSink`] it was built with; the
//! default sink forwards to `tracing`.

use std::fmt;

use crate::error::ClassifyError;

/// Classification pipeline stage, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ApiKey,
    ExtendedKey,
    LegacyAddress,
    CashAddress,
    PrefixedRetry,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ApiKey => "api_key",
            Stage::ExtendedKey => "extended_key",
            Stage::LegacyAddress => "legacy_address",
            Stage::CashAddress => "cash_address",
            Stage::PrefixedRetry => "prefixed_retry",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected stage for one input.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostic<'a> {
    pub stage: Stage,
    pub input: &'a str,
    pub error: &'a ClassifyError,
}

/// Receives stage failures. Implementations must not panic.
pub trait DiagnosticSink {
    fn record(&self, diagnostic: &Diagnostic<'_>);
}

/// Forwards diagnostics to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        tracing::debug!(
            stage = diagnostic.stage.as_str(),
            input = diagnostic.input,
            error = %diagnostic.error,
            "payment target stage rejected input"
        );
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _diagnostic: &Diagnostic<'_>) {}
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic<'_>),
{
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        self(diagnostic)
    }
}
