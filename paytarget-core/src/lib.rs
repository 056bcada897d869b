//! Core library for paytarget: classification of payment destinations, address
//! codecs, and shared types.

pub mod address;
pub mod classifier;
pub mod diagnostics;
pub mod error;
pub mod extended_key;
pub mod output;
pub mod types;

pub use classifier::{classify, is_api_key, Classifier, ClassifierConfig, API_KEY_LEN};
pub use diagnostics::{Diagnostic, DiagnosticSink, NullSink, Stage, TracingSink};
pub use error::{ClassifyError, Mismatch, Result};
pub use extended_key::ExtendedKeyVersion;
pub use output::{truncate_address, AgentError, OutputMode, TargetIssue};
pub use types::{Network, PaymentTarget, TargetKind};
