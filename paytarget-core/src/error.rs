use thiserror::Error;

use crate::address::AddressError;
use crate::diagnostics::Stage;
use crate::types::TargetKind;

/// Why a decoded value does not have the shape a stage expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Mismatch {
    #[error("not exactly 40 lowercase ASCII letters")]
    NotApiKey,
    #[error("{actual} characters, at most {max} can encode it")]
    TooLong { max: usize, actual: usize },
    #[error("decoded length {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("unknown extended key version 0x{0:08x}")]
    UnknownVersion(u32),
    #[error("key material starts with 0x{0:02x}, expected a compressed public key")]
    KeyPrefix(u8),
}

/// Classification failures.
///
/// `classify` never returns these: stage failures fall through to the next stage
/// and are only reported to the diagnostic sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("{stage}: decode failed: {source}")]
    DecodeFailure {
        stage: Stage,
        #[source]
        source: AddressError,
    },

    #[error("{stage}: {reason}")]
    StructuralMismatch { stage: Stage, reason: Mismatch },

    #[error("input is not an API key, extended public key or address")]
    AllStagesExhausted,

    #[error("payment target is {actual}, not an address")]
    WrongKind { actual: TargetKind },
}

impl ClassifyError {
    pub(crate) fn decode(stage: Stage, source: AddressError) -> Self {
        ClassifyError::DecodeFailure { stage, source }
    }

    pub(crate) fn mismatch(stage: Stage, reason: Mismatch) -> Self {
        ClassifyError::StructuralMismatch { stage, reason }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
