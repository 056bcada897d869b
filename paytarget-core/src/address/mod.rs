//! Bitcoin Cash address encoding and decoding.
//!
//! Both legacy base-58 addresses and cashaddr strings decode to the same
//! [`Address`], whose canonical string form is the lowercase, prefixed cashaddr.
//!
//! ```rust
//! use paytarget_core::address::legacy_decode;
//!
//! let addr = legacy_decode("1BpEi6DfDAUFd7GtittLSdBeYJvcoaVggu").unwrap();
//! assert_eq!(
//!     addr.to_cashaddr(),
//!     "bitcoincash:qpm2qsznhks23z7629mms6s4cwef74vcwvy22gdx6a"
//! );
//! ```

mod cashaddr;
mod legacyaddr;

pub use self::cashaddr::{cashaddr_decode, cashaddr_encode};
pub use self::legacyaddr::{base58check_decode, legacy_decode, legacy_encode};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::Network;

/// Address type which is either P2PKH or P2SH
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    /// Pay-to-public-key-hash address
    P2PKH,
    /// Pay-to-script-hash address
    P2SH,
}

/// A decoded address: network, type and hash payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub network: Network,
    pub addr_type: AddressType,
    pub hash: Vec<u8>,
}

impl Address {
    /// Canonical cashaddr form, always lowercase and prefixed.
    pub fn to_cashaddr(&self) -> String {
        // Decoders only produce hashes of a size cashaddr can carry.
        cashaddr::encode_unchecked(&self.hash, self.addr_type, self.network)
    }

    /// Legacy base-58 form. Only 20-byte hashes have one.
    pub fn to_legacy(&self) -> Result<String, AddressError> {
        legacy_encode(&self.hash, self.addr_type, self.network)
    }
}

/// Errors from the address codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")]
    Base58(String),
    #[error("bad checksum")]
    BadChecksum,
    #[error("data too short: {0} characters or bytes")]
    TooShort(usize),
    #[error("input too long: {0} characters")]
    TooLong(usize),
    #[error("wrong length: expected {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },
    #[error("unknown address version byte {0:#04x}")]
    UnknownVersion(u8),
    #[error("address cannot contain both upper and lower case")]
    MixedCase,
    #[error("no prefix separator ':'")]
    MissingPrefix,
    #[error("unexpected prefix: {0}")]
    UnknownPrefix(String),
    #[error("invalid cashaddr character {0:?}")]
    InvalidCharacter(char),
    #[error("non-zero or excess padding bits")]
    BadPadding,
    #[error("invalid type in version byte {0:#04x}")]
    BadType(u8),
    #[error("payload size {actual} does not match version byte size {expected}")]
    BadSize { expected: usize, actual: usize },
    #[error("hash size is not allowed: {0}")]
    UnsupportedSize(usize),
}

pub(crate) fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}
