//! Data types shared between CLI and core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::extended_key::ExtendedKeyVersion;

/// Supported network selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Stable string identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// Cashaddr human-readable prefix, without the `:` separator.
    pub fn cashaddr_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "bitcoincash",
            Network::Testnet => "bchtest",
        }
    }

    /// Version byte of a legacy pay-to-public-key-hash address.
    pub fn legacy_pubkeyhash_byte(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    /// Version byte of a legacy pay-to-script-hash address.
    pub fn legacy_script_byte(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet => 0xc4,
        }
    }

    pub(crate) fn from_cashaddr_prefix(prefix: &str) -> Option<Network> {
        [Network::Mainnet, Network::Testnet]
            .into_iter()
            .find(|n| n.cashaddr_prefix() == prefix)
    }
}

/// What a classified string turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Invalid,
    ApiKey,
    ExtendedPublicKey,
    Address,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Invalid => "invalid",
            TargetKind::ApiKey => "api_key",
            TargetKind::ExtendedPublicKey => "extended_public_key",
            TargetKind::Address => "address",
        }
    }

    pub fn is_valid(&self) -> bool {
        *self != TargetKind::Invalid
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a raw payment destination.
///
/// Only the classifier builds these, so a non-`Invalid` kind always comes with
/// `address` in the canonical form for that kind:
///
/// - `ApiKey` and `ExtendedPublicKey`: the input exactly as given.
/// - `Address`: the lowercase cashaddr string, prefix included.
/// - `Invalid`: the input, or the scheme-prefixed input if the bare-payload
///   retry was attempted.
///
/// Deserializing reclassifies the stored address, so a hand-edited kind cannot
/// stick to a string that does not have it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredTarget")]
pub struct PaymentTarget {
    address: String,
    kind: TargetKind,
}

impl PaymentTarget {
    pub(crate) fn new(address: String, kind: TargetKind) -> Self {
        Self { address, kind }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.kind.is_valid()
    }

    /// Canonical cashaddr of the destination, required before a payment
    /// request can be built. Errors for every kind other than `Address`.
    pub fn cash_address(&self) -> Result<&str, ClassifyError> {
        match self.kind {
            TargetKind::Address => Ok(&self.address),
            actual => Err(ClassifyError::WrongKind { actual }),
        }
    }

    /// Which of the six extended key versions this is, for `ExtendedPublicKey` targets.
    pub fn extended_key_version(&self) -> Option<ExtendedKeyVersion> {
        match self.kind {
            TargetKind::ExtendedPublicKey => {
                crate::classifier::check_extended_public_key(&self.address).ok()
            }
            _ => None,
        }
    }
}

/// Serialized shape of a [`PaymentTarget`], trusted only for its address.
#[derive(Deserialize)]
struct StoredTarget {
    address: String,
    kind: TargetKind,
}

impl From<StoredTarget> for PaymentTarget {
    fn from(stored: StoredTarget) -> Self {
        match stored.kind {
            // An invalid address may already carry the retry prefix; classifying
            // it again would prefix it twice.
            TargetKind::Invalid => PaymentTarget::new(stored.address, TargetKind::Invalid),
            _ => crate::classifier::classify(&stored.address),
        }
    }
}

impl fmt::Display for PaymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl FromStr for PaymentTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(crate::classifier::classify(s))
    }
}
