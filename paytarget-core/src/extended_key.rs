//! BIP32 extended public key version magics.

use serde::Serialize;

/// Length of a base-58 decoded extended key, checksum included:
/// version (4) + depth (1) + parent fingerprint (4) + child number (4)
/// + chain code (32) + key material (33) + checksum (4).
pub const SERIALIZED_LEN: usize = 82;

/// Offset of the first key-material byte.
pub const KEY_MATERIAL_OFFSET: usize = 45;

/// Longest base-58 rendering of `SERIALIZED_LEN` bytes.
pub const MAX_ENCODED_LEN: usize = 112;

/// The six recognised extended public key versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtendedKeyVersion {
    Xpub,
    Tpub,
    Ypub,
    Upub,
    Zpub,
    Vpub,
}

impl ExtendedKeyVersion {
    pub const ALL: [ExtendedKeyVersion; 6] = [
        ExtendedKeyVersion::Xpub,
        ExtendedKeyVersion::Tpub,
        ExtendedKeyVersion::Ypub,
        ExtendedKeyVersion::Upub,
        ExtendedKeyVersion::Zpub,
        ExtendedKeyVersion::Vpub,
    ];

    pub fn magic(&self) -> u32 {
        match self {
            ExtendedKeyVersion::Xpub => 0x0488_B21E,
            ExtendedKeyVersion::Tpub => 0x0435_87CF,
            ExtendedKeyVersion::Ypub => 0x049D_7CB2,
            ExtendedKeyVersion::Upub => 0x044A_5262,
            ExtendedKeyVersion::Zpub => 0x04B2_4746,
            ExtendedKeyVersion::Vpub => 0x045F_1CF6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtendedKeyVersion::Xpub => "xpub",
            ExtendedKeyVersion::Tpub => "tpub",
            ExtendedKeyVersion::Ypub => "ypub",
            ExtendedKeyVersion::Upub => "upub",
            ExtendedKeyVersion::Zpub => "zpub",
            ExtendedKeyVersion::Vpub => "vpub",
        }
    }

    pub fn from_magic(magic: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.magic() == magic)
    }
}

/// Big-endian version number from the four version bytes.
pub fn read_version(bytes: [u8; 4]) -> u32 {
    let [a, b, c, d] = bytes;
    (u32::from(a) << 24) | (u32::from(b) << 16) | (u32::from(c) << 8) | u32::from(d)
}

/// First byte of a compressed secp256k1 public key.
pub fn is_compressed_key_prefix(byte: u8) -> bool {
    byte == 0x02 || byte == 0x03
}
