use super::{sha256d, Address, AddressError, AddressType};
use crate::types::Network;

const CHECKSUM_LEN: usize = 4;
const HASH160_LEN: usize = 20;
const LEGACY_LEN: usize = 1 + HASH160_LEN + CHECKSUM_LEN;
/// Longest base-58 rendering of `LEGACY_LEN` bytes.
const LEGACY_MAX_CHARS: usize = 35;

/// Decodes base-58 and verifies the trailing double-SHA-256 checksum.
///
/// The checksum is left on the returned buffer.
pub fn base58check_decode(input: &str) -> Result<Vec<u8>, AddressError> {
    let v = bs58::decode(input)
        .into_vec()
        .map_err(|e| AddressError::Base58(e.to_string()))?;

    // At least one payload byte in front of the checksum.
    if v.len() <= CHECKSUM_LEN {
        return Err(AddressError::TooShort(v.len()));
    }

    let (body, checksum) = v.split_at(v.len() - CHECKSUM_LEN);
    if sha256d(body)[..CHECKSUM_LEN] != *checksum {
        return Err(AddressError::BadChecksum);
    }

    Ok(v)
}

/// Converts a public key hash to its legacy address
pub fn legacy_encode(
    hash160: &[u8],
    addr_type: AddressType,
    network: Network,
) -> Result<String, AddressError> {
    if hash160.len() != HASH160_LEN {
        return Err(AddressError::UnsupportedSize(hash160.len()));
    }

    let mut v = Vec::with_capacity(LEGACY_LEN);
    v.push(match addr_type {
        AddressType::P2PKH => network.legacy_pubkeyhash_byte(),
        AddressType::P2SH => network.legacy_script_byte(),
    });
    v.extend_from_slice(hash160);
    let checksum = sha256d(&v);
    v.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    Ok(bs58::encode(v).into_string())
}

/// Decodes a legacy address. The version byte selects network and type.
pub fn legacy_decode(input: &str) -> Result<Address, AddressError> {
    if input.len() > LEGACY_MAX_CHARS {
        return Err(AddressError::TooLong(input.len()));
    }
    let v = base58check_decode(input)?;
    if v.len() != LEGACY_LEN {
        return Err(AddressError::BadLength {
            expected: LEGACY_LEN,
            actual: v.len(),
        });
    }

    let version = v[0];
    let (network, addr_type) = [Network::Mainnet, Network::Testnet]
        .into_iter()
        .find_map(|network| {
            if version == network.legacy_pubkeyhash_byte() {
                Some((network, AddressType::P2PKH))
            } else if version == network.legacy_script_byte() {
                Some((network, AddressType::P2SH))
            } else {
                None
            }
        })
        .ok_or(AddressError::UnknownVersion(version))?;

    Ok(Address {
        network,
        addr_type,
        hash: v[1..1 + HASH160_LEN].to_vec(),
    })
}
