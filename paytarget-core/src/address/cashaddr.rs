use super::{Address, AddressError, AddressType};
use crate::types::Network;

// Cashaddr lookup table to convert a 5-bit number to an ascii character
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const CHECKSUM_LEN: usize = 8;

// Flags for the version byte
mod version_byte_flags {
    pub const RESERVED_MASK: u8 = 0x80;
    pub const TYPE_MASK: u8 = 0x78;
    pub const TYPE_P2PKH: u8 = 0x00;
    pub const TYPE_P2SH: u8 = 0x08;
    pub const SIZE_MASK: u8 = 0x07;

    /// Hash sizes in bytes, indexed by the size bits.
    pub const SIZES: [usize; 8] = [20, 24, 28, 32, 40, 48, 56, 64];
}

/// Converts a hash to its cashaddr address
pub fn cashaddr_encode(
    data: &[u8],
    addr_type: AddressType,
    network: Network,
) -> Result<String, AddressError> {
    if !version_byte_flags::SIZES.contains(&data.len()) {
        return Err(AddressError::UnsupportedSize(data.len()));
    }
    Ok(encode_unchecked(data, addr_type, network))
}

/// Encodes without checking `data` against the allowed sizes.
pub(super) fn encode_unchecked(data: &[u8], addr_type: AddressType, network: Network) -> String {
    let type_flag = match addr_type {
        AddressType::P2PKH => version_byte_flags::TYPE_P2PKH,
        AddressType::P2SH => version_byte_flags::TYPE_P2SH,
    };
    let size_flag = version_byte_flags::SIZES
        .iter()
        .position(|&size| size == data.len())
        .unwrap_or(0) as u8;
    encode_with_version_byte(data, type_flag | size_flag, network)
}

/// Decodes a prefixed cashaddr address. The prefix selects the network.
pub fn cashaddr_decode(input: &str) -> Result<Address, AddressError> {
    let has_lower = input.chars().any(char::is_lowercase);
    let has_upper = input.chars().any(char::is_uppercase);
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }

    let input = input.to_ascii_lowercase();
    let (prefix, payload) = input.split_once(':').ok_or(AddressError::MissingPrefix)?;
    let network = Network::from_cashaddr_prefix(prefix)
        .ok_or_else(|| AddressError::UnknownPrefix(prefix.to_string()))?;

    let mut values = Vec::with_capacity(payload.len());
    for c in payload.chars() {
        let value = u8::try_from(c)
            .ok()
            .and_then(charset_value)
            .ok_or(AddressError::InvalidCharacter(c))?;
        values.push(value);
    }

    if values.len() <= CHECKSUM_LEN {
        return Err(AddressError::TooShort(values.len()));
    }

    let mut checksum_input = expand_prefix(prefix);
    checksum_input.extend_from_slice(&values);
    if polymod(&checksum_input) != 0 {
        return Err(AddressError::BadChecksum);
    }

    let data = &values[..values.len() - CHECKSUM_LEN];
    let payload = convert_bits(data, 5, 8, false).ok_or(AddressError::BadPadding)?;
    let (&version, hash) = payload.split_first().ok_or(AddressError::TooShort(0))?;

    if version & version_byte_flags::RESERVED_MASK != 0 {
        return Err(AddressError::BadType(version));
    }
    let addr_type = match version & version_byte_flags::TYPE_MASK {
        version_byte_flags::TYPE_P2PKH => AddressType::P2PKH,
        version_byte_flags::TYPE_P2SH => AddressType::P2SH,
        _ => return Err(AddressError::BadType(version)),
    };

    let expected = version_byte_flags::SIZES[(version & version_byte_flags::SIZE_MASK) as usize];
    if hash.len() != expected {
        return Err(AddressError::BadSize {
            expected,
            actual: hash.len(),
        });
    }

    Ok(Address {
        network,
        addr_type,
        hash: hash.to_vec(),
    })
}

fn encode_with_version_byte(data: &[u8], version_byte: u8, network: Network) -> String {
    let mut payload = Vec::with_capacity(1 + data.len());
    payload.push(version_byte);
    payload.extend_from_slice(data);
    // Padding mode never rejects input.
    let payload5bit = convert_bits(&payload, 8, 5, true).unwrap_or_default();

    let prefix = network.cashaddr_prefix();
    let mut checksum_input = expand_prefix(prefix);
    checksum_input.extend_from_slice(&payload5bit);
    checksum_input.extend_from_slice(&[0; CHECKSUM_LEN]);
    let checksum = polymod(&checksum_input);

    let mut cashaddr = String::with_capacity(prefix.len() + 1 + payload5bit.len() + CHECKSUM_LEN);
    cashaddr.push_str(prefix);
    cashaddr.push(':');
    for d in &payload5bit {
        cashaddr.push(CHARSET[*d as usize] as char);
    }
    for i in (0..CHECKSUM_LEN).rev() {
        let c = ((checksum >> (i * 5)) & 31) as usize;
        cashaddr.push(CHARSET[c] as char);
    }
    cashaddr
}

fn charset_value(c: u8) -> Option<u8> {
    CHARSET.iter().position(|&x| x == c).map(|p| p as u8)
}

/// Lower 5 bits of each prefix character followed by a zero separator.
fn expand_prefix(prefix: &str) -> Vec<u8> {
    let mut v: Vec<u8> = prefix.bytes().map(|b| b & 31).collect();
    v.push(0);
    v
}

/// Regroups a bit stream from `from`-bit to `to`-bit values.
///
/// With `pad` the tail is zero-filled into one last group. Without it, leftover
/// bits must be fewer than `from` and all zero, otherwise `None`.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Option<Vec<u8>> {
    let max_value: u32 = (1 << to) - 1;
    let max_acc: u32 = (1 << (from + to - 1)) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        let value = u32::from(value);
        if value >> from != 0 {
            return None;
        }
        acc = ((acc << from) | value) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            ret.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            ret.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return None;
    }

    Some(ret)
}

// 40-bit BCH checksum over GF(32), as in the Bitcoin ABC reference.
fn polymod(v: &[u8]) -> u64 {
    const GENERATORS: [u64; 5] = [
        0x98f2bc8e61,
        0x79b76d99e2,
        0xf33e5fb3c4,
        0xae2eabe2a8,
        0x1e4f43e470,
    ];

    let mut c: u64 = 1;
    for d in v {
        let c0 = (c >> 35) as u8;
        c = ((c & 0x07ffffffff) << 5) ^ u64::from(*d);
        for (i, generator) in GENERATORS.iter().enumerate() {
            if c0 & (1 << i) != 0 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}
