//! Wire encoding of TLS 1.3 key shares.
//!
//! A `KeyShareEntry` pairs a group id with its `key_exchange` bytes; the entry itself
//! travels inside the message framing. For classical curves `key_exchange` is the
//! bare public value. For hybrid groups it is the
//! concatenation of the classical and KEM components, in the order fixed by the group.
//! Draft revision 0 of the hybrid design additionally framed each component with
//! its own `u16` length; later revisions rely on the fixed component sizes.
//!
//! 密钥共享的线上编码。混合组的 `key_exchange` 由经典分量与 KEM 分量拼接而成；
//! 草案修订版 0 还会为每个分量加上 `u16` 长度前缀。

use crate::error::{ProtocolViolation, Result};
use crate::policy::ecc::EccCurve;
use crate::policy::kem::KemGroup;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Size of one component length prefix.
const COMPONENT_PREFIX_LEN: usize = 2;

/// One entry of a `key_share` extension.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: u16,
    pub key_exchange: Vec<u8>,
}

impl KeyShareEntry {
    pub fn new(group: u16, key_exchange: Vec<u8>) -> Self {
        Self {
            group,
            key_exchange,
        }
    }
}

/// The two components of a hybrid share, borrowed from the encoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridShare<'a> {
    pub ecc: &'a [u8],
    /// A KEM public key in the client's share, a ciphertext in the server's.
    pub kem: &'a [u8],
}

/// Encodes a hybrid share for `group`.
pub fn encode_hybrid_share(group: &KemGroup, share: HybridShare<'_>, len_prefixed: bool) -> Vec<u8> {
    let (first, second) = if group.send_kem_first {
        (share.kem, share.ecc)
    } else {
        (share.ecc, share.kem)
    };

    let overhead = if len_prefixed { 2 * COMPONENT_PREFIX_LEN } else { 0 };
    let mut out = Vec::with_capacity(first.len() + second.len() + overhead);
    for component in [first, second] {
        if len_prefixed {
            // Component sizes are fixed per group and always fit in a u16.
            out.extend_from_slice(&(component.len() as u16).to_be_bytes());
        }
        out.extend_from_slice(component);
    }
    out
}

/// Parses a client's hybrid share, detecting whether it carries length prefixes.
///
/// Returns the components and the detected encoding.
pub fn parse_client_hybrid_share<'a>(
    group: &KemGroup,
    data: &'a [u8],
) -> Result<(HybridShare<'a>, bool)> {
    parse_hybrid_share(group, data, group.kem.public_key_length)
}

/// Parses the server's hybrid share, which must use the encoding the client chose.
pub fn parse_server_hybrid_share<'a>(
    group: &KemGroup,
    data: &'a [u8],
    len_prefixed: bool,
) -> Result<HybridShare<'a>> {
    let (share, detected) = parse_hybrid_share(group, data, group.kem.ciphertext_length)?;
    if detected != len_prefixed {
        warn!(
            group = group.iana_id,
            len_prefixed,
            "server hybrid share does not echo the client's encoding"
        );
        return Err(ProtocolViolation::MalformedKeyShare {
            group: group.iana_id,
        }
        .into());
    }
    Ok(share)
}

fn parse_hybrid_share<'a>(
    group: &KemGroup,
    data: &'a [u8],
    kem_len: usize,
) -> Result<(HybridShare<'a>, bool)> {
    let malformed = || {
        warn!(group = group.iana_id, len = data.len(), "hybrid key share is malformed");
        ProtocolViolation::MalformedKeyShare {
            group: group.iana_id,
        }
    };

    let ecc_len = group.curve.share_size;
    let (first_len, second_len) = if group.send_kem_first {
        (kem_len, ecc_len)
    } else {
        (ecc_len, kem_len)
    };
    let unprefixed = first_len + second_len;

    let (first, second, len_prefixed) = if data.len() == unprefixed {
        let (first, second) = data.split_at(first_len);
        (first, second, false)
    } else if data.len() == unprefixed + 2 * COMPONENT_PREFIX_LEN {
        let mut cursor = data;
        let first = take_prefixed(&mut cursor, first_len).ok_or_else(malformed)?;
        let second = take_prefixed(&mut cursor, second_len).ok_or_else(malformed)?;
        (first, second, true)
    } else {
        return Err(malformed().into());
    };

    let share = if group.send_kem_first {
        HybridShare {
            ecc: second,
            kem: first,
        }
    } else {
        HybridShare {
            ecc: first,
            kem: second,
        }
    };
    Ok((share, len_prefixed))
}

/// Takes a `u16`-prefixed component whose prefix must equal `expected`.
fn take_prefixed<'a>(cursor: &mut &'a [u8], expected: usize) -> Option<&'a [u8]> {
    let (prefix, rest) = cursor.split_at_checked(COMPONENT_PREFIX_LEN)?;
    let len = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;
    if len != expected {
        return None;
    }
    let (component, rest) = rest.split_at_checked(len)?;
    *cursor = rest;
    Some(component)
}

/// Checks that a classical share has the size its curve mandates.
pub fn check_ecc_share(curve: &EccCurve, data: &[u8]) -> Result<()> {
    if data.len() != curve.share_size {
        warn!(group = curve.iana_id, len = data.len(), "classical key share has the wrong size");
        return Err(ProtocolViolation::MalformedKeyShare {
            group: curve.iana_id,
        }
        .into());
    }
    Ok(())
}
