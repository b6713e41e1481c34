//! Encoding and decoding functions for transparent Zcash addresses.
//!
//! Transparent addresses are Base58Check strings: a two-byte network prefix,
//! the 20-byte hash the address commits to, and a four-byte double-SHA256
//! checksum appended by the Base58Check layer.

use std::fmt;

use bs58::{self, decode::Error as Bs58Error};

use crate::consensus::Parameters;
use crate::legacy::TransparentAddress;

/// An error while decoding a transparent address string.
#[derive(Debug)]
pub enum TransparentCodecError {
    /// The string was not valid Base58Check (including checksum mismatches).
    Base58(Bs58Error),
    /// The decoded payload was not the 22 bytes of a prefix plus a 20-byte hash.
    InvalidLength(usize),
    /// The two-byte prefix does not belong to the expected network.
    UnknownPrefix([u8; 2]),
}

impl fmt::Display for TransparentCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransparentCodecError::Base58(e) => write!(f, "{}", e),
            TransparentCodecError::InvalidLength(len) => {
                write!(f, "incorrect address payload length: {}", len)
            }
            TransparentCodecError::UnknownPrefix(prefix) => {
                write!(f, "unknown address prefix: {}", hex::encode(prefix))
            }
        }
    }
}

impl std::error::Error for TransparentCodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransparentCodecError::Base58(e) => Some(e),
            _ => None,
        }
    }
}

/// Writes a [`TransparentAddress`] as a Base58Check-encoded string using the
/// prefixes of the given network.
pub fn encode_transparent_address<P: Parameters>(
    params: &P,
    addr: &TransparentAddress,
) -> String {
    let (prefix, hash) = match addr {
        TransparentAddress::PublicKeyHash(hash) => (params.b58_pubkey_address_prefix(), hash),
        TransparentAddress::ScriptHash(hash) => (params.b58_script_address_prefix(), hash),
    };
    let mut decoded = Vec::with_capacity(22);
    decoded.extend_from_slice(&prefix);
    decoded.extend_from_slice(hash);
    bs58::encode(decoded).with_check().into_string()
}

/// Decodes a [`TransparentAddress`] from a Base58Check-encoded string,
/// checking it against the prefixes of the given network.
pub fn decode_transparent_address<P: Parameters>(
    params: &P,
    s: &str,
) -> Result<TransparentAddress, TransparentCodecError> {
    let decoded = bs58::decode(s)
        .with_check(None)
        .into_vec()
        .map_err(TransparentCodecError::Base58)?;
    if decoded.len() != 22 {
        return Err(TransparentCodecError::InvalidLength(decoded.len()));
    }

    let prefix = [decoded[0], decoded[1]];
    let mut hash = [0; 20];
    hash.copy_from_slice(&decoded[2..]);

    if prefix == params.b58_pubkey_address_prefix() {
        Ok(TransparentAddress::PublicKeyHash(hash))
    } else if prefix == params.b58_script_address_prefix() {
        Ok(TransparentAddress::ScriptHash(hash))
    } else {
        Err(TransparentCodecError::UnknownPrefix(prefix))
    }
}
