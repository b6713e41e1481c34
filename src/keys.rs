//! Transparent spending keys and their WIF encoding.

use std::fmt;

use bs58::{self, decode::Error as Bs58Error};
use secp256k1::Secp256k1;

use crate::consensus::Parameters;
use crate::legacy::TransparentAddress;

/// An error while decoding a WIF-encoded key.
#[derive(Debug)]
pub enum KeyError {
    /// The string was not valid Base58Check (including checksum mismatches).
    Base58(Bs58Error),
    /// The leading byte does not match the expected network's WIF prefix.
    InvalidPrefix(u8),
    /// The decoded payload had an unexpected length.
    InvalidLength(usize),
    /// The payload is not a valid secp256k1 scalar.
    InvalidSecretKey(secp256k1::Error),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::Base58(e) => write!(f, "{}", e),
            KeyError::InvalidPrefix(prefix) => write!(f, "incorrect WIF prefix: {:#04x}", prefix),
            KeyError::InvalidLength(len) => write!(f, "incorrect WIF payload length: {}", len),
            KeyError::InvalidSecretKey(e) => write!(f, "invalid secret key: {}", e),
        }
    }
}

impl std::error::Error for KeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KeyError::Base58(e) => Some(e),
            KeyError::InvalidSecretKey(e) => Some(e),
            _ => None,
        }
    }
}

/// A transparent spending key, together with the form in which its public key
/// should be serialized.
#[derive(Clone, Copy)]
pub struct PrivateKey {
    pub secret_key: secp256k1::SecretKey,
    pub compressed: bool,
}

impl PrivateKey {
    /// Decodes a key from Wallet Import Format for the given network.
    ///
    /// The Base58Check payload is the network's WIF prefix byte, the 32-byte
    /// secret scalar, and a trailing `0x01` when the corresponding public key
    /// is to be serialized in compressed form.
    pub fn from_wif<P: Parameters>(params: &P, wif: &str) -> Result<Self, KeyError> {
        let data = bs58::decode(wif)
            .with_check(None)
            .into_vec()
            .map_err(KeyError::Base58)?;

        match data.split_first() {
            Some((&prefix, _)) if prefix != params.b58_secret_key_prefix() => {
                Err(KeyError::InvalidPrefix(prefix))
            }
            Some((_, payload)) => {
                let (sk, compressed) = match payload.len() {
                    32 => (payload, false),
                    33 if payload[32] == 0x01 => (&payload[..32], true),
                    _ => return Err(KeyError::InvalidLength(data.len())),
                };
                Ok(PrivateKey {
                    secret_key: secp256k1::SecretKey::from_slice(sk)
                        .map_err(KeyError::InvalidSecretKey)?,
                    compressed,
                })
            }
            None => Err(KeyError::InvalidLength(0)),
        }
    }

    /// Encodes this key in Wallet Import Format for the given network.
    pub fn to_wif<P: Parameters>(&self, params: &P) -> String {
        let mut data = Vec::with_capacity(34);
        data.push(params.b58_secret_key_prefix());
        data.extend_from_slice(&self.secret_key[..]);
        if self.compressed {
            data.push(0x01);
        }
        bs58::encode(data).with_check().into_string()
    }

    /// Returns the SEC1 serialization of the corresponding public key,
    /// compressed or uncompressed per this key's flag.
    pub fn pubkey(&self) -> Vec<u8> {
        let secp = Secp256k1::signing_only();
        let pubkey = secp256k1::PublicKey::from_secret_key(&secp, &self.secret_key);
        if self.compressed {
            pubkey.serialize().to_vec()
        } else {
            pubkey.serialize_uncompressed().to_vec()
        }
    }

    /// Returns the P2PKH address of the corresponding public key.
    pub fn address(&self) -> TransparentAddress {
        TransparentAddress::from_pubkey(&self.pubkey())
    }
}
