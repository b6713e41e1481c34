//! Constants for the Zcash main network.

/// The prefix for a Base58Check-encoded mainnet [`TransparentAddress::PublicKeyHash`].
///
/// [`TransparentAddress::PublicKeyHash`]: crate::legacy::TransparentAddress::PublicKeyHash
pub const B58_PUBKEY_ADDRESS_PREFIX: [u8; 2] = [0x1c, 0xb8];

/// The prefix for a Base58Check-encoded mainnet [`TransparentAddress::ScriptHash`].
///
/// [`TransparentAddress::ScriptHash`]: crate::legacy::TransparentAddress::ScriptHash
pub const B58_SCRIPT_ADDRESS_PREFIX: [u8; 2] = [0x1c, 0xbd];

/// The prefix for a WIF-encoded mainnet transparent secret key.
pub const B58_SECRET_KEY_PREFIX: u8 = 0x80;
