//! Constants for the Zcash test network.

/// The prefix for a Base58Check-encoded testnet [`TransparentAddress::PublicKeyHash`].
///
/// [`TransparentAddress::PublicKeyHash`]: crate::legacy::TransparentAddress::PublicKeyHash
pub const B58_PUBKEY_ADDRESS_PREFIX: [u8; 2] = [0x1d, 0x25];

/// The prefix for a Base58Check-encoded testnet [`TransparentAddress::ScriptHash`].
///
/// [`TransparentAddress::ScriptHash`]: crate::legacy::TransparentAddress::ScriptHash
pub const B58_SCRIPT_ADDRESS_PREFIX: [u8; 2] = [0x1c, 0xba];

/// The prefix for a WIF-encoded testnet transparent secret key.
pub const B58_SECRET_KEY_PREFIX: u8 = 0xef;
