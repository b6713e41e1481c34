//! Network-specific Zcash constants.

pub mod mainnet;
pub mod regtest;
pub mod testnet;
