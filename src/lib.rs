//! *Building, serializing, and signing Zcash transparent transactions.*
//!
//! `zecutil` implements the consensus serialization of Overwinter (v3) and
//! Sapling (v4) transparent transactions, the corresponding BLAKE2b signature
//! hash ([ZIP 143]/[ZIP 243]) for transparent inputs, and a signing pipeline
//! that produces `scriptSig`s for P2PKH, P2SH, and bare multisig previous
//! outputs. Shielded components are out of scope: the Sapling and Sprout
//! fields of the wire format are serialized as empty, and decoding fails on
//! any transaction that carries shielded data.
//!
//! [ZIP 143]: https://zips.z.cash/zip-0143
//! [ZIP 243]: https://zips.z.cash/zip-0243

#![deny(rustdoc::broken_intra_doc_links)]

pub mod consensus;
pub mod constants;
pub mod encoding;
pub mod keys;
pub mod legacy;
pub mod serialize;
pub mod transaction;
