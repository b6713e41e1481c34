//! The Overwinter/Sapling signature hash for transparent inputs.
//!
//! Implements the BLAKE2b-based signature digest of [ZIP 143] (v3) and
//! [ZIP 243] (v4). The shielded segments of the preimage are always all-zero
//! here, since this crate never carries shielded components.
//!
//! [ZIP 143]: https://zips.z.cash/zip-0143
//! [ZIP 243]: https://zips.z.cash/zip-0243

use blake2b_simd::{Hash as Blake2bHash, Params as Blake2bParams};

use crate::{
    consensus::{BranchId, Parameters},
    legacy::Script,
};

use super::{components::Amount, TransactionData};

const ZCASH_SIGHASH_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZcashSigHash";
const ZCASH_PREVOUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashPrevoutHash";
const ZCASH_SEQUENCE_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashSequencHash";
const ZCASH_OUTPUTS_HASH_PERSONALIZATION: &[u8; 16] = b"ZcashOutputsHash";

pub const SIGHASH_ALL: u32 = 1;
pub const SIGHASH_NONE: u32 = 2;
pub const SIGHASH_SINGLE: u32 = 3;
pub const SIGHASH_MASK: u32 = 0x1f;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

const ZERO_HASH: [u8; 32] = [0; 32];

fn blake2b_256(personal: &[u8; 16], data: &[u8]) -> Blake2bHash {
    Blake2bParams::new()
        .hash_length(32)
        .personal(personal)
        .hash(data)
}

/// The per-transaction cache of sighash components.
///
/// These three digests are shared by every input's signature hash, so a signer
/// computes them once per transaction and reuses them across inputs. A cache
/// must not be reused for a different transaction.
pub struct TxSigHashes {
    pub hash_prevouts: Blake2bHash,
    pub hash_sequence: Blake2bHash,
    pub hash_outputs: Blake2bHash,
}

impl TxSigHashes {
    /// Computes the cached sighash components of the given transaction.
    pub fn new(tx: &TransactionData) -> Self {
        let mut prevouts = vec![];
        let mut sequences = vec![];
        for input in &tx.vin {
            input.prevout.write(&mut prevouts).unwrap();
            sequences.extend_from_slice(&input.sequence.to_le_bytes());
        }

        let mut outputs = vec![];
        for output in &tx.vout {
            output.write(&mut outputs).unwrap();
        }

        TxSigHashes {
            hash_prevouts: blake2b_256(ZCASH_PREVOUTS_HASH_PERSONALIZATION, &prevouts),
            hash_sequence: blake2b_256(ZCASH_SEQUENCE_HASH_PERSONALIZATION, &sequences),
            hash_outputs: blake2b_256(ZCASH_OUTPUTS_HASH_PERSONALIZATION, &outputs),
        }
    }
}

/// Computes the signature digest for input `index` of `tx`.
///
/// `script_code` is the script of the previous output being spent (for P2SH,
/// the redeem script), and `value` its amount. The consensus branch committed
/// to is the one active at the transaction's expiry height on the given
/// network.
///
/// Panics if `index` is out of range of `tx.vin`; callers validate the index
/// before signing.
pub fn signature_hash<P: Parameters>(
    params: &P,
    tx: &TransactionData,
    sighashes: &TxSigHashes,
    hash_type: u32,
    index: usize,
    script_code: &Script,
    value: Amount,
) -> Blake2bHash {
    let branch_id = BranchId::for_height(params, tx.expiry_height);
    let mut personal = [0; 16];
    personal[..12].copy_from_slice(ZCASH_SIGHASH_PERSONALIZATION_PREFIX);
    personal[12..].copy_from_slice(&u32::from(branch_id).to_le_bytes());

    let mut h = Blake2bParams::new()
        .hash_length(32)
        .personal(&personal)
        .to_state();

    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
    let masked = hash_type & SIGHASH_MASK;
    let single_or_none = masked == SIGHASH_SINGLE || masked == SIGHASH_NONE;

    h.update(&tx.version.header().to_le_bytes());
    h.update(&tx.version.version_group_id().to_le_bytes());

    if anyone_can_pay {
        h.update(&ZERO_HASH);
    } else {
        h.update(sighashes.hash_prevouts.as_bytes());
    }

    if anyone_can_pay || single_or_none {
        h.update(&ZERO_HASH);
    } else {
        h.update(sighashes.hash_sequence.as_bytes());
    }

    if !single_or_none {
        h.update(sighashes.hash_outputs.as_bytes());
    } else if masked == SIGHASH_SINGLE && index < tx.vout.len() {
        // SIGHASH_SINGLE commits to the one output paired with this input.
        let mut paired = vec![];
        tx.vout[index].write(&mut paired).unwrap();
        h.update(blake2b_256(ZCASH_OUTPUTS_HASH_PERSONALIZATION, &paired).as_bytes());
    } else {
        h.update(&ZERO_HASH);
    }

    // hashJoinSplits, and for Sapling hashShieldedSpends and
    // hashShieldedOutputs, cover components this crate never carries.
    h.update(&ZERO_HASH);
    if tx.version.has_sapling() {
        h.update(&ZERO_HASH);
        h.update(&ZERO_HASH);
    }

    h.update(&tx.lock_time.to_le_bytes());
    h.update(&u32::from(tx.expiry_height).to_le_bytes());
    if tx.version.has_sapling() {
        // valueBalance
        h.update(&0i64.to_le_bytes());
    }
    h.update(&hash_type.to_le_bytes());

    let input = &tx.vin[index];
    let mut spent = vec![];
    input.prevout.write(&mut spent).unwrap();
    script_code.write(&mut spent).unwrap();
    spent.extend_from_slice(&value.to_i64_le_bytes());
    spent.extend_from_slice(&input.sequence.to_le_bytes());
    h.update(&spent);

    h.finalize()
}
