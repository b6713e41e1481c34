//! Signing of transparent inputs.
//!
//! The pipeline classifies the script of the previous output being spent,
//! produces signatures for the script classes it understands (P2PKH, P2SH,
//! bare multisig), and assembles the final `scriptSig`.

use std::fmt;

use secp256k1::{Message, Secp256k1};

use crate::{
    consensus::Parameters,
    legacy::{OpCode, Script, ScriptKind, TransparentAddress},
};

use super::{
    components::Amount,
    sighash::{signature_hash, TxSigHashes},
    TransactionData,
};

/// Errors that can occur while signing a transparent input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The requested input does not exist in the transaction.
    InvalidIndex { index: usize, inputs: usize },
    /// The previous output's script matches no standard template this signer
    /// understands.
    UnknownScriptKind,
    /// The key resolver had no key for the address.
    MissingKey(TransparentAddress),
    /// The script resolver had no redeem script for the P2SH address.
    MissingRedeemScript(TransparentAddress),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidIndex { index, inputs } => {
                write!(f, "input index {} out of range ({} inputs)", index, inputs)
            }
            Error::UnknownScriptKind => write!(f, "cannot sign unknown script class"),
            Error::MissingKey(addr) => write!(f, "no key for address {:?}", addr),
            Error::MissingRedeemScript(addr) => {
                write!(f, "no redeem script for address {:?}", addr)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Resolves transparent addresses to the keys that can spend from them.
pub trait KeyResolver {
    /// Returns the spending key for `addr`, together with whether its public
    /// key should be serialized in compressed form, or `None` if the key is
    /// unknown.
    fn get_key(&self, addr: &TransparentAddress) -> Option<(secp256k1::SecretKey, bool)>;
}

impl<F> KeyResolver for F
where
    F: Fn(&TransparentAddress) -> Option<(secp256k1::SecretKey, bool)>,
{
    fn get_key(&self, addr: &TransparentAddress) -> Option<(secp256k1::SecretKey, bool)> {
        self(addr)
    }
}

/// Resolves P2SH addresses to their redeem scripts.
pub trait ScriptResolver {
    fn get_script(&self, addr: &TransparentAddress) -> Option<Script>;
}

impl<F> ScriptResolver for F
where
    F: Fn(&TransparentAddress) -> Option<Script>,
{
    fn get_script(&self, addr: &TransparentAddress) -> Option<Script> {
        self(addr)
    }
}

/// Returns the serialized ECDSA signature for input `index` of the given
/// transaction, with the hash type byte appended to it.
pub fn raw_input_signature<P: Parameters>(
    params: &P,
    tx: &TransactionData,
    index: usize,
    script_code: &Script,
    hash_type: u32,
    sk: &secp256k1::SecretKey,
    value: Amount,
) -> Result<Vec<u8>, Error> {
    if index >= tx.vin.len() {
        return Err(Error::InvalidIndex {
            index,
            inputs: tx.vin.len(),
        });
    }

    let sighashes = TxSigHashes::new(tx);
    let sighash = signature_hash(params, tx, &sighashes, hash_type, index, script_code, value);

    let secp = Secp256k1::signing_only();
    let msg = Message::from_slice(sighash.as_bytes()).expect("32 bytes");
    let sig = secp.sign_ecdsa(&msg, sk);

    let mut sig_bytes = sig.serialize_der().to_vec();
    sig_bytes.push(hash_type as u8);
    Ok(sig_bytes)
}

/// Builds the P2PKH `scriptSig`: a signature push followed by a pubkey push.
fn signature_script<P: Parameters>(
    params: &P,
    tx: &TransactionData,
    index: usize,
    script_code: &Script,
    hash_type: u32,
    sk: &secp256k1::SecretKey,
    compressed: bool,
    value: Amount,
) -> Result<Script, Error> {
    let sig = raw_input_signature(params, tx, index, script_code, hash_type, sk, value)?;

    let secp = Secp256k1::signing_only();
    let pubkey = secp256k1::PublicKey::from_secret_key(&secp, sk);
    let pubkey_bytes = if compressed {
        pubkey.serialize().to_vec()
    } else {
        pubkey.serialize_uncompressed().to_vec()
    };

    Ok(Script::default() << &sig[..] << &pubkey_bytes[..])
}

/// Signs as many of the keys in the provided multisig script as possible.
///
/// Producing fewer than `required` signatures is not an error: keys the
/// resolver cannot supply are skipped, and a partial script is returned.
fn sign_multisig<P: Parameters, K: KeyResolver>(
    params: &P,
    tx: &TransactionData,
    index: usize,
    script_code: &Script,
    hash_type: u32,
    required: usize,
    pubkeys: &[Vec<u8>],
    key_resolver: &K,
    value: Amount,
) -> Script {
    // The leading OP_FALSE absorbs the extra pop that OP_CHECKMULTISIG
    // performs.
    let mut script = Script::default() << OpCode::False;
    let mut signed = 0;

    for pubkey in pubkeys {
        let addr = TransparentAddress::from_pubkey(pubkey);
        let (sk, _) = match key_resolver.get_key(&addr) {
            Some(key) => key,
            None => continue,
        };
        let sig = match raw_input_signature(params, tx, index, script_code, hash_type, &sk, value)
        {
            Ok(sig) => sig,
            Err(_) => continue,
        };

        script = script << &sig[..];
        signed += 1;
        if signed == required {
            break;
        }
    }

    script
}

fn sign_step<P: Parameters, K: KeyResolver, S: ScriptResolver>(
    params: &P,
    tx: &TransactionData,
    index: usize,
    script: &Script,
    hash_type: u32,
    key_resolver: &K,
    script_resolver: &S,
    value: Amount,
) -> Result<(Script, ScriptKind), Error> {
    let kind = script.kind();
    let sig_script = match &kind {
        ScriptKind::PubKeyHash { hash } => {
            let addr = TransparentAddress::PublicKeyHash(*hash);
            let (sk, compressed) = key_resolver
                .get_key(&addr)
                .ok_or(Error::MissingKey(addr))?;
            signature_script(
                params, tx, index, script, hash_type, &sk, compressed, value,
            )?
        }
        ScriptKind::ScriptHash { hash } => {
            // The redeem script itself; the caller signs against it and
            // appends it as the final push.
            let addr = TransparentAddress::ScriptHash(*hash);
            script_resolver
                .get_script(&addr)
                .ok_or(Error::MissingRedeemScript(addr))?
        }
        ScriptKind::MultiSig { required, pubkeys } => sign_multisig(
            params,
            tx,
            index,
            script,
            hash_type,
            *required,
            pubkeys,
            key_resolver,
            value,
        ),
        ScriptKind::Unknown => return Err(Error::UnknownScriptKind),
    };
    Ok((sig_script, kind))
}

/// Signs input `index` of `tx`, returning the `scriptSig` for the previous
/// output whose script is `prev_pk_script` and whose value is `value`.
///
/// Keys and redeem scripts are looked up through the provided resolvers. If
/// the caller already holds a partial `scriptSig` for this input, it is merged
/// with the new one. The transaction itself is not modified; the caller
/// assigns the returned script to the input.
#[allow(clippy::too_many_arguments)]
pub fn sign_input<P: Parameters, K: KeyResolver, S: ScriptResolver>(
    params: &P,
    tx: &TransactionData,
    index: usize,
    prev_pk_script: &Script,
    hash_type: u32,
    key_resolver: &K,
    script_resolver: &S,
    prev_script_sig: Option<&Script>,
    value: Amount,
) -> Result<Script, Error> {
    if index >= tx.vin.len() {
        return Err(Error::InvalidIndex {
            index,
            inputs: tx.vin.len(),
        });
    }

    let (sig_script, kind) = sign_step(
        params,
        tx,
        index,
        prev_pk_script,
        hash_type,
        key_resolver,
        script_resolver,
        value,
    )?;

    let sig_script = if let ScriptKind::ScriptHash { .. } = kind {
        // The first pass resolved the redeem script; sign against it, then
        // append it as the final data push of the outer scriptSig.
        let redeem_script = sig_script;
        let (inner, _) = sign_step(
            params,
            tx,
            index,
            &redeem_script,
            hash_type,
            key_resolver,
            script_resolver,
            value,
        )?;
        inner << &redeem_script.0[..]
    } else {
        sig_script
    };

    Ok(merge_scripts(sig_script, prev_script_sig))
}

/// Merges a freshly generated `scriptSig` with a previous partial one.
///
/// Only multisig (and P2SH-wrapped multisig) can meaningfully combine partial
/// scripts; everything else either has its single signature or does not. The
/// longer candidate is kept, matching the behaviour of the reference
/// implementation. A semantic merge for partially signed multisig would have
/// to parse and recombine the pushed signatures.
fn merge_scripts(sig_script: Script, prev_script_sig: Option<&Script>) -> Script {
    match prev_script_sig {
        Some(prev) if prev.0.len() > sig_script.0.len() => prev.clone(),
        _ => sig_script,
    }
}
