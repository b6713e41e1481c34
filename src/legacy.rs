//! Support for legacy transparent scripts and addresses.

use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Shl;

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::serialize::{CompactSize, Vector};

/// The maximum serialized size of a script, in bytes.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Minimal subset of script opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpCode {
    // push value
    False = 0x00,
    PushData1 = 0x4c,
    PushData2 = 0x4d,
    PushData4 = 0x4e,

    // stack ops
    Dup = 0x76,

    // bit logic
    Equal = 0x87,
    EqualVerify = 0x88,

    // crypto
    Hash160 = 0xa9,
    CheckSig = 0xac,
    CheckMultiSig = 0xae,
}

// OP_1 through OP_16 push their value onto the stack.
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;

fn small_int(op: u8) -> Option<usize> {
    if (OP_1..=OP_16).contains(&op) {
        Some((op - OP_1 + 1) as usize)
    } else {
        None
    }
}

/// A serialized script, used inside transparent inputs and outputs of a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script(pub Vec<u8>);

impl Script {
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let script_len = CompactSize::read(&mut reader)?;
        if script_len > MAX_SCRIPT_SIZE as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "script size limit exceeded",
            ));
        }
        let mut script = vec![0; script_len as usize];
        reader.read_exact(&mut script)?;
        Ok(Script(script))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        Vector::write(&mut writer, &self.0, |w, e| w.write_all(&[*e]))
    }

    /// Decodes this script against the standard output templates the signer
    /// understands.
    pub fn kind(&self) -> ScriptKind {
        if self.0.len() == 25
            && self.0[0..3] == [OpCode::Dup as u8, OpCode::Hash160 as u8, 0x14]
            && self.0[23..25] == [OpCode::EqualVerify as u8, OpCode::CheckSig as u8]
        {
            let mut hash = [0; 20];
            hash.copy_from_slice(&self.0[3..23]);
            ScriptKind::PubKeyHash { hash }
        } else if self.0.len() == 23
            && self.0[0..2] == [OpCode::Hash160 as u8, 0x14]
            && self.0[22] == OpCode::Equal as u8
        {
            let mut hash = [0; 20];
            hash.copy_from_slice(&self.0[2..22]);
            ScriptKind::ScriptHash { hash }
        } else {
            self.multisig_kind().unwrap_or(ScriptKind::Unknown)
        }
    }

    /// Parses `OP_k <pubkey>... OP_n OP_CHECKMULTISIG`, the bare multisig template.
    fn multisig_kind(&self) -> Option<ScriptKind> {
        let script = &self.0;
        if script.len() < 4 || *script.last()? != OpCode::CheckMultiSig as u8 {
            return None;
        }
        let required = small_int(script[0])?;
        let total = small_int(script[script.len() - 2])?;

        let mut pubkeys = vec![];
        let mut cursor = 1;
        while cursor < script.len() - 2 {
            let len = script[cursor] as usize;
            // Only plain pushes of SEC1-sized keys appear in the template.
            if len != 33 && len != 65 {
                return None;
            }
            let end = cursor + 1 + len;
            if end > script.len() - 2 {
                return None;
            }
            pubkeys.push(script[cursor + 1..end].to_vec());
            cursor = end;
        }

        if pubkeys.len() == total && required <= total {
            Some(ScriptKind::MultiSig { required, pubkeys })
        } else {
            None
        }
    }

    /// Returns the address that this Script contains, if any.
    pub fn address(&self) -> Option<TransparentAddress> {
        match self.kind() {
            ScriptKind::PubKeyHash { hash } => Some(TransparentAddress::PublicKeyHash(hash)),
            ScriptKind::ScriptHash { hash } => Some(TransparentAddress::ScriptHash(hash)),
            _ => None,
        }
    }
}

impl Shl<OpCode> for Script {
    type Output = Self;

    fn shl(mut self, rhs: OpCode) -> Self {
        self.0.push(rhs as u8);
        self
    }
}

impl<'a> Shl<&'a [u8]> for Script {
    type Output = Self;

    fn shl(mut self, data: &'a [u8]) -> Self {
        // Compute the shortest push opcode for the given data length.
        if data.len() < OpCode::PushData1 as usize {
            self.0.push(data.len() as u8);
        } else if data.len() <= 255 {
            self.0.push(OpCode::PushData1 as u8);
            self.0.push(data.len() as u8);
        } else if data.len() <= 65535 {
            self.0.push(OpCode::PushData2 as u8);
            self.0.extend(&(data.len() as u16).to_le_bytes());
        } else {
            self.0.push(OpCode::PushData4 as u8);
            self.0.extend(&(data.len() as u32).to_le_bytes());
        }
        self.0.extend(data);
        self
    }
}

/// A decoded standard script template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptKind {
    PubKeyHash {
        hash: [u8; 20],
    },
    ScriptHash {
        hash: [u8; 20],
    },
    MultiSig {
        required: usize,
        pubkeys: Vec<Vec<u8>>,
    },
    Unknown,
}

/// A transparent address corresponding to either a public key hash or a script hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransparentAddress {
    PublicKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
}

impl fmt::Debug for TransparentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicKeyHash(hash) => f
                .debug_tuple("PublicKeyHash")
                .field(&hex::encode(hash))
                .finish(),
            Self::ScriptHash(hash) => f
                .debug_tuple("ScriptHash")
                .field(&hex::encode(hash))
                .finish(),
        }
    }
}

impl TransparentAddress {
    /// Derives the P2PKH transparent address corresponding to the given serialized
    /// pubkey (compressed or uncompressed).
    pub fn from_pubkey(pubkey: &[u8]) -> Self {
        TransparentAddress::PublicKeyHash(hash160(pubkey))
    }

    /// Generate the `scriptPubKey` corresponding to this address.
    pub fn script(&self) -> Script {
        match self {
            TransparentAddress::PublicKeyHash(key_id) => {
                // P2PKH script
                Script::default()
                    << OpCode::Dup
                    << OpCode::Hash160
                    << &key_id[..]
                    << OpCode::EqualVerify
                    << OpCode::CheckSig
            }

            TransparentAddress::ScriptHash(script_id) => {
                // P2SH script
                Script::default() << OpCode::Hash160 << &script_id[..] << OpCode::Equal
            }
        }
    }
}

/// RIPEMD160(SHA256(data)), the hash that transparent addresses commit to.
pub(crate) fn hash160(data: &[u8]) -> [u8; 20] {
    let mut hash = [0; 20];
    hash.copy_from_slice(&Ripemd160::digest(Sha256::digest(data)));
    hash
}
