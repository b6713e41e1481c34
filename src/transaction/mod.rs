//! Structs and methods for handling Zcash transparent transactions.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};
use std::ops::Deref;

use crate::{
    consensus::BlockHeight,
    serialize::{CompactSize, Vector},
};

use self::{
    components::{TxIn, TxOut},
    util::sha256d::{HashReader, HashWriter},
};

pub mod components;
pub mod sighash;
pub mod sign;
pub mod util;

#[cfg(test)]
mod tests;

pub use self::sighash::{
    signature_hash, TxSigHashes, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE, SIGHASH_SINGLE,
};
pub use self::sign::{raw_input_signature, sign_input, KeyResolver, ScriptResolver};

const OVERWINTER_VERSION_GROUP_ID: u32 = 0x03C4_8270;
const OVERWINTER_TX_VERSION: u32 = 3;
const SAPLING_VERSION_GROUP_ID: u32 = 0x892F_2085;
const SAPLING_TX_VERSION: u32 = 4;

/// No transaction may expire at this block height or beyond it.
const EXPIRY_HEIGHT_THRESHOLD: u32 = 500_000_000;

/// A transaction identifier: the double-SHA256 of the serialized transaction.
#[derive(Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct TxId(pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Txids display the digest back to front, per Bitcoin convention.
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// The transaction wire formats this crate accepts.
///
/// A format is the pairing of a version number (written with the
/// "overwintered" flag in its top bit) and the version group ID that follows
/// it on the wire. Decoding insists on one of the two pairings below and
/// rejects everything else, including pre-Overwinter transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxVersion {
    Overwinter,
    Sapling,
}

impl TxVersion {
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let header = reader.read_u32::<LittleEndian>()?;
        let overwintered = (header >> 31) == 1;
        let version = header & 0x7FFF_FFFF;

        if !overwintered {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "transaction is not overwintered",
            ));
        }

        match (version, reader.read_u32::<LittleEndian>()?) {
            (OVERWINTER_TX_VERSION, OVERWINTER_VERSION_GROUP_ID) => Ok(TxVersion::Overwinter),
            (SAPLING_TX_VERSION, SAPLING_VERSION_GROUP_ID) => Ok(TxVersion::Sapling),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "unknown transaction format",
            )),
        }
    }

    /// The header word: the version number with the "overwintered" bit set.
    pub fn header(&self) -> u32 {
        (1 << 31)
            | match self {
                TxVersion::Overwinter => OVERWINTER_TX_VERSION,
                TxVersion::Sapling => SAPLING_TX_VERSION,
            }
    }

    pub fn version_group_id(&self) -> u32 {
        match self {
            TxVersion::Overwinter => OVERWINTER_VERSION_GROUP_ID,
            TxVersion::Sapling => SAPLING_VERSION_GROUP_ID,
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.header())?;
        writer.write_u32::<LittleEndian>(self.version_group_id())
    }

    pub fn has_sapling(&self) -> bool {
        match self {
            TxVersion::Overwinter => false,
            TxVersion::Sapling => true,
        }
    }
}

/// The data of a Zcash transparent transaction.
///
/// The shielded portions of the wire format (the Sapling value balance, spend and
/// output descriptions, and Sprout JoinSplits) are not represented; they are
/// serialized as empty, and [`Transaction::read`] rejects encodings in which any
/// of them is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionData {
    pub version: TxVersion,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
    pub lock_time: u32,
    pub expiry_height: BlockHeight,
}

impl TransactionData {
    pub fn new(version: TxVersion) -> Self {
        TransactionData {
            version,
            vin: vec![],
            vout: vec![],
            lock_time: 0,
            expiry_height: 0u32.into(),
        }
    }

    /// Computes the transaction id, consuming self into a frozen [`Transaction`].
    pub fn freeze(self) -> io::Result<Transaction> {
        Transaction::from_data(self)
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        if u32::from(self.expiry_height) >= EXPIRY_HEIGHT_THRESHOLD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "expiry height is out of range",
            ));
        }

        self.version.write(&mut writer)?;
        Vector::write(&mut writer, &self.vin, |w, e| e.write(w))?;
        Vector::write(&mut writer, &self.vout, |w, e| e.write(w))?;
        writer.write_u32::<LittleEndian>(self.lock_time)?;
        writer.write_u32::<LittleEndian>(self.expiry_height.into())?;

        if self.version.has_sapling() {
            // valueBalance, nShieldedSpend, nShieldedOutput
            writer.write_i64::<LittleEndian>(0)?;
            CompactSize::write(&mut writer, 0)?;
            CompactSize::write(&mut writer, 0)?;
        }

        // nJoinSplit
        CompactSize::write(&mut writer, 0)
    }
}

/// A transparent Zcash transaction, with its txid precomputed.
#[derive(Clone, Debug)]
pub struct Transaction {
    txid: TxId,
    data: TransactionData,
}

impl Deref for Transaction {
    type Target = TransactionData;

    fn deref(&self) -> &TransactionData {
        &self.data
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Transaction) -> bool {
        self.txid == other.txid
    }
}

impl Transaction {
    fn from_data(data: TransactionData) -> io::Result<Self> {
        let mut writer = HashWriter::default();
        data.write(&mut writer)?;
        Ok(Transaction {
            txid: TxId(writer.into_hash()),
            data,
        })
    }

    pub fn txid(&self) -> TxId {
        self.txid
    }

    pub fn read<R: Read>(reader: R) -> io::Result<Self> {
        let mut reader = HashReader::new(reader);

        let version = TxVersion::read(&mut reader)?;
        let vin = Vector::read(&mut reader, TxIn::read)?;
        let vout = Vector::read(&mut reader, TxOut::read)?;
        let lock_time = reader.read_u32::<LittleEndian>()?;
        let expiry_height: BlockHeight = reader.read_u32::<LittleEndian>()?.into();
        if u32::from(expiry_height) >= EXPIRY_HEIGHT_THRESHOLD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "expiry height is out of range",
            ));
        }

        if version.has_sapling() {
            // The value balance is fixed at zero for transparent transactions; the
            // shielded component counts are validity conditions.
            reader.read_i64::<LittleEndian>()?;
            let n_shielded_spends = CompactSize::read(&mut reader)?;
            let n_shielded_outputs = CompactSize::read(&mut reader)?;
            if n_shielded_spends != 0 || n_shielded_outputs != 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Sapling components in a transparent transaction",
                ));
            }
        }

        let n_joinsplits = CompactSize::read(&mut reader)?;
        if n_joinsplits != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Sprout JoinSplits in a transparent transaction",
            ));
        }

        Ok(Transaction {
            txid: TxId(reader.into_hash()),
            data: TransactionData {
                version,
                vin,
                vout,
                lock_time,
                expiry_height,
            },
        })
    }

    pub fn from_hex(s: &str) -> io::Result<Self> {
        let data = hex::decode(s)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid hex"))?;
        Self::read(&data[..])
    }

    pub fn to_hex(&self) -> String {
        let mut data = vec![];
        self.data
            .write(&mut data)
            .expect("frozen transactions are serializable");
        hex::encode(data)
    }
}
