use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::select;

use secp256k1::{Message, Secp256k1};

use crate::{
    consensus::{BlockHeight, TEST_NETWORK},
    encoding::decode_transparent_address,
    keys::PrivateKey,
    legacy::{hash160, Script, TransparentAddress},
    transaction::{
        components::{amount::MAX_MONEY, Amount, OutPoint, TxIn, TxOut},
        sighash::{signature_hash, TxSigHashes, SIGHASH_ALL},
        sign::{raw_input_signature, sign_input, Error},
        Transaction, TransactionData, TxVersion,
    },
};

const TEST_WIF: &str = "cPAM37GAZpXkS7YRJGRggyKrGk7qEZKjNkXvq9gcgzjYaghrjGhg";

const SIGNED_V3_TX_HEX: &str = "030000807082c403011c15616e8b9a75ad4079a17bb296bcba8bda2712453baf1bde447bfe46be46e4010000006b48304502210093f8edae9784fee695d5ac5f84b4217084345a53c31c9e1e8e2a183ebe15cace02206872d90d0af77a4a4c18b761cf511e4583597ee5503e0e82e491da0f1a4377ed012103362327ee808f5961d26ef1a431386d6190638d67c14aa0e78e2eba1b58870cc0ffffffff02400d0300000000001976a9143b535da0ba90dad71ea005cccfe3cca47d746b3a88ac70d2dd11000000001976a914aefaebf9c83deba2ec76e080e2cec850dec161b188ac00000000ff47030000";

/// Converts a display-order (reversed hex) txid into internal byte order.
fn prev_txid(s: &str) -> [u8; 32] {
    let mut hash = [0; 32];
    hash.copy_from_slice(&hex::decode(s).unwrap());
    hash.reverse();
    hash
}

fn p2pkh_script(addr: &str) -> Script {
    decode_transparent_address(&TEST_NETWORK, addr)
        .unwrap()
        .script()
}

#[test]
fn sign_and_serialize_v3() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();

    let mut tx = TransactionData::new(TxVersion::Overwinter);
    tx.vin.push(TxIn::new(OutPoint::new(
        prev_txid("e446be46fe7b44de1baf3b451227da8bbabc96b27ba17940ad759a8b6e61151c"),
        1,
    )));
    tx.vout.push(TxOut {
        value: Amount::from_u64(200_000).unwrap(),
        script_pubkey: p2pkh_script("tmF834qorixnCV18bVrkM8WN1Xasy5eXcZV"),
    });
    tx.vout.push(TxOut {
        value: Amount::from_u64(299_750_000).unwrap(),
        script_pubkey: p2pkh_script("tmRfZVuDK6gVDfwJie1zepKjAELqaGAgWZr"),
    });
    tx.expiry_height = BlockHeight::from_u32(215_039);

    let prev_pk_script = Script(
        hex::decode("76a914aefaebf9c83deba2ec76e080e2cec850dec161b188ac").unwrap(),
    );
    let sig_script = sign_input(
        &TEST_NETWORK,
        &tx,
        0,
        &prev_pk_script,
        SIGHASH_ALL,
        &|_: &TransparentAddress| Some((key.secret_key, key.compressed)),
        &|_: &TransparentAddress| -> Option<Script> { None },
        None,
        Amount::ZERO,
    )
    .unwrap();
    tx.vin[0].script_sig = sig_script;

    let tx = tx.freeze().unwrap();
    assert_eq!(tx.to_hex(), SIGNED_V3_TX_HEX);
}

#[test]
fn txid_of_presigned_v3() {
    let mut tx = TransactionData::new(TxVersion::Overwinter);
    tx.vin.push(TxIn {
        prevout: OutPoint::new(
            prev_txid("669f631ce20574fc33cd3e810bac941aff7b661e21ba4769e01bfd68509fc4e6"),
            1,
        ),
        script_sig: Script(
            hex::decode(
                "4730440220307f094227b2e9b130ed9ee5fce75a043bb940681b204d11ca0c3c517f61f9\
                 f60220629e30a2f52e68e1ad6070be544bffc42bc439e7a8ea337f5974f6586222d69f01\
                 2102da48746d58e04a4fb4ce381773cb6c8cedb71d009ebb740dea053c3e0f6cbf3c",
            )
            .unwrap(),
        ),
        sequence: u32::MAX,
    });
    tx.vout.push(TxOut {
        value: Amount::from_u64(299_999_742).unwrap(),
        script_pubkey: p2pkh_script("tmHuu9Z7m5W7PcT4orLEANwnHKrB2aDfx5C"),
    });
    tx.expiry_height = BlockHeight::from_u32(219_152);

    let tx = tx.freeze().unwrap();
    assert_eq!(
        format!("{}", tx.txid()),
        "65282283bfbb131106932683d567c5b8de16bbb9186d22c5bb0d26c9e3fcb096"
    );
}

#[test]
fn signed_v3_hex_round_trip() {
    let tx = Transaction::from_hex(SIGNED_V3_TX_HEX).unwrap();
    assert_eq!(tx.version, TxVersion::Overwinter);
    assert_eq!(tx.vin.len(), 1);
    assert_eq!(tx.vout.len(), 2);
    assert_eq!(tx.expiry_height, BlockHeight::from_u32(215_039));
    assert_eq!(tx.to_hex(), SIGNED_V3_TX_HEX);
}

fn minimal_tx(version: TxVersion) -> TransactionData {
    let mut tx = TransactionData::new(version);
    tx.vin.push(TxIn {
        prevout: OutPoint::new([1; 32], 0),
        script_sig: Script(vec![0x51]),
        sequence: u32::MAX,
    });
    tx.vout.push(TxOut {
        value: Amount::from_u64(1_000).unwrap(),
        script_pubkey: TransparentAddress::PublicKeyHash([4; 20]).script(),
    });
    tx
}

#[test]
fn v4_zero_trailer_round_trip() {
    let tx = minimal_tx(TxVersion::Sapling);
    let mut encoded = vec![];
    tx.write(&mut encoded).unwrap();

    let decoded = Transaction::read(&encoded[..]).unwrap();
    assert_eq!(*decoded, tx);

    // The final bytes are nShieldedSpend, nShieldedOutput, and nJoinSplit;
    // flipping any of them to a nonzero count must fail the decode.
    for offset in [3, 2, 1] {
        let mut tampered = encoded.clone();
        tampered[encoded.len() - offset] = 0x01;
        assert!(
            Transaction::read(&tampered[..]).is_err(),
            "accepted nonzero count at trailing offset {}",
            offset
        );
    }
}

#[test]
fn v3_rejects_joinsplits() {
    let tx = minimal_tx(TxVersion::Overwinter);
    let mut encoded = vec![];
    tx.write(&mut encoded).unwrap();

    let last = encoded.len() - 1;
    encoded[last] = 0x01;
    assert!(Transaction::read(&encoded[..]).is_err());
}

#[test]
fn rejects_non_overwintered() {
    let mut encoded = vec![];
    minimal_tx(TxVersion::Overwinter).write(&mut encoded).unwrap();

    // Clear the overwintered bit in the header.
    encoded[3] &= 0x7f;
    assert!(Transaction::read(&encoded[..]).is_err());
}

#[test]
fn rejects_unknown_version_group() {
    let mut encoded = vec![];
    minimal_tx(TxVersion::Overwinter).write(&mut encoded).unwrap();

    encoded[4] ^= 0xff;
    assert!(Transaction::read(&encoded[..]).is_err());
}

#[test]
fn rejects_version_group_mismatch() {
    let mut encoded = vec![];
    minimal_tx(TxVersion::Overwinter).write(&mut encoded).unwrap();

    // A v3 header with the Sapling version group ID.
    encoded[4..8].copy_from_slice(&0x892F_2085u32.to_le_bytes());
    assert!(Transaction::read(&encoded[..]).is_err());
}

#[test]
fn rejects_expiry_beyond_threshold() {
    let mut tx = minimal_tx(TxVersion::Overwinter);
    tx.expiry_height = BlockHeight::from_u32(500_000_000);
    assert!(tx.write(&mut vec![]).is_err());

    tx.expiry_height = BlockHeight::from_u32(499_999_999);
    assert!(tx.write(&mut vec![]).is_ok());
}

#[test]
fn signing_rejects_out_of_range_index() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let tx = minimal_tx(TxVersion::Overwinter);
    let prev_pk_script = key.address().script();

    let result = raw_input_signature(
        &TEST_NETWORK,
        &tx,
        tx.vin.len(),
        &prev_pk_script,
        SIGHASH_ALL,
        &key.secret_key,
        Amount::ZERO,
    );
    assert_eq!(
        result,
        Err(Error::InvalidIndex {
            index: 1,
            inputs: 1
        })
    );
}

#[test]
fn signing_rejects_unknown_script_kind() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let tx = minimal_tx(TxVersion::Overwinter);

    let result = sign_input(
        &TEST_NETWORK,
        &tx,
        0,
        &Script(vec![0x6a]), // OP_RETURN
        SIGHASH_ALL,
        &|_: &TransparentAddress| Some((key.secret_key, true)),
        &|_: &TransparentAddress| -> Option<Script> { None },
        None,
        Amount::ZERO,
    );
    assert_eq!(result, Err(Error::UnknownScriptKind));
}

#[test]
fn signing_requires_key_for_p2pkh() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let tx = minimal_tx(TxVersion::Overwinter);
    let prev_pk_script = key.address().script();

    let result = sign_input(
        &TEST_NETWORK,
        &tx,
        0,
        &prev_pk_script,
        SIGHASH_ALL,
        &|_: &TransparentAddress| -> Option<(secp256k1::SecretKey, bool)> { None },
        &|_: &TransparentAddress| -> Option<Script> { None },
        None,
        Amount::ZERO,
    );
    assert!(matches!(result, Err(Error::MissingKey(_))));
}

/// 1-of-1 bare multisig redeem script over the given compressed pubkey.
fn multisig_1of1(pubkey: &[u8]) -> Script {
    let mut raw = vec![0x51, 0x21];
    raw.extend_from_slice(pubkey);
    raw.extend_from_slice(&[0x51, 0xae]);
    Script(raw)
}

#[test]
fn sign_p2sh_multisig() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let pubkey = key.pubkey();
    let redeem_script = multisig_1of1(&pubkey);
    let script_hash = hash160(&redeem_script.0);
    let prev_pk_script = TransparentAddress::ScriptHash(script_hash).script();

    let tx = minimal_tx(TxVersion::Sapling);
    let value = Amount::from_u64(50_000).unwrap();

    let redeem_for_resolver = redeem_script.clone();
    let sig_script = sign_input(
        &TEST_NETWORK,
        &tx,
        0,
        &prev_pk_script,
        SIGHASH_ALL,
        &|_: &TransparentAddress| Some((key.secret_key, true)),
        &move |addr: &TransparentAddress| -> Option<Script> {
            if *addr == TransparentAddress::ScriptHash(script_hash) {
                Some(redeem_for_resolver.clone())
            } else {
                None
            }
        },
        None,
        value,
    )
    .unwrap();

    // OP_FALSE, a signature push, and the redeem script as the final push.
    let bytes = &sig_script.0;
    assert_eq!(bytes[0], 0x00);
    let sig_len = bytes[1] as usize;
    let der = &bytes[2..2 + sig_len - 1];
    assert_eq!(bytes[2 + sig_len - 1], SIGHASH_ALL as u8);
    assert_eq!(bytes[2 + sig_len] as usize, redeem_script.0.len());
    assert_eq!(&bytes[3 + sig_len..], &redeem_script.0[..]);

    // The embedded signature must verify against the sighash computed over
    // the redeem script.
    let sighashes = TxSigHashes::new(&tx);
    let digest = signature_hash(
        &TEST_NETWORK,
        &tx,
        &sighashes,
        SIGHASH_ALL,
        0,
        &redeem_script,
        value,
    );
    let secp = Secp256k1::new();
    let msg = Message::from_slice(digest.as_bytes()).unwrap();
    let sig = secp256k1::ecdsa::Signature::from_der(der).unwrap();
    let pk = secp256k1::PublicKey::from_slice(&pubkey).unwrap();
    assert!(secp.verify_ecdsa(&msg, &sig, &pk).is_ok());
}

#[test]
fn multisig_missing_keys_are_skipped() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let tx = minimal_tx(TxVersion::Overwinter);
    let prev_pk_script = multisig_1of1(&key.pubkey());

    let sig_script = sign_input(
        &TEST_NETWORK,
        &tx,
        0,
        &prev_pk_script,
        SIGHASH_ALL,
        &|_: &TransparentAddress| -> Option<(secp256k1::SecretKey, bool)> { None },
        &|_: &TransparentAddress| -> Option<Script> { None },
        None,
        Amount::ZERO,
    )
    .unwrap();

    // No keys resolved: just the OP_FALSE workaround, and no error.
    assert_eq!(sig_script, Script(vec![0x00]));
}

#[test]
fn merge_keeps_longer_script() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let tx = minimal_tx(TxVersion::Overwinter);
    let prev_pk_script = key.address().script();

    let longer = Script(vec![0xab; 200]);
    let sig_script = sign_input(
        &TEST_NETWORK,
        &tx,
        0,
        &prev_pk_script,
        SIGHASH_ALL,
        &|_: &TransparentAddress| Some((key.secret_key, true)),
        &|_: &TransparentAddress| -> Option<Script> { None },
        Some(&longer),
        Amount::ZERO,
    )
    .unwrap();
    assert_eq!(sig_script, longer);
}

#[test]
fn sighash_is_deterministic_and_cache_equivalent() {
    let key = PrivateKey::from_wif(&TEST_NETWORK, TEST_WIF).unwrap();
    let script_code = key.address().script();

    let mut tx = TransactionData::new(TxVersion::Sapling);
    for n in 0..3 {
        tx.vin
            .push(TxIn::new(OutPoint::new([n as u8 + 1; 32], n)));
    }
    tx.vout.push(TxOut {
        value: Amount::from_u64(70_000).unwrap(),
        script_pubkey: TransparentAddress::PublicKeyHash([9; 20]).script(),
    });
    tx.expiry_height = BlockHeight::from_u32(653_600);

    let cached = TxSigHashes::new(&tx);
    for index in 0..tx.vin.len() {
        let reused = signature_hash(
            &TEST_NETWORK,
            &tx,
            &cached,
            SIGHASH_ALL,
            index,
            &script_code,
            Amount::ZERO,
        );
        let fresh = signature_hash(
            &TEST_NETWORK,
            &tx,
            &TxSigHashes::new(&tx),
            SIGHASH_ALL,
            index,
            &script_code,
            Amount::ZERO,
        );
        assert_eq!(reused.as_bytes(), fresh.as_bytes());
    }
}

const VALID_OPCODES: [u8; 8] = [
    0x00, // OP_FALSE,
    0x51, // OP_1,
    0x52, // OP_2,
    0x53, // OP_3,
    0xac, // OP_CHECKSIG,
    0x63, // OP_IF,
    0x65, // OP_VERIF,
    0x6a, // OP_RETURN,
];

prop_compose! {
    fn arb_outpoint()(hash in prop::array::uniform32(1u8..), n in 1..100u32) -> OutPoint {
        OutPoint::new(hash, n)
    }
}

prop_compose! {
    fn arb_script()(v in vec(select(&VALID_OPCODES[..]), 1..256)) -> Script {
        Script(v)
    }
}

prop_compose! {
    fn arb_txin()(prevout in arb_outpoint(), script_sig in arb_script(), sequence in any::<u32>()) -> TxIn {
        TxIn { prevout, script_sig, sequence }
    }
}

prop_compose! {
    fn arb_amount()(value in 0..MAX_MONEY) -> Amount {
        Amount::from_i64(value).unwrap()
    }
}

prop_compose! {
    fn arb_txout()(value in arb_amount(), script_pubkey in arb_script()) -> TxOut {
        TxOut { value, script_pubkey }
    }
}

fn tx_versions() -> impl Strategy<Value = TxVersion> {
    select(vec![TxVersion::Overwinter, TxVersion::Sapling])
}

prop_compose! {
    fn arb_txdata()(
        version in tx_versions(),
        vin in vec(arb_txin(), 0..10),
        vout in vec(arb_txout(), 0..10),
        lock_time in any::<u32>(),
        expiry_height in 0..500_000_000u32,
    ) -> TransactionData {
        TransactionData {
            version,
            vin,
            vout,
            lock_time,
            expiry_height: expiry_height.into(),
        }
    }
}

proptest! {
    #[test]
    fn tx_round_trip(tx in arb_txdata()) {
        let mut txn_bytes = vec![];
        tx.write(&mut txn_bytes).unwrap();

        let txo = Transaction::read(&txn_bytes[..]).unwrap();
        prop_assert_eq!(&*txo, &tx);
    }

    #[test]
    fn tx_hex_round_trip(tx in arb_txdata()) {
        let tx = tx.freeze().unwrap();

        let txo = Transaction::from_hex(&tx.to_hex()).unwrap();
        prop_assert_eq!(txo.txid(), tx.txid());
        prop_assert_eq!(&*txo, &*tx);
    }
}
