//! Consensus logic and parameters.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::constants;

/// A block height on the Zcash chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHeight(u32);

impl BlockHeight {
    pub const fn from_u32(v: u32) -> BlockHeight {
        BlockHeight(v)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

impl From<u32> for BlockHeight {
    fn from(value: u32) -> Self {
        BlockHeight(value)
    }
}

impl From<BlockHeight> for u32 {
    fn from(value: BlockHeight) -> u32 {
        value.0
    }
}

/// Per-network chain parameters.
pub trait Parameters: Clone {
    /// The height at which `nu` activates on this network, if it is scheduled.
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight>;

    /// Whether `nu` is in force at `height`. Activation heights are inclusive.
    fn is_nu_active(&self, nu: NetworkUpgrade, height: BlockHeight) -> bool {
        match self.activation_height(nu) {
            Some(activation) => activation <= height,
            None => false,
        }
    }

    /// The two-byte version prefix of Base58Check P2PKH addresses on this
    /// network.
    fn b58_pubkey_address_prefix(&self) -> [u8; 2];

    /// The two-byte version prefix of Base58Check P2SH addresses on this
    /// network.
    fn b58_script_address_prefix(&self) -> [u8; 2];

    /// The version byte of WIF-encoded secret keys on this network.
    fn b58_secret_key_prefix(&self) -> u8;
}

/// The Zcash main network.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct MainNetwork;

pub const MAIN_NETWORK: MainNetwork = MainNetwork;

impl Parameters for MainNetwork {
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight> {
        activation_height(nu)
    }

    fn b58_pubkey_address_prefix(&self) -> [u8; 2] {
        constants::mainnet::B58_PUBKEY_ADDRESS_PREFIX
    }

    fn b58_script_address_prefix(&self) -> [u8; 2] {
        constants::mainnet::B58_SCRIPT_ADDRESS_PREFIX
    }

    fn b58_secret_key_prefix(&self) -> u8 {
        constants::mainnet::B58_SECRET_KEY_PREFIX
    }
}

/// The Zcash test network.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct TestNetwork;

pub const TEST_NETWORK: TestNetwork = TestNetwork;

impl Parameters for TestNetwork {
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight> {
        activation_height(nu)
    }

    fn b58_pubkey_address_prefix(&self) -> [u8; 2] {
        constants::testnet::B58_PUBKEY_ADDRESS_PREFIX
    }

    fn b58_script_address_prefix(&self) -> [u8; 2] {
        constants::testnet::B58_SCRIPT_ADDRESS_PREFIX
    }

    fn b58_secret_key_prefix(&self) -> u8 {
        constants::testnet::B58_SECRET_KEY_PREFIX
    }
}

/// The Zcash regression test network.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct RegtestNetwork;

pub const REGTEST_NETWORK: RegtestNetwork = RegtestNetwork;

impl Parameters for RegtestNetwork {
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight> {
        activation_height(nu)
    }

    fn b58_pubkey_address_prefix(&self) -> [u8; 2] {
        constants::regtest::B58_PUBKEY_ADDRESS_PREFIX
    }

    fn b58_script_address_prefix(&self) -> [u8; 2] {
        constants::regtest::B58_SCRIPT_ADDRESS_PREFIX
    }

    fn b58_secret_key_prefix(&self) -> u8 {
        constants::regtest::B58_SECRET_KEY_PREFIX
    }
}

/// The upgrade schedule used when selecting a consensus branch for signing.
///
/// All supported networks share this schedule; networks that diverge can do so
/// by providing their own [`Parameters`] implementation.
fn activation_height(nu: NetworkUpgrade) -> Option<BlockHeight> {
    match nu {
        NetworkUpgrade::Overwinter => Some(BlockHeight(207_500)),
        NetworkUpgrade::Sapling => Some(BlockHeight(280_000)),
        NetworkUpgrade::Blossom => Some(BlockHeight(653_600)),
    }
}

/// The enumeration of known Zcash networks.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Network {
    MainNetwork,
    TestNetwork,
    RegtestNetwork,
}

impl Parameters for Network {
    fn activation_height(&self, nu: NetworkUpgrade) -> Option<BlockHeight> {
        match self {
            Network::MainNetwork => MAIN_NETWORK.activation_height(nu),
            Network::TestNetwork => TEST_NETWORK.activation_height(nu),
            Network::RegtestNetwork => REGTEST_NETWORK.activation_height(nu),
        }
    }

    fn b58_pubkey_address_prefix(&self) -> [u8; 2] {
        match self {
            Network::MainNetwork => MAIN_NETWORK.b58_pubkey_address_prefix(),
            Network::TestNetwork => TEST_NETWORK.b58_pubkey_address_prefix(),
            Network::RegtestNetwork => REGTEST_NETWORK.b58_pubkey_address_prefix(),
        }
    }

    fn b58_script_address_prefix(&self) -> [u8; 2] {
        match self {
            Network::MainNetwork => MAIN_NETWORK.b58_script_address_prefix(),
            Network::TestNetwork => TEST_NETWORK.b58_script_address_prefix(),
            Network::RegtestNetwork => REGTEST_NETWORK.b58_script_address_prefix(),
        }
    }

    fn b58_secret_key_prefix(&self) -> u8 {
        match self {
            Network::MainNetwork => MAIN_NETWORK.b58_secret_key_prefix(),
            Network::TestNetwork => TEST_NETWORK.b58_secret_key_prefix(),
            Network::RegtestNetwork => REGTEST_NETWORK.b58_secret_key_prefix(),
        }
    }
}

/// An unrecognized network name was provided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownNetworkError(String);

impl fmt::Display for UnknownNetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network name: {}", self.0)
    }
}

impl std::error::Error for UnknownNetworkError {}

impl FromStr for Network {
    type Err = UnknownNetworkError;

    /// Parses the network names in common wallet use, including the Bitcoin-style
    /// `testnet3` alias for the Zcash test network.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" | "main" => Ok(Network::MainNetwork),
            "testnet3" | "testnet" | "test" => Ok(Network::TestNetwork),
            "regtest" => Ok(Network::RegtestNetwork),
            other => Err(UnknownNetworkError(other.to_owned())),
        }
    }
}

/// A named Zcash network upgrade.
///
/// Upgrades are scheduled ahead of time: when the chain reaches an upgrade's
/// activation height, the rules it introduces take over from the previous rule
/// set (see [ZIP 200](https://zips.z.cash/zip-0200)).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkUpgrade {
    /// [Overwinter](https://z.cash/upgrade/overwinter/), which introduced v3
    /// transactions and expiry heights.
    Overwinter,
    /// [Sapling](https://z.cash/upgrade/sapling/), which introduced v4
    /// transactions.
    Sapling,
    /// [Blossom](https://z.cash/upgrade/blossom/), which shortened the target
    /// block spacing.
    Blossom,
}

impl fmt::Display for NetworkUpgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkUpgrade::Overwinter => "Overwinter",
            NetworkUpgrade::Sapling => "Sapling",
            NetworkUpgrade::Blossom => "Blossom",
        })
    }
}

impl NetworkUpgrade {
    const fn branch_id(self) -> BranchId {
        match self {
            NetworkUpgrade::Overwinter => BranchId::Overwinter,
            NetworkUpgrade::Sapling => BranchId::Sapling,
            NetworkUpgrade::Blossom => BranchId::Blossom,
        }
    }
}

/// Every upgrade this crate knows about, earliest activation first.
///
/// [`BranchId::for_height`] walks this list from the newest end, so extending
/// the crate to a later upgrade means appending here along with the matching
/// [`NetworkUpgrade`] and [`BranchId`] variants.
const UPGRADES_IN_ORDER: &[NetworkUpgrade] = &[
    NetworkUpgrade::Overwinter,
    NetworkUpgrade::Sapling,
    NetworkUpgrade::Blossom,
];

/// Identifies the consensus rule set in force between two network upgrades.
///
/// Signatures commit to a branch ID through the sighash personalization, which
/// makes a transaction signed under one rule set invalid under every other —
/// the replay protection of [ZIP 200](https://zips.z.cash/zip-0200).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchId {
    /// The rules in force from launch until Overwinter.
    Sprout,
    /// The rules introduced by Overwinter.
    Overwinter,
    /// The rules introduced by Sapling.
    Sapling,
    /// The rules introduced by Blossom.
    Blossom,
}

impl BranchId {
    /// The raw 4-byte identifier this branch serializes to.
    const fn value(self) -> u32 {
        match self {
            BranchId::Sprout => 0,
            BranchId::Overwinter => 0x5ba8_1b19,
            BranchId::Sapling => 0x76b8_09bb,
            BranchId::Blossom => 0x2bb4_0e60,
        }
    }

    /// Returns the branch whose rules are in force at `height`: the newest
    /// upgrade activated at or before that height, or [`BranchId::Sprout`]
    /// when none has activated yet. Heights past the end of the schedule fall
    /// into its newest branch.
    pub fn for_height<P: Parameters>(parameters: &P, height: BlockHeight) -> Self {
        UPGRADES_IN_ORDER
            .iter()
            .rev()
            .find(|nu| parameters.is_nu_active(**nu, height))
            .map_or(BranchId::Sprout, |nu| nu.branch_id())
    }
}

impl From<BranchId> for u32 {
    fn from(branch_id: BranchId) -> u32 {
        branch_id.value()
    }
}

impl TryFrom<u32> for BranchId {
    type Error = &'static str;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        [
            BranchId::Sprout,
            BranchId::Overwinter,
            BranchId::Sapling,
            BranchId::Blossom,
        ]
        .into_iter()
        .find(|branch| branch.value() == value)
        .ok_or("unrecognized consensus branch ID")
    }
}
