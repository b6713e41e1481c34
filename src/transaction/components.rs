//! Structs representing the components within Zcash transactions.

pub mod amount;
pub mod transparent;

pub use self::{
    amount::Amount,
    transparent::{OutPoint, TxIn, TxOut},
};
