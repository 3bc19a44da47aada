mod transaction;

pub use transaction::{
    CoinReason, CoinTransaction, TransactionKind, WalletError, compute_balance,
};
