pub mod wallets;

pub use wallets::{CreateWalletParams, PgWalletRepository, Wallet, WalletRepository};
