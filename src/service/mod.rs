pub mod currency;
pub mod ethereum;
pub mod transactions;
pub mod wallets;

pub use currency::{CurrencyManager, CurrencyRegistry, ManagerError};
