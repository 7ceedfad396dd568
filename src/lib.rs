//! wallet-manager - 加密货币钱包后端
//!
//! 钱包列表（附实时余额）、创建钱包、系统内钱包之间转账；链上操作交给链客户端

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod repository;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};
