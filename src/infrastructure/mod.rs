pub mod db;
pub mod logging;
