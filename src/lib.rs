pub mod config;
pub mod exchange;
pub mod files;
pub mod ids;
pub mod logging;
pub mod naming;
pub mod notify;
pub mod recorder;
pub mod stub;
pub mod verify;
