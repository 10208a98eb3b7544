pub mod alert;
pub mod config;
pub mod data_ingestion;
pub mod logging;
pub mod notify;
