pub mod classifier;
pub mod cli;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod logging;
pub mod models;
pub mod process_types;
pub mod reports;
pub mod selector;
pub mod session;
pub mod settings;
