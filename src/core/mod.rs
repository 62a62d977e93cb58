pub mod error;
pub mod live_set;
pub mod models;
pub mod settings;
pub mod store;
