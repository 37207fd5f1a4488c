pub mod constants;
pub mod settings;
pub mod types;
