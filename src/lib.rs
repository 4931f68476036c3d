pub mod config;
pub mod field;
pub mod lang;
pub mod plot;
