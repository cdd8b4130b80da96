//! Database adapters for configuration reads and trigger persistence.

pub mod postgres;

pub use postgres::PgStore;
