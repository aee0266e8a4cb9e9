//! Application services layered over the repositories.

mod database;

pub use database::DatabaseService;
