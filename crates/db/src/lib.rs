pub mod models;
mod store;

pub use store::Db;
