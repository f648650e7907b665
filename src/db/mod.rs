//! MongoDB persistence for the catalog store

pub mod mongo;
pub mod schemas;
pub mod store;

pub use mongo::{MongoClient, MongoCollection};
pub use store::MongoCatalogStore;
