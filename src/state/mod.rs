pub mod factory;
pub mod repository;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use repository::Repository;
pub use sled_store::SledStore;
pub use store::*;
