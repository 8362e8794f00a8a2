mod memory;
mod pool;
mod postgres;
mod store;

pub use memory::MemoryHealthLogStore;
pub use pool::create_pool;
pub use postgres::PgHealthLogStore;
pub use store::{HealthLogStore, ProfileStore};
