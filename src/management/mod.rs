mod auth;
mod store;

pub use auth::TokenManager;
pub use store::FileStore;
pub use store::MemoryStore;
pub use store::PointerStore;
pub use store::Record;
pub use store::RecordKey;
