// starter-auth-memory — HashMap-backed credential store.

pub mod store;

pub use store::MemoryStore;
