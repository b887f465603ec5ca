// Durable local state: a string-keyed store of JSON-serialized values,
// shared by the pending queue and the profile data.
mod profile;
mod store;

pub use profile::ProfileStore;
pub use store::{FileStore, LocalStore, MemoryStore};
