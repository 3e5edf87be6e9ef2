pub mod backends;

pub use backends::memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use backends::sqlite::SqliteStore;

pub mod prelude {
    pub use super::MemoryStore;
    #[cfg(feature = "sqlite")]
    pub use super::SqliteStore;
    pub use intel_core::{ArticleStore, StoreStats};
}
