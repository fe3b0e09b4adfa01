pub mod memory;
pub mod file;
pub mod auto;

pub use memory::MemoryStorage;
pub use file::FileStorage;
pub use auto::open_storage;
