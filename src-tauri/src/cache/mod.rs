mod disk;
mod memory;

pub use disk::CoverCache;
pub use memory::CoverMemoryCache;
