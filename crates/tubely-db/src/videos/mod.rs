mod memory;
mod postgres;
mod traits;

pub use memory::MemoryVideoStore;
pub use postgres::PgVideoRepository;
pub use traits::VideoStore;
