//! Command implementations.

mod index;
mod read;
mod validate;

pub use index::run_index;
pub use read::run_read;
pub use validate::run_validate;
