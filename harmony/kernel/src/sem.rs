//! Kernel counting semaphores.

pub mod object;
pub mod table;

pub use object::Semaphore;
pub use table::SemTable;
