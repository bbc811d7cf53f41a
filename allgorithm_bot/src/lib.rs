mod database;
mod entry;
mod handlers;
pub mod notify;
pub mod speed_dating;

pub use entry::*;
