pub mod archiver;
pub mod collector;
pub mod snapshot;
