pub mod loader;
pub mod snapshot;
