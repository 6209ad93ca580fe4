//! Output storage adapters

mod local;

pub use local::LocalVideoStorage;
