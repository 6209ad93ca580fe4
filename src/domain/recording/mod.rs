//! Recording value objects

pub mod duration;
pub mod stream;

pub use duration::Duration;
pub use stream::{RecorderEvent, StreamId};
