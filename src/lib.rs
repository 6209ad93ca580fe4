//! Duo Stitch - synchronized dual-camera capture and split-screen composition
//!
//! Records a front and a back camera at the same time, waits until both
//! recordings are finalized, then composes them into one portrait video:
//! back camera on top, front camera below, front audio kept.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Geometry, recording and job value objects, the composition
//!   timeline, configuration and errors
//! - **Application**: Use cases (join coordinator, composition engine, job
//!   owner) and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (FFmpeg, ffprobe, local
//!   storage, notifications, config file)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
