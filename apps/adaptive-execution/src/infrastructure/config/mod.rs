//! Dependency wiring.

mod container;

pub use container::{Container, ContainerError, build_blob_store, build_use_case};
