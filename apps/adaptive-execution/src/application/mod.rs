//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for interacting with external systems
//! - **Services**: Completion monitoring, idempotency and share sizing
//! - **Use Cases**: Application-specific business rules
//! - **DTOs**: Data transfer objects for use case boundaries

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use use_cases::*;
