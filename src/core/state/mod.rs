//! Operation registry and state machine enforcement

pub mod registry;

pub use registry::{Completion, IssuedDownload, OperationRegistry};
