//! Checksums and archive read-back verification

pub mod checksum;
pub mod report;
pub mod verify;

pub use report::{VerificationFailure, VerificationReport};
pub use verify::{verify_archive, ExpectedEntry};
