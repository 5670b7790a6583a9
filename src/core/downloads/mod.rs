//! Download tokens and expiry cleanup

pub mod sweeper;
pub mod tokens;

pub use sweeper::{CleanupSweeper, SweepReport};
pub use tokens::{DownloadToken, DownloadTokenManager};
