//! File transformer seam

pub mod passthrough;
pub mod traits;

pub use passthrough::PassthroughTransformer;
pub use traits::FileTransformer;
