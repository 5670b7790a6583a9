//! Portfolio page rendering

pub mod builtin;
pub mod traits;

pub use builtin::BuiltinPortfolioRenderer;
pub use traits::{PortfolioAsset, PortfolioRenderer};
