//! External collaborators of the export engine.
//!
//! This module provides the narrow interfaces Courier consumes, each with a
//! local implementation:
//!
//! - [`store`] - Artifact store gateway (directory-backed and in-memory)
//! - [`transform`] - File transformer (passthrough)
//! - [`render`] - Portfolio page renderer (built-in HTML)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with in-memory implementations. The orchestrator only sees
//! the traits, bundled in [`Collaborators`].
//!
//! ```rust,no_run
//! use courier::adapters::{Collaborators, InMemoryArtifactStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryArtifactStore::new());
//! let collaborators = Collaborators::with_store(store);
//! ```

pub mod factory;
pub mod render;
pub mod store;
pub mod transform;

pub use factory::{create_local_collaborators, Collaborators};
pub use render::{BuiltinPortfolioRenderer, PortfolioAsset, PortfolioRenderer};
pub use store::{ArtifactStore, InMemoryArtifactStore, LocalArtifactStore};
pub use transform::{FileTransformer, PassthroughTransformer};
