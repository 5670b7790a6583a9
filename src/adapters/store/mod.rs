//! Artifact store gateway and its local implementations

pub mod local;
pub mod memory;
pub mod traits;

pub use local::LocalArtifactStore;
pub use memory::InMemoryArtifactStore;
pub use traits::ArtifactStore;
