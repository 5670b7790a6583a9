//! Archive building: placement plans, zip volumes and metadata files

pub mod builder;
pub mod manifest;
pub mod plan;

pub use builder::{
    build_archive, drop_unreadable, ArchiveLimits, ArchiveOutcome, ArchiveRequest, EntryEvent,
    SkippedEntry, WrittenEntry,
};
pub use manifest::{Manifest, MetadataFiles};
pub use plan::{ArchivePlacementPlan, PlacementEntry};
