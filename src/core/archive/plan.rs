//! Archive placement plan
//!
//! Maps every resolved input file to its path inside the archive. A plan is
//! computed once per archive build and dropped after the archive is written.

use crate::domain::artifact::StoredArtifact;
use crate::domain::options::StructureMode;
use std::collections::{BTreeMap, HashSet};

/// One file and where it goes inside the archive
#[derive(Debug, Clone)]
pub struct PlacementEntry {
    pub artifact: StoredArtifact,

    /// `/`-separated path relative to the archive root
    pub archive_path: String,
}

impl PlacementEntry {
    /// Folder part of the archive path, empty for root entries
    pub fn folder(&self) -> &str {
        self.archive_path
            .rsplit_once('/')
            .map(|(folder, _)| folder)
            .unwrap_or("")
    }
}

/// Collision-free mapping from input files to archive paths
#[derive(Debug, Clone, Default)]
pub struct ArchivePlacementPlan {
    entries: Vec<PlacementEntry>,
}

impl ArchivePlacementPlan {
    /// Lays out `artifacts` according to `structure`
    ///
    /// `custom` maps file ids to archive paths and is only read for
    /// [`StructureMode::Custom`]. Colliding paths get `_1`, `_2`, ... inserted
    /// before the extension, in input order.
    pub fn build(
        artifacts: Vec<StoredArtifact>,
        structure: StructureMode,
        custom: &BTreeMap<String, String>,
    ) -> Self {
        Self::build_reserving(artifacts, structure, custom, &[])
    }

    /// Like [`build`](Self::build), but never hands out a path in `reserved`
    ///
    /// Used to keep input files clear of the metadata files written next to
    /// them; a file named `manifest.json` becomes `manifest_1.json`.
    pub fn build_reserving(
        artifacts: Vec<StoredArtifact>,
        structure: StructureMode,
        custom: &BTreeMap<String, String>,
        reserved: &[&str],
    ) -> Self {
        let mut used: HashSet<String> = reserved.iter().map(|path| path.to_string()).collect();
        let entries = artifacts
            .into_iter()
            .enumerate()
            .map(|(index, artifact)| {
                let candidate = candidate_path(&artifact, index, structure, custom);
                let archive_path = unique_path(&candidate, &mut used);
                PlacementEntry {
                    artifact,
                    archive_path,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[PlacementEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combined size of all planned files in bytes
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.artifact.size).sum()
    }

    /// Drops the entries rejected by `keep`, returning them
    pub fn retain(&mut self, mut keep: impl FnMut(&PlacementEntry) -> bool) -> Vec<PlacementEntry> {
        let (kept, dropped) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| keep(entry));
        self.entries = kept;
        dropped
    }

    /// Splits the plan into consecutive volumes whose payload stays within
    /// `max_bytes`; a single larger file gets a volume of its own
    pub fn volumes(&self, max_bytes: Option<u64>) -> Vec<&[PlacementEntry]> {
        let Some(limit) = max_bytes else {
            return vec![&self.entries[..]];
        };

        let mut volumes = Vec::new();
        let mut start = 0;
        let mut payload = 0u64;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > start && payload + entry.artifact.size > limit {
                volumes.push(&self.entries[start..i]);
                start = i;
                payload = 0;
            }
            payload += entry.artifact.size;
        }
        if start < self.entries.len() || volumes.is_empty() {
            volumes.push(&self.entries[start..]);
        }
        volumes
    }
}

fn candidate_path(
    artifact: &StoredArtifact,
    index: usize,
    structure: StructureMode,
    custom: &BTreeMap<String, String>,
) -> String {
    let name = sanitize_name(&artifact.original_name);
    match structure {
        StructureMode::Flat => name,
        StructureMode::Organized => {
            let folder = match artifact.extension().as_deref() {
                Some("jpg" | "jpeg" | "png" | "webp" | "gif") => "images",
                Some("json") => "metadata",
                _ => "files",
            };
            format!("{folder}/{:03}_{name}", index + 1)
        }
        StructureMode::ByDate => {
            format!("{}/{name}", artifact.created_at.format("%Y-%m-%d"))
        }
        StructureMode::ByType => {
            let folder = artifact.extension().unwrap_or_else(|| "unknown".to_string());
            format!("{folder}/{name}")
        }
        StructureMode::Custom => match custom.get(artifact.file_id.as_str()) {
            Some(path) => normalize_custom(path),
            None => format!("uncategorized/{name}"),
        },
    }
}

/// Keeps a file name to a single path segment
pub(crate) fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

fn normalize_custom(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn unique_path(candidate: &str, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.to_string()) {
        return candidate.to_string();
    }

    let (folder, name) = match candidate.rsplit_once('/') {
        Some((folder, name)) => (Some(folder), name),
        None => (None, candidate),
    };
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut counter = 1;
    loop {
        let renamed = match ext {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let path = match folder {
            Some(folder) => format!("{folder}/{renamed}"),
            None => renamed,
        };
        if used.insert(path.clone()) {
            return path;
        }
        counter += 1;
    }
}
