//! Archive metadata files
//!
//! `manifest.json`, `file_index.csv` and `README.md` describe the files of an
//! archive. They are only written into the first volume.

use crate::core::archive::plan::PlacementEntry;
use crate::domain::options::{CompressionSettings, StructureMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CSV_INDEX_FILE: &str = "file_index.csv";
pub const README_FILE: &str = "README.md";

const GENERATOR: &str = concat!("courier ", env!("CARGO_PKG_VERSION"));

/// Which metadata files to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataFiles {
    pub manifest: bool,
    pub csv_index: bool,
    pub readme: bool,
}

impl MetadataFiles {
    pub fn none() -> Self {
        Self {
            manifest: false,
            csv_index: false,
            readme: false,
        }
    }

    pub fn any(&self) -> bool {
        self.manifest || self.csv_index || self.readme
    }

    /// Root-level archive paths taken by the enabled files
    pub fn reserved_paths(&self) -> Vec<&'static str> {
        [
            (self.manifest, MANIFEST_FILE),
            (self.csv_index, CSV_INDEX_FILE),
            (self.readme, README_FILE),
        ]
        .into_iter()
        .filter_map(|(enabled, path)| enabled.then_some(path))
        .collect()
    }
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub archive_info: ArchiveInfo,
    pub files: Vec<ManifestEntry>,
    pub statistics: ManifestStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub generator: String,
    pub file_count: usize,
    pub structure: StructureMode,
    pub compression: CompressionSettings,
    pub volume_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_id: String,
    pub original_filename: String,
    pub archive_path: String,
    pub file_size: u64,
    pub content_type: String,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStatistics {
    pub total_size: u64,
    pub file_types: BTreeMap<String, usize>,
    pub size_distribution: BTreeMap<String, usize>,
}

/// Archive-level facts shared by all metadata files
pub struct ArchiveDescription<'a> {
    pub name: &'a str,
    pub structure: StructureMode,
    pub compression: CompressionSettings,
    pub volume_count: usize,
    pub created_at: DateTime<Utc>,
}

pub fn build_manifest(description: &ArchiveDescription<'_>, entries: &[PlacementEntry]) -> Manifest {
    Manifest {
        archive_info: ArchiveInfo {
            name: description.name.to_string(),
            created_at: description.created_at,
            generator: GENERATOR.to_string(),
            file_count: entries.len(),
            structure: description.structure,
            compression: description.compression,
            volume_count: description.volume_count,
        },
        files: entries
            .iter()
            .map(|entry| ManifestEntry {
                file_id: entry.artifact.file_id.to_string(),
                original_filename: entry.artifact.original_name.clone(),
                archive_path: entry.archive_path.clone(),
                file_size: entry.artifact.size,
                content_type: entry.artifact.content_type.clone(),
                checksum: entry.artifact.checksum.clone(),
                created_at: entry.artifact.created_at,
                metadata: entry.artifact.metadata.clone(),
            })
            .collect(),
        statistics: ManifestStatistics {
            total_size: entries.iter().map(|e| e.artifact.size).sum(),
            file_types: file_type_counts(entries),
            size_distribution: size_distribution(entries),
        },
    }
}

fn file_type_counts(entries: &[PlacementEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        let ext = entry
            .artifact
            .extension()
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| "no_extension".to_string());
        *counts.entry(ext).or_insert(0) += 1;
    }
    counts
}

fn size_distribution(entries: &[PlacementEntry]) -> BTreeMap<String, usize> {
    const MB: u64 = 1024 * 1024;
    let mut buckets: BTreeMap<String, usize> = ["< 1MB", "1-10MB", "10-100MB", "> 100MB"]
        .into_iter()
        .map(|b| (b.to_string(), 0))
        .collect();

    for entry in entries {
        let bucket = match entry.artifact.size {
            s if s < MB => "< 1MB",
            s if s < 10 * MB => "1-10MB",
            s if s < 100 * MB => "10-100MB",
            _ => "> 100MB",
        };
        if let Some(count) = buckets.get_mut(bucket) {
            *count += 1;
        }
    }
    buckets
}

/// Tabular index of the archived files
pub fn build_csv_index(entries: &[PlacementEntry]) -> String {
    let mut out = String::from(
        "file_id,original_filename,archive_path,file_size,content_type,checksum,created_at,has_metadata\n",
    );
    for entry in entries {
        let a = &entry.artifact;
        let row = [
            csv_field(a.file_id.as_str()),
            csv_field(&a.original_name),
            csv_field(&entry.archive_path),
            a.size.to_string(),
            csv_field(&a.content_type),
            csv_field(&a.checksum),
            a.created_at.to_rfc3339(),
            (!a.metadata.is_empty()).to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Human-readable summary of the archive
pub fn build_readme(description: &ArchiveDescription<'_>, entries: &[PlacementEntry]) -> String {
    let total_size: u64 = entries.iter().map(|e| e.artifact.size).sum();
    let mut readme = String::new();

    readme.push_str(&format!("# Export Archive: {}\n\n", description.name));
    readme.push_str("## Archive Information\n\n");
    readme.push_str(&format!(
        "- **Created:** {} UTC\n",
        description.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    readme.push_str(&format!("- **Files:** {}\n", entries.len()));
    readme.push_str(&format!(
        "- **Total Size:** {} bytes ({:.1} MB)\n",
        total_size,
        total_size as f64 / 1024.0 / 1024.0
    ));
    readme.push_str(&format!("- **Structure:** {}\n", description.structure));
    readme.push_str(&format!(
        "- **Compression:** {} (level {})\n",
        description.compression.method, description.compression.level
    ));
    if description.volume_count > 1 {
        readme.push_str(&format!("- **Volumes:** {}\n", description.volume_count));
    }

    readme.push_str("\n## File Organization\n\n");
    let layout = match description.structure {
        StructureMode::Organized => {
            "- `images/` - Image files (PNG, JPEG, WebP, GIF)\n\
             - `metadata/` - JSON metadata files\n\
             - `files/` - Other file types\n"
        }
        StructureMode::ByDate => "- Files are organized by creation date in YYYY-MM-DD folders\n",
        StructureMode::ByType => "- Files are organized by file extension\n",
        StructureMode::Custom => {
            "- Files are placed at caller-defined paths; unmapped files are in `uncategorized/`\n"
        }
        StructureMode::Flat => "- Files are stored at the archive root\n",
    };
    readme.push_str(layout);

    readme.push_str("\n## Metadata Files\n\n");
    readme.push_str(&format!("- `{MANIFEST_FILE}` - Archive manifest with file details\n"));
    readme.push_str(&format!("- `{CSV_INDEX_FILE}` - Tabular index of all files\n"));
    readme.push_str(&format!("- `{README_FILE}` - This file\n"));
    readme.push_str(&format!("\n---\n*Generated by {GENERATOR}.*\n"));

    readme
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::plan::ArchivePlacementPlan;
    use crate::domain::artifact::StoredArtifact;
    use crate::domain::ids::FileId;
    use std::path::PathBuf;

    fn plan() -> ArchivePlacementPlan {
        let artifacts = vec![("a", "a.png", 10), ("b", "b,c.json", 2 * 1024 * 1024)]
            .into_iter()
            .map(|(id, name, size)| StoredArtifact {
                file_id: FileId::new(id).unwrap(),
                original_name: name.to_string(),
                path: PathBuf::from(name),
                size,
                content_type: "application/octet-stream".to_string(),
                checksum: "abc".to_string(),
                created_at: Utc::now(),
                metadata: BTreeMap::new(),
            })
            .collect();
        ArchivePlacementPlan::build(artifacts, StructureMode::Organized, &BTreeMap::new())
    }

    fn description() -> ArchiveDescription<'static> {
        ArchiveDescription {
            name: "renders",
            structure: StructureMode::Organized,
            compression: CompressionSettings::default(),
            volume_count: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_manifest_lists_every_entry() {
        let plan = plan();
        let manifest = build_manifest(&description(), plan.entries());
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.archive_info.file_count, 2);
        assert_eq!(manifest.files[0].archive_path, "images/001_a.png");
        assert_eq!(manifest.statistics.file_types[".png"], 1);
        assert_eq!(manifest.statistics.size_distribution["< 1MB"], 1);
        assert_eq!(manifest.statistics.size_distribution["1-10MB"], 1);
    }

    #[test]
    fn test_manifest_json_shape() {
        let plan = plan();
        let json = serde_json::to_value(build_manifest(&description(), plan.entries())).unwrap();
        assert_eq!(json["archive_info"]["structure"], "organized");
        assert_eq!(json["archive_info"]["compression"]["method"], "deflated");
        assert!(json["files"][0].get("metadata").is_none());
    }

    #[test]
    fn test_csv_quotes_fields() {
        let plan = plan();
        let csv = build_csv_index(plan.entries());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file_id,original_filename"));
        assert!(lines[2].contains("\"b,c.json\""));
    }

    #[test]
    fn test_readme_mentions_layout() {
        let plan = plan();
        let readme = build_readme(&description(), plan.entries());
        assert!(readme.contains("# Export Archive: renders"));
        assert!(readme.contains("`images/`"));
        assert!(readme.contains("- **Files:** 2"));
    }

    #[test]
    fn test_reserved_paths_follow_enabled_files() {
        assert!(MetadataFiles::none().reserved_paths().is_empty());
        let files = MetadataFiles {
            manifest: true,
            csv_index: false,
            readme: true,
        };
        assert_eq!(files.reserved_paths(), vec![MANIFEST_FILE, README_FILE]);
    }

    #[test]
    fn test_readme_line_layout() {
        let plan = plan();
        let readme = build_readme(&description(), plan.entries());
        let lines: Vec<&str> = readme.lines().collect();

        assert_eq!(lines[0], "# Export Archive: renders");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "## Archive Information");
        assert!(readme.contains("\n\n## Metadata Files\n\n- `manifest.json`"));
        assert!(!readme.contains("**Volumes:**"));
        assert!(readme.ends_with(".*\n"));
    }
}
