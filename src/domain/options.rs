//! Export request options
//!
//! An [`ExportOptions`] value is captured on the operation at creation and is
//! never modified afterwards. It carries the per-file transform settings, the
//! archive layout and compression settings, and the portfolio presentation.

use crate::domain::errors::CourierError;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Output format requested for converted files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the source format and extension
    #[default]
    Original,
    Png,
    Jpeg,
    Webp,
    Tiff,
    Bmp,
}

impl OutputFormat {
    /// File extension (without dot) for converted outputs, `None` keeps the source extension
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Original => None,
            OutputFormat::Png => Some("png"),
            OutputFormat::Jpeg => Some("jpg"),
            OutputFormat::Webp => Some("webp"),
            OutputFormat::Tiff => Some("tiff"),
            OutputFormat::Bmp => Some("bmp"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Original => "original",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Bmp => "bmp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "original" => Ok(OutputFormat::Original),
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            "bmp" => Ok(OutputFormat::Bmp),
            other => Err(CourierError::Validation(format!(
                "unknown output format: {other}"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ZIP compression method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    /// No compression
    Stored,
    /// Standard deflate compression
    #[default]
    Deflated,
    Bzip2,
}

impl CompressionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::Stored => "stored",
            CompressionMethod::Deflated => "deflated",
            CompressionMethod::Bzip2 => "bzip2",
        }
    }
}

impl FromStr for CompressionMethod {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stored" | "store" | "none" => Ok(CompressionMethod::Stored),
            "deflated" | "deflate" => Ok(CompressionMethod::Deflated),
            "bzip2" => Ok(CompressionMethod::Bzip2),
            other => Err(CourierError::Validation(format!(
                "unknown compression method: {other}"
            ))),
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compression method and level applied to archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    pub method: CompressionMethod,

    /// 0 (fastest) to 9 (smallest)
    pub level: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Deflated,
            level: 6,
        }
    }
}

/// Rule used to lay out input files inside an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StructureMode {
    /// Every file at the archive root under its original name
    Flat,
    /// `images/`, `metadata/` and `files/` folders with a sequence prefix
    #[default]
    Organized,
    /// One folder per creation date
    ByDate,
    /// One folder per file extension
    ByType,
    /// Caller-supplied mapping from file id to archive path
    Custom,
}

impl StructureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureMode::Flat => "flat",
            StructureMode::Organized => "organized",
            StructureMode::ByDate => "by_date",
            StructureMode::ByType => "by_type",
            StructureMode::Custom => "custom",
        }
    }
}

impl FromStr for StructureMode {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "flat" => Ok(StructureMode::Flat),
            "organized" => Ok(StructureMode::Organized),
            "by_date" => Ok(StructureMode::ByDate),
            "by_type" => Ok(StructureMode::ByType),
            "custom" => Ok(StructureMode::Custom),
            other => Err(CourierError::Validation(format!(
                "unknown structure mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for StructureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target dimensions passed through to the file transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub maintain_aspect: bool,
}

/// What the file transformer is asked to produce for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub format: OutputFormat,
    pub quality: u8,
    pub resize: Option<ResizeSpec>,
    pub watermark: bool,
}

/// Portfolio colour theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioTheme {
    #[default]
    Professional,
    Creative,
    Minimal,
    Dark,
    Gallery,
}

impl PortfolioTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortfolioTheme::Professional => "professional",
            PortfolioTheme::Creative => "creative",
            PortfolioTheme::Minimal => "minimal",
            PortfolioTheme::Dark => "dark",
            PortfolioTheme::Gallery => "gallery",
        }
    }
}

/// Portfolio page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    #[default]
    Grid,
    Masonry,
    List,
}

impl LayoutStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutStyle::Grid => "grid",
            LayoutStyle::Masonry => "masonry",
            LayoutStyle::List => "list",
        }
    }
}

/// Presentation settings for HTML portfolios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOptions {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub footer_text: Option<String>,
    pub theme: PortfolioTheme,
    pub layout: LayoutStyle,
    pub show_metadata: bool,

    /// Zip the rendered portfolio directory into a single download
    pub bundle: bool,
}

impl Default for PortfolioOptions {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            subtitle: None,
            description: None,
            footer_text: None,
            theme: PortfolioTheme::default(),
            layout: LayoutStyle::default(),
            show_metadata: true,
            bundle: true,
        }
    }
}

/// Immutable request parameters of an export operation
///
/// # Examples
///
/// ```
/// use courier::domain::options::{ExportOptions, StructureMode, CompressionMethod};
///
/// let options = ExportOptions::default()
///     .with_structure(StructureMode::ByType)
///     .with_compression(CompressionMethod::Stored, 0)
///     .with_archive_name("renders");
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: OutputFormat,

    /// 1 to 100
    pub quality: u8,
    pub resize: Option<ResizeSpec>,
    pub watermark: bool,

    /// Output name for single-file exports
    pub custom_filename: Option<String>,

    /// Archive (or portfolio directory) name without extension
    pub archive_name: Option<String>,
    pub structure: StructureMode,

    /// `file_id -> archive path`, used when `structure` is `Custom`
    pub custom_structure: BTreeMap<String, String>,
    pub compression: CompressionSettings,

    /// Write `manifest.json` into the archive
    pub include_metadata: bool,
    pub include_readme: bool,
    pub include_csv_index: bool,

    pub portfolio: PortfolioOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: 95,
            resize: None,
            watermark: false,
            custom_filename: None,
            archive_name: None,
            structure: StructureMode::default(),
            custom_structure: BTreeMap::new(),
            compression: CompressionSettings::default(),
            include_metadata: true,
            include_readme: true,
            include_csv_index: true,
            portfolio: PortfolioOptions::default(),
        }
    }
}

impl ExportOptions {
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_structure(mut self, structure: StructureMode) -> Self {
        self.structure = structure;
        self
    }

    pub fn with_compression(mut self, method: CompressionMethod, level: u8) -> Self {
        self.compression = CompressionSettings { method, level };
        self
    }

    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = Some(name.into());
        self
    }

    pub fn with_custom_filename(mut self, name: impl Into<String>) -> Self {
        self.custom_filename = Some(name.into());
        self
    }

    /// Adds one `file_id -> archive path` entry and switches to the custom layout
    pub fn with_custom_path(mut self, file_id: impl Into<String>, path: impl Into<String>) -> Self {
        self.structure = StructureMode::Custom;
        self.custom_structure.insert(file_id.into(), path.into());
        self
    }

    /// Disables manifest, README and CSV index
    pub fn without_metadata(mut self) -> Self {
        self.include_metadata = false;
        self.include_readme = false;
        self.include_csv_index = false;
        self
    }

    pub fn with_portfolio(mut self, portfolio: PortfolioOptions) -> Self {
        self.portfolio = portfolio;
        self
    }

    /// Parameters handed to the file transformer
    pub fn transform_spec(&self) -> TransformSpec {
        TransformSpec {
            format: self.format,
            quality: self.quality,
            resize: self.resize,
            watermark: self.watermark,
        }
    }

    /// Checks option ranges before any work is scheduled
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(CourierError::Validation(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }

        if self.compression.level > 9 {
            return Err(CourierError::Validation(format!(
                "compression level must be between 0 and 9, got {}",
                self.compression.level
            )));
        }

        if let Some(name) = &self.custom_filename {
            if name.trim().is_empty() {
                return Err(CourierError::Validation(
                    "custom filename cannot be empty".to_string(),
                ));
            }
        }

        if let Some(name) = &self.archive_name {
            if name.trim().is_empty() || name.contains(['/', '\\']) || name.contains("..") {
                return Err(CourierError::Validation(format!(
                    "invalid archive name: '{name}'"
                )));
            }
        }

        for (file_id, path) in &self.custom_structure {
            let unified = path.replace('\\', "/");
            let segments: Vec<&str> = unified
                .split('/')
                .filter(|segment| !segment.is_empty() && *segment != ".")
                .collect();
            if path.trim().is_empty()
                || path.starts_with('/')
                || segments.is_empty()
                || segments.contains(&"..")
            {
                return Err(CourierError::Validation(format!(
                    "invalid custom archive path for {file_id}: '{path}'"
                )));
            }
        }

        if let Some(resize) = &self.resize {
            if resize.width == Some(0) || resize.height == Some(0) {
                return Err(CourierError::Validation(
                    "resize dimensions must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}
