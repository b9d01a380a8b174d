//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every field has a serde default so partial config files load cleanly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// External tool locations and invocation shapes.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Filename normalization options.
    #[serde(default)]
    pub naming: NamingSettings,

    /// Destination layout limits.
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Run behavior.
    #[serde(default)]
    pub run: RunSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tools: ToolSettings::default(),
            naming: NamingSettings::default(),
            layout: LayoutSettings::default(),
            run: RunSettings::default(),
        }
    }
}

impl Settings {
    /// Check option values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), String> {
        if self.layout.max_entries == 0 {
            return Err("layout.max_entries must be at least 1".to_string());
        }
        let sep = self.naming.extension_separator;
        if !sep.is_ascii_graphic() {
            return Err(format!(
                "naming.extension_separator must be a printable ASCII character, got {sep:?}"
            ));
        }
        if self.layout.bucket_prefix.is_empty() {
            return Err("layout.bucket_prefix must not be empty".to_string());
        }
        if !self.tools.disk_lister.is_empty() && self.tools.disk_lister[0].is_empty() {
            return Err("tools.disk_lister program name must not be empty".to_string());
        }
        Ok(())
    }
}

/// External tool programs.
///
/// Plain fields are program names resolved through PATH (or absolute
/// paths). The disk lister is a full argv template because listers differ
/// in argument shape; `{image}` is replaced with the image path, and an
/// empty array disables listing entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_unzip")]
    pub unzip: String,

    #[serde(default = "default_unrar")]
    pub unrar: String,

    #[serde(default = "default_gzip")]
    pub gzip: String,

    #[serde(default = "default_tar")]
    pub tar: String,

    #[serde(default = "default_cbmconvert")]
    pub cbmconvert: String,

    #[serde(default = "default_zip2disk")]
    pub zip2disk: String,

    #[serde(default = "default_disk_lister")]
    pub disk_lister: Vec<String>,
}

fn default_unzip() -> String {
    "unzip".to_string()
}

fn default_unrar() -> String {
    "unrar".to_string()
}

fn default_gzip() -> String {
    "gzip".to_string()
}

fn default_tar() -> String {
    "tar".to_string()
}

fn default_cbmconvert() -> String {
    "cbmconvert".to_string()
}

fn default_zip2disk() -> String {
    "zip2disk".to_string()
}

fn default_disk_lister() -> Vec<String> {
    vec![
        "c1541".to_string(),
        "{image}".to_string(),
        "-list".to_string(),
    ]
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            unzip: default_unzip(),
            unrar: default_unrar(),
            gzip: default_gzip(),
            tar: default_tar(),
            cbmconvert: default_cbmconvert(),
            zip2disk: default_zip2disk(),
            disk_lister: default_disk_lister(),
        }
    }
}

/// Filename normalization options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingSettings {
    /// Separator joining base name and extension in produced names.
    #[serde(default = "default_extension_separator")]
    pub extension_separator: char,

    /// Apply Windows filename restrictions (reserved device names,
    /// extra forbidden characters).
    #[serde(default)]
    pub windows_safe: bool,

    /// Keep non-ASCII characters and substitute symbolic glyphs for
    /// `/`, `^` and `|` instead of stripping to ASCII.
    #[serde(default)]
    pub unicode: bool,

    /// Extensions dropped without copying. Single-character extensions
    /// are dropped regardless of this list.
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,

    /// Extensionless names dropped as readme-like noise.
    #[serde(default = "default_readme_names")]
    pub readme_names: Vec<String>,
}

fn default_extension_separator() -> char {
    '.'
}

fn default_skip_extensions() -> Vec<String> {
    ["txt", "diz", "me", "nfo", "com", "exe", "del"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_readme_names() -> Vec<String> {
    vec!["readme".to_string(), "00index".to_string()]
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            extension_separator: default_extension_separator(),
            windows_safe: false,
            unicode: false,
            skip_extensions: default_skip_extensions(),
            readme_names: default_readme_names(),
        }
    }
}

/// Destination layout limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Maximum entries per destination directory before fan-out
    /// rebalancing kicks in.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Prefix for generated fan-out bucket directories.
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,

    /// Total block count of a clean single-sided disk image. A listed
    /// image is only unwrapped when used + free blocks add up to this.
    #[serde(default = "default_clean_disk_blocks")]
    pub clean_disk_blocks: u32,
}

fn default_max_entries() -> usize {
    100
}

fn default_bucket_prefix() -> String {
    "sub".to_string()
}

fn default_clean_disk_blocks() -> u32 {
    664
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            bucket_prefix: default_bucket_prefix(),
            clean_disk_blocks: default_clean_disk_blocks(),
        }
    }
}

/// Run behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Root directory for scratch workspaces. Empty means the system
    /// temp directory.
    #[serde(default)]
    pub temp_root: String,

    /// What to do when an external tool fails.
    #[serde(default)]
    pub on_tool_error: ErrorPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            temp_root: String::new(),
            on_tool_error: ErrorPolicy::default(),
        }
    }
}

impl RunSettings {
    /// The scratch root with the empty-string default resolved.
    pub fn effective_temp_root(&self) -> PathBuf {
        if self.temp_root.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.temp_root)
        }
    }
}

/// Reaction to a nonzero exit from an external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the failure, keep the offending file verbatim, continue.
    Ignore,
    /// Prompt before continuing.
    #[default]
    Ask,
    /// Abort the whole run.
    Halt,
}

impl ErrorPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorPolicy::Ignore => "ignore",
            ErrorPolicy::Ask => "ask",
            ErrorPolicy::Halt => "halt",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
