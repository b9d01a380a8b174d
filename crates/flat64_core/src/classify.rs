//! Container classification.
//!
//! Each discovered file maps to exactly one [`ContainerKind`] before the
//! dispatcher touches it. Classification looks only at the name and, for
//! grouped parts, at which siblings exist; it never opens the file.

use std::path::Path;

use crate::config::NamingSettings;

/// What a file turned out to be, and therefore how it is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    /// Zip archive, unwrapped with the zip extractor.
    Zip,
    /// Rar archive.
    Rar,
    /// Single gzip-compressed file.
    Gzip,
    /// Tar archive.
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
    /// 1541 disk image, subject to the block-accounting heuristic.
    DiskImage,
    /// Tape image.
    TapeImage,
    /// PC64-style single-file image.
    SingleFileImage,
    /// Lynx archive, converted to a disk image first.
    LinkedImage,
    /// One member of a four-part zipcoded disk. `remainder` is the name
    /// shared by all four siblings after the `N!` prefix.
    GroupedParts { remainder: String },
    /// Leaf file copied through the name normalizer.
    Payload,
    /// Dropped without copying.
    Skip,
}

impl ContainerKind {
    /// Short tag used in workspace directory names and log lines.
    pub fn tag(&self) -> &'static str {
        match self {
            ContainerKind::Zip => "zip",
            ContainerKind::Rar => "rar",
            ContainerKind::Gzip => "gz",
            ContainerKind::Tar => "tar",
            ContainerKind::TarGz => "tgz",
            ContainerKind::DiskImage => "d64",
            ContainerKind::TapeImage => "t64",
            ContainerKind::SingleFileImage => "p00",
            ContainerKind::LinkedImage => "lnx",
            ContainerKind::GroupedParts { .. } => "zipcode",
            ContainerKind::Payload => "payload",
            ContainerKind::Skip => "skip",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classify one directory entry.
///
/// Precedence: grouped four-part sets first (all four siblings must
/// exist), then dotfiles, then extensionless names, then the extension
/// table. The fallback is always [`ContainerKind::Payload`].
pub fn classify(dir: &Path, name: &str, naming: &NamingSettings) -> ContainerKind {
    if let Some(remainder) = grouped_remainder(name) {
        if has_all_grouped_parts(dir, remainder) {
            return ContainerKind::GroupedParts {
                remainder: remainder.to_string(),
            };
        }
    }

    if name.starts_with('.') {
        return ContainerKind::Skip;
    }

    let lowered = name.to_ascii_lowercase();
    let Some(ext) = last_extension(&lowered) else {
        if naming.readme_names.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return ContainerKind::Skip;
        }
        return ContainerKind::Payload;
    };

    if ext.chars().count() == 1 || naming.skip_extensions.iter().any(|s| s == ext) {
        return ContainerKind::Skip;
    }

    match ext {
        "zip" => ContainerKind::Zip,
        "rar" => ContainerKind::Rar,
        "gz" => ContainerKind::Gzip,
        "tar" => ContainerKind::Tar,
        "tgz" => ContainerKind::TarGz,
        "d64" => ContainerKind::DiskImage,
        "t64" => ContainerKind::TapeImage,
        "p00" => ContainerKind::SingleFileImage,
        "lnx" => ContainerKind::LinkedImage,
        _ => ContainerKind::Payload,
    }
}

/// The name after a `1!`..`4!` prefix, if the name carries one.
fn grouped_remainder(name: &str) -> Option<&str> {
    let rest = name
        .strip_prefix("1!")
        .or_else(|| name.strip_prefix("2!"))
        .or_else(|| name.strip_prefix("3!"))
        .or_else(|| name.strip_prefix("4!"))?;
    (!rest.is_empty()).then_some(rest)
}

fn has_all_grouped_parts(dir: &Path, remainder: &str) -> bool {
    (1..=4).all(|n| dir.join(format!("{n}!{remainder}")).is_file())
}

/// Extension segment after the last dot or comma, or `None` when the
/// name has neither. May be empty ("name." yields "").
fn last_extension(lowered: &str) -> Option<&str> {
    let pos = lowered.rfind(['.', ','])?;
    Some(&lowered[pos + 1..])
}
