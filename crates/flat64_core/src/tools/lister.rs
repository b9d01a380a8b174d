//! Optional disk-lister invocation and directory analysis.
//!
//! When a lister is configured, a disk image's directory is examined
//! before extraction. Images holding exactly one real entry on an
//! otherwise full, clean disk are unpacked; anything else stays whole,
//! because a multi-entry disk usually is the release and splitting it
//! would destroy it.

use std::ffi::OsString;
use std::path::Path;

use crate::config::ToolSettings;

use super::runner::{run_tool, ToolError, ToolResult};

/// Placeholder in the lister argv that is replaced by the image path.
pub const IMAGE_PLACEHOLDER: &str = "{image}";

/// Name fragments that mark score-table files.
const SCORE_PATTERNS: [&str; 5] = ["hi", "best", "heros", "top10", "score"];

/// What a disk directory listing says about the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskAnalysis {
    /// Blocks allocated to entries, free-line contribution removed.
    pub total_blocks: i64,
    /// Blocks reported free by the last numeric line, -1 if none seen.
    pub free_blocks: i64,
    /// Real directory entries after header and separator adjustment.
    pub entries: i64,
    /// A 1..4 block entry matched the score-table name patterns.
    pub hiscore: bool,
    /// The listing carried do-not-validate warnings.
    pub dirty: bool,
}

impl DiskAnalysis {
    /// True when the image holds exactly one entry on a full clean disk.
    pub fn single_program(&self, clean_disk_blocks: u32) -> bool {
        self.entries == 1 && self.total_blocks + self.free_blocks == i64::from(clean_disk_blocks)
    }
}

/// Run the configured lister over an image and capture its listing.
///
/// Each argv element containing [`IMAGE_PLACEHOLDER`] gets the image
/// path substituted in; if no element carries the placeholder, the path
/// is appended as the final argument.
pub fn list_image(tools: &ToolSettings, image: &Path, cwd: &Path) -> ToolResult<String> {
    let Some((program, rest)) = tools.disk_lister.split_first() else {
        return Err(ToolError::NotFound {
            tool: "disk lister".to_string(),
        });
    };

    let mut args: Vec<OsString> = Vec::with_capacity(rest.len() + 1);
    let mut substituted = false;
    for arg in rest {
        if arg == IMAGE_PLACEHOLDER {
            args.push(image.as_os_str().to_os_string());
            substituted = true;
        } else if arg.contains(IMAGE_PLACEHOLDER) {
            args.push(arg.replace(IMAGE_PLACEHOLDER, &image.to_string_lossy()).into());
            substituted = true;
        } else {
            args.push(arg.clone().into());
        }
    }
    if !substituted {
        args.push(image.as_os_str().to_os_string());
    }

    let output = run_tool(program, &args, cwd)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Analyze a disk directory listing.
///
/// Every line opening with a decimal number contributes that number to
/// the block total; the last such line is the free-blocks summary, so
/// its contribution is taken back at the end. Lines counted as real
/// entries exclude the first line (the disk header), zero-block lines,
/// and `del` entries, which releases use as visual separators. Warnings
/// about unvalidated disks zero the entry count so such images are
/// never unpacked on the strength of a listing the drive itself
/// distrusts.
pub fn analyze_listing(listing: &str) -> DiskAnalysis {
    let mut total_blocks: i64 = 0;
    let mut free_blocks: i64 = -1;
    let mut entries: i64 = 0;
    let mut last_ignored = false;
    let mut first_line = true;
    let mut hiscore = false;
    let mut dirty = false;

    for line in listing.lines() {
        if let Some(blocks) = leading_number(line) {
            total_blocks += blocks;
            free_blocks = blocks;

            if !line.starts_with("0 ") && !is_deleted_entry(line) && !first_line {
                entries += 1;
                last_ignored = false;
            } else {
                last_ignored = true;
            }

            if (1..5).contains(&blocks) && is_score_table_name(line) {
                hiscore = true;
            }
        }

        let lower = line.to_ascii_lowercase();
        if lower.contains("validate") || lower.contains("change dir") || lower.contains("change bam")
        {
            dirty = true;
        }

        first_line = false;
    }

    // The last numeric line is the free-blocks summary: take back its
    // entry count and its block contribution.
    if !last_ignored {
        entries -= 1;
    }
    total_blocks -= free_blocks;

    // A lone score table next to the actual program does not count
    // against single-entry status.
    if hiscore && entries == 2 {
        entries -= 1;
    }

    if dirty {
        entries = 0;
    }

    DiskAnalysis {
        total_blocks,
        free_blocks,
        entries,
        hiscore,
        dirty,
    }
}

/// True when a name looks like a score table.
pub fn is_score_table_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SCORE_PATTERNS.iter().any(|p| lower.contains(p))
}

fn leading_number(line: &str) -> Option<i64> {
    let end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if end == 0 {
        return None;
    }
    line[..end].parse().ok()
}

fn is_deleted_entry(line: &str) -> bool {
    line.trim_end_matches('<').to_ascii_lowercase().ends_with("del")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_program_with_score_table_is_extractable() {
        let listing = "\
0 \"demo disk       \" dm 2a
32    \"game\"             prg
2     \"hi-score\"         prg
630 blocks free.
";
        let analysis = analyze_listing(listing);
        assert_eq!(analysis.entries, 1);
        assert_eq!(analysis.total_blocks, 34);
        assert_eq!(analysis.free_blocks, 630);
        assert!(analysis.hiscore);
        assert!(analysis.single_program(664));
    }

    #[test]
    fn two_programs_keep_the_disk() {
        let listing = "\
0 \"games           \" aa 2a
100   \"game one\"         prg
120   \"game two\"         prg
444 blocks free.
";
        let analysis = analyze_listing(listing);
        assert_eq!(analysis.entries, 2);
        assert!(!analysis.single_program(664));
    }

    #[test]
    fn del_separators_are_not_entries() {
        let listing = "\
0 \"compilation     \" cc 2a
0 \"----------------\" del<
200   \"mega game\"        prg
0 \"----------------\" del<
464 blocks free.
";
        let analysis = analyze_listing(listing);
        assert_eq!(analysis.entries, 1);
        assert_eq!(analysis.total_blocks, 200);
        assert!(analysis.single_program(664));
    }

    #[test]
    fn nonzero_del_entry_is_still_a_separator() {
        let listing = "\
0 \"release         \" rr 2a
1 \"................\" DEL
333   \"the game\"         prg
330 blocks free.
";
        let analysis = analyze_listing(listing);
        assert_eq!(analysis.entries, 1);
        assert!(analysis.single_program(664));
    }

    #[test]
    fn validation_warnings_zero_the_count() {
        let listing = "\
0 \"tool disk       \" td 2a
664   \"dont validate!\"   prg
0 blocks free.
";
        let analysis = analyze_listing(listing);
        assert!(analysis.dirty);
        assert_eq!(analysis.entries, 0);
        assert!(!analysis.single_program(664));
    }

    #[test]
    fn nonstandard_geometry_keeps_the_disk() {
        let listing = "\
0 \"big disk        \" bb 2a
100   \"game\"             prg
649 blocks free.
";
        let analysis = analyze_listing(listing);
        assert_eq!(analysis.entries, 1);
        assert_eq!(analysis.total_blocks + analysis.free_blocks, 749);
        assert!(!analysis.single_program(664));
    }

    #[test]
    fn empty_listing_is_not_single() {
        let analysis = analyze_listing("");
        assert!(!analysis.single_program(664));
    }

    #[test]
    fn score_table_names() {
        assert!(is_score_table_name("HISCORES"));
        assert!(is_score_table_name("the best"));
        assert!(is_score_table_name("top10.dat"));
        assert!(is_score_table_name("heros"));
        assert!(!is_score_table_name("game.prg"));
    }

    #[test]
    fn leading_numbers() {
        assert_eq!(leading_number("664 blocks free."), Some(664));
        assert_eq!(leading_number("0"), Some(0));
        assert_eq!(leading_number("blocks"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn lister_argv_placeholder_substitution() {
        let tools = ToolSettings {
            disk_lister: vec![
                "echo".to_string(),
                "listing-of".to_string(),
                IMAGE_PLACEHOLDER.to_string(),
            ],
            ..ToolSettings::default()
        };

        let cwd = tempfile::tempdir().unwrap();
        let out = list_image(&tools, Path::new("/images/game.d64"), cwd.path()).unwrap();
        assert_eq!(out.trim(), "listing-of /images/game.d64");
    }

    #[test]
    fn lister_argv_appends_image_without_placeholder() {
        let tools = ToolSettings {
            disk_lister: vec!["echo".to_string()],
            ..ToolSettings::default()
        };

        let cwd = tempfile::tempdir().unwrap();
        let out = list_image(&tools, Path::new("/images/game.d64"), cwd.path()).unwrap();
        assert_eq!(out.trim(), "/images/game.d64");
    }

    #[test]
    fn empty_lister_argv_is_an_error() {
        let tools = ToolSettings {
            disk_lister: Vec::new(),
            ..ToolSettings::default()
        };

        let cwd = tempfile::tempdir().unwrap();
        let err = list_image(&tools, Path::new("/images/game.d64"), cwd.path()).unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }
}
