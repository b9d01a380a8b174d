//! Filename normalization for the constrained destination filesystem.
//!
//! Target names are 16-character bases plus 3-character extensions, built
//! from a limited character set. Both normalizers are pure: the same input
//! and settings always produce the same output, and collision handling is
//! driven entirely by the caller-supplied index.

use crate::config::NamingSettings;

/// Maximum length of the base name, in characters.
pub const MAX_BASE_LEN: usize = 16;

/// Maximum length of the extension, in characters.
pub const MAX_EXT_LEN: usize = 3;

/// Base name used when filtering leaves nothing.
pub const PLACEHOLDER_BASE: &str = "noname";

/// Extension given to native program files and to files whose extension
/// was missing or invalid.
pub const PROGRAM_EXTENSION: &str = "prg";

/// Suffix appended to reserved Windows device names.
const WINDOWS_DEVICE_SUFFIX: &str = "win";

/// Reserved device names on Windows, lower-cased.
const WINDOWS_DEVICES: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9", "clock$",
];

/// Extensions the target DOS reserves for its own file types. Folded back
/// into the base so the information survives the rename.
const RESERVED_EXTENSIONS: &[&str] = &["dir", "lnk", "rel", "del"];

/// Normalize a file name for the destination filesystem.
///
/// `collision_index` 0 means no suffix; larger values reserve room in the
/// base budget for a trailing `-<index>`.
pub fn normalize_file_name(name: &str, collision_index: u32, naming: &NamingSettings) -> String {
    let cleaned = fix_chars(name, naming);

    // The last dot splits base from extension. Commas were rewritten to
    // dots above, so "game,d64" splits the same way as "game.d64".
    let (mut base, ext) = match cleaned.rfind('.') {
        Some(pos) => (cleaned[..pos].to_string(), cleaned[pos + 1..].to_string()),
        None => (cleaned, PROGRAM_EXTENSION.to_string()),
    };

    let ext = if is_invalid_extension(&ext) {
        base.push('.');
        base.push_str(&ext);
        PROGRAM_EXTENSION.to_string()
    } else {
        ext
    };

    let ext = clamp_extension(&ext);
    let mut base = collapse_spacing(&base);

    if naming.windows_safe && WINDOWS_DEVICES.contains(&base.as_str()) {
        base.push_str(WINDOWS_DEVICE_SUFFIX);
    }
    if base.is_empty() {
        base = PLACEHOLDER_BASE.to_string();
    }

    let base = fit_budget(&base, collision_index);
    format!("{}{}{}", base, naming.extension_separator, ext)
}

/// Normalize a directory name. Same pipeline as file names minus the
/// extension handling.
pub fn normalize_dir_name(name: &str, collision_index: u32, naming: &NamingSettings) -> String {
    let mut base = collapse_spacing(&fix_chars(name, naming));

    if naming.windows_safe && WINDOWS_DEVICES.contains(&base.as_str()) {
        base.push_str(WINDOWS_DEVICE_SUFFIX);
    }
    if base.is_empty() {
        base = PLACEHOLDER_BASE.to_string();
    }

    fit_budget(&base, collision_index)
}

/// Character filtering: strip or substitute anything outside the allowed
/// set, rewrite hostile characters to dots, lower-case.
fn fix_chars(name: &str, naming: &NamingSettings) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        if naming.unicode {
            match c {
                '/' => {
                    out.push('\u{2215}');
                    continue;
                }
                '^' => {
                    out.push('\u{2191}');
                    continue;
                }
                '|' => {
                    out.push('\u{2502}');
                    continue;
                }
                _ if c.is_ascii_control() => {
                    out.push(' ');
                    continue;
                }
                _ => {}
            }
        } else if !matches!(c, ' '..='~') {
            out.push(' ');
            continue;
        }

        let mapped = match c {
            '*' | ':' | '=' | '?' | ',' | '\\' => '.',
            '<' | '>' | '"' | '/' | '|' if naming.windows_safe => '.',
            _ => c.to_ascii_lowercase(),
        };
        out.push(mapped);
    }

    out.trim().to_string()
}

/// Collapse runs of spaces and dots, trim both from the ends.
fn collapse_spacing(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev = '\0';

    for c in name.chars() {
        if (c == ' ' || c == '.') && c == prev {
            continue;
        }
        out.push(c);
        prev = c;
    }

    out.trim_matches(&[' ', '.'][..]).to_string()
}

/// An extension the destination cannot carry: empty, a single character,
/// or one of the reserved type names.
fn is_invalid_extension(ext: &str) -> bool {
    ext.chars().count() <= 1 || RESERVED_EXTENSIONS.contains(&ext)
}

fn clamp_extension(ext: &str) -> String {
    let clamped: String = ext.chars().take(MAX_EXT_LEN).collect();
    let trimmed = clamped.trim_matches(&[' ', '.'][..]);
    if trimmed.is_empty() {
        PROGRAM_EXTENSION.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cut the base to the 16-character budget, reserving room for the
/// collision suffix when one is requested.
fn fit_budget(base: &str, collision_index: u32) -> String {
    if collision_index == 0 {
        return trim_cut(base, MAX_BASE_LEN);
    }

    let index = collision_index.to_string();
    let keep = (MAX_BASE_LEN - 1).saturating_sub(index.len());
    format!("{}-{}", trim_cut(base, keep), index)
}

/// Truncate to `max` characters and drop any space or dot the cut left
/// dangling at the end.
fn trim_cut(base: &str, max: usize) -> String {
    let cut: String = base.chars().take(max).collect();
    cut.trim_end_matches(&[' ', '.'][..]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingSettings;

    fn naming() -> NamingSettings {
        NamingSettings::default()
    }

    fn windows_naming() -> NamingSettings {
        NamingSettings {
            windows_safe: true,
            ..NamingSettings::default()
        }
    }

    #[test]
    fn plain_name_passes_through() {
        assert_eq!(normalize_file_name("game.prg", 0, &naming()), "game.prg");
    }

    #[test]
    fn upper_case_is_lowered() {
        assert_eq!(normalize_file_name("GAME.PRG", 0, &naming()), "game.prg");
    }

    #[test]
    fn missing_extension_gets_program_extension() {
        assert_eq!(normalize_file_name("game", 0, &naming()), "game.prg");
    }

    #[test]
    fn comma_acts_as_extension_separator() {
        assert_eq!(normalize_file_name("demo,d64", 0, &naming()), "demo.d64");
    }

    #[test]
    fn hostile_characters_become_dots() {
        assert_eq!(
            normalize_file_name("hi*score=1?.prg", 0, &naming()),
            "hi.score.1.prg"
        );
    }

    #[test]
    fn non_ascii_is_stripped_to_space() {
        assert_eq!(normalize_file_name("gamé.prg", 0, &naming()), "gam.prg");
        assert_eq!(
            normalize_file_name("a\u{2603}b.prg", 0, &naming()),
            "a b.prg"
        );
    }

    #[test]
    fn long_base_is_truncated() {
        let name = format!("{}.prg", "a".repeat(30));
        assert_eq!(
            normalize_file_name(&name, 0, &naming()),
            format!("{}.prg", "a".repeat(16))
        );
    }

    #[test]
    fn long_extension_is_truncated() {
        assert_eq!(
            normalize_file_name("game.d64image", 0, &naming()),
            "game.d64"
        );
    }

    #[test]
    fn collision_index_reserves_room() {
        let name = format!("{}.prg", "a".repeat(30));
        assert_eq!(
            normalize_file_name(&name, 1, &naming()),
            format!("{}-1.prg", "a".repeat(14))
        );
        assert_eq!(
            normalize_file_name(&name, 12, &naming()),
            format!("{}-12.prg", "a".repeat(13))
        );
    }

    #[test]
    fn reserved_extension_is_folded_into_base() {
        assert_eq!(normalize_file_name("game.s", 0, &naming()), "game.s.prg");
        assert_eq!(
            normalize_file_name("save.del", 0, &naming()),
            "save.del.prg"
        );
    }

    #[test]
    fn trailing_dot_means_empty_extension() {
        assert_eq!(normalize_file_name("game.", 0, &naming()), "game.prg");
    }

    #[test]
    fn nothing_left_falls_back_to_noname() {
        assert_eq!(normalize_file_name("....", 0, &naming()), "noname.prg");
    }

    #[test]
    fn repeated_spacing_collapses() {
        assert_eq!(
            normalize_file_name("best   game...of.all.prg", 0, &naming()),
            "best game.of.all.prg"
        );
    }

    #[test]
    fn windows_device_names_get_suffix() {
        assert_eq!(
            normalize_file_name("CON.txt", 0, &windows_naming()),
            "conwin.txt"
        );
        assert_eq!(
            normalize_dir_name("lpt1", 0, &windows_naming()),
            "lpt1win"
        );
        // Not a device, no suffix.
        assert_eq!(
            normalize_file_name("conx.txt", 0, &windows_naming()),
            "conx.txt"
        );
    }

    #[test]
    fn windows_extra_characters_become_dots() {
        assert_eq!(
            normalize_file_name("a<b>c.prg", 0, &windows_naming()),
            "a.b.c.prg"
        );
    }

    #[test]
    fn unicode_mode_substitutes_glyphs() {
        let naming = NamingSettings {
            unicode: true,
            ..NamingSettings::default()
        };
        assert_eq!(
            normalize_file_name("up^high.prg", 0, &naming),
            "up\u{2191}high.prg"
        );
        assert_eq!(
            normalize_file_name("a|b.prg", 0, &naming),
            "a\u{2502}b.prg"
        );
    }

    #[test]
    fn unicode_mode_keeps_non_ascii() {
        let naming = NamingSettings {
            unicode: true,
            ..NamingSettings::default()
        };
        assert_eq!(normalize_file_name("gamé.prg", 0, &naming), "gamé.prg");
    }

    #[test]
    fn custom_separator_joins_base_and_extension() {
        let naming = NamingSettings {
            extension_separator: ',',
            ..NamingSettings::default()
        };
        assert_eq!(normalize_file_name("game.prg", 0, &naming), "game,prg");
    }

    #[test]
    fn dir_names_have_no_extension_handling() {
        assert_eq!(normalize_dir_name("Games.Misc", 0, &naming()), "games.misc");
        assert_eq!(
            normalize_dir_name(&"x".repeat(40), 0, &naming()),
            "x".repeat(16)
        );
        assert_eq!(normalize_dir_name("", 0, &naming()), "noname");
    }

    #[test]
    fn normalized_names_respect_all_bounds() {
        let inputs = [
            "Some Very Long C64 Game Name (1987)(Publisher).d64",
            "weird***name===with???junk",
            "UPPER case.TXT",
            "a,s,basketball",
            ". . . .",
            "x",
        ];
        for input in inputs {
            for index in [0, 1, 7, 123] {
                let out = normalize_file_name(input, index, &naming());
                let (base, ext) = out.rsplit_once('.').unwrap();
                assert!(base.chars().count() <= MAX_BASE_LEN, "base too long: {out}");
                assert!(ext.chars().count() <= MAX_EXT_LEN, "ext too long: {out}");
                assert!(!base.is_empty() && !ext.is_empty(), "empty part: {out}");
                assert!(
                    !base.ends_with(' ') && !base.ends_with('.'),
                    "dangling junk: {out}"
                );
                for c in out.chars() {
                    assert!(
                        !matches!(c, '*' | ':' | '=' | '?' | ',' | '\\'),
                        "hostile char survived: {out}"
                    );
                }
            }
        }
    }
}
