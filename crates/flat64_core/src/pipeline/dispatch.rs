//! Per-file dispatch: classify, then extract, save, or skip.

use std::fs;
use std::path::Path;

use crate::classify::{classify, ContainerKind};
use crate::naming::normalize_file_name;

use super::context::RunContext;
use super::errors::{RunError, RunResult};
use super::extract;

/// Route one source file to its handler.
pub fn process_file(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let kind = classify(dir, name, &ctx.settings.naming);
    tracing::debug!("{}: classified {}", dir.join(name).display(), kind);

    match kind {
        ContainerKind::Skip => {
            ctx.stats.entries_skipped += 1;
            Ok(())
        }
        ContainerKind::Payload => save_file(ctx, dir, name, dest_dir),
        ContainerKind::Zip => extract::zip(ctx, dir, name, dest_dir),
        ContainerKind::Rar => extract::rar(ctx, dir, name, dest_dir),
        ContainerKind::Gzip => extract::gzip(ctx, dir, name, dest_dir),
        ContainerKind::Tar => extract::tar(ctx, dir, name, dest_dir, false),
        ContainerKind::TarGz => extract::tar(ctx, dir, name, dest_dir, true),
        ContainerKind::DiskImage => extract::disk_image(ctx, dir, name, dest_dir),
        ContainerKind::TapeImage => extract::tape_image(ctx, dir, name, dest_dir),
        ContainerKind::SingleFileImage => extract::single_file_image(ctx, dir, name, dest_dir),
        ContainerKind::LinkedImage => extract::linked_image(ctx, dir, name, dest_dir),
        ContainerKind::GroupedParts { remainder } => {
            extract::grouped_parts(ctx, dir, name, &remainder, dest_dir)
        }
    }
}

/// Copy one file into the destination under a normalized name.
///
/// Collisions with names already present are resolved by re-normalizing
/// with an increasing index until a free name is found.
pub fn save_file(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let mut target_name = normalize_file_name(name, 0, &ctx.settings.naming);

    let mut index = 1u32;
    loop {
        let candidate = dest_dir.join(&target_name);
        if !candidate.is_file() && !candidate.is_dir() {
            break;
        }
        target_name = normalize_file_name(name, index, &ctx.settings.naming);
        index += 1;
    }

    let target = dest_dir.join(&target_name);
    tracing::info!("Saving: {} -> {}", source.display(), target.display());
    fs::copy(&source, &target).map_err(|e| RunError::io("copying", &source, e))?;
    ctx.stats.files_saved += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn test_context(temp: &Path) -> RunContext {
        let mut settings = Settings::default();
        settings.run.temp_root = temp.join("tmp").display().to_string();
        RunContext::new(settings, &temp.join("src"), &temp.join("dst")).unwrap()
    }

    fn setup(temp: &Path) {
        fs::create_dir_all(temp.join("src")).unwrap();
        fs::create_dir_all(temp.join("dst")).unwrap();
    }

    #[test]
    fn payload_is_saved_normalized() {
        let temp = tempfile::tempdir().unwrap();
        setup(temp.path());
        let mut ctx = test_context(temp.path());

        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(src.join("My Great Game (1987).PRG"), b"payload").unwrap();

        process_file(&mut ctx, &src, "My Great Game (1987).PRG", &dst).unwrap();

        assert!(dst.join("my great game (1.prg").is_file());
        assert_eq!(ctx.stats.files_saved, 1);
    }

    #[test]
    fn noise_extensions_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        setup(temp.path());
        let mut ctx = test_context(temp.path());

        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(src.join("file_id.diz"), b"ad").unwrap();

        process_file(&mut ctx, &src, "file_id.diz", &dst).unwrap();

        assert_eq!(fs::read_dir(&dst).unwrap().count(), 0);
        assert_eq!(ctx.stats.entries_skipped, 1);
    }

    #[test]
    fn name_collisions_probe_an_index() {
        let temp = tempfile::tempdir().unwrap();
        setup(temp.path());
        let mut ctx = test_context(temp.path());

        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(src.join("game.prg"), b"one").unwrap();

        save_file(&mut ctx, &src, "game.prg", &dst).unwrap();
        save_file(&mut ctx, &src, "game.prg", &dst).unwrap();
        save_file(&mut ctx, &src, "game.prg", &dst).unwrap();

        assert!(dst.join("game.prg").is_file());
        assert!(dst.join("game-1.prg").is_file());
        assert!(dst.join("game-2.prg").is_file());
        assert_eq!(ctx.stats.files_saved, 3);
    }
}
