//! Discovery of subreddit archives in a data directory.

use std::collections::BTreeSet;
use std::path::Path;

use subpulse_core::{AppError, AppResult};
use walkdir::WalkDir;

use crate::types::ArchiveKind;

/// Split `<subreddit>_<kind>.zst` into its subreddit and kind.
pub fn parse_archive_name(file_name: &str) -> Option<(String, ArchiveKind)> {
    [ArchiveKind::Submissions, ArchiveKind::Comments]
        .into_iter()
        .find_map(|kind| {
            file_name
                .strip_suffix(kind.archive_suffix())
                .filter(|sub| !sub.is_empty())
                .map(|sub| (sub.to_string(), kind))
        })
}

/// Subreddit name implied by an archive path.
///
/// Falls back to the file name up to its first `_` for archives that do not
/// follow the `<subreddit>_<kind>.zst` pattern.
pub fn subreddit_from_path(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if let Some((sub, _)) = parse_archive_name(file_name) {
        return Some(sub);
    }
    let prefix = file_name.split('_').next()?;
    let prefix = prefix.strip_suffix(".zst").unwrap_or(prefix);
    (!prefix.is_empty()).then(|| prefix.to_string())
}

/// Every subreddit with at least one archive in `data_dir`, sorted.
pub fn discover_subreddits(data_dir: &Path) -> AppResult<Vec<String>> {
    if !data_dir.is_dir() {
        return Err(AppError::Config(format!(
            "Data directory not found: {:?}",
            data_dir
        )));
    }

    let mut subreddits = BTreeSet::new();
    for entry in WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some((sub, _)) = entry.file_name().to_str().and_then(parse_archive_name) {
            subreddits.insert(sub);
        }
    }

    Ok(subreddits.into_iter().collect())
}

/// Discovered subreddits that have no output directory yet, sorted.
pub fn pending_subreddits(data_dir: &Path, output_dir: &Path) -> AppResult<Vec<String>> {
    let all = discover_subreddits(data_dir)?;
    let total = all.len();
    let pending: Vec<String> = all
        .into_iter()
        .filter(|sub| !output_dir.join(sub).exists())
        .collect();

    tracing::info!(
        "Found {} subreddits, {} already analyzed",
        total,
        total - pending.len()
    );
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_parse_archive_name() {
        assert_eq!(
            parse_archive_name("rust_submissions.zst"),
            Some(("rust".to_string(), ArchiveKind::Submissions))
        );
        assert_eq!(
            parse_archive_name("learn_rust_comments.zst"),
            Some(("learn_rust".to_string(), ArchiveKind::Comments))
        );
        assert_eq!(parse_archive_name("_comments.zst"), None);
        assert_eq!(parse_archive_name("rust_comments.json"), None);
    }

    #[test]
    fn test_subreddit_from_path() {
        assert_eq!(
            subreddit_from_path(&PathBuf::from("/data/learn_rust_comments.zst")),
            Some("learn_rust".to_string())
        );
        assert_eq!(
            subreddit_from_path(&PathBuf::from("dumps/golang_2024.zst")),
            Some("golang".to_string())
        );
        assert_eq!(
            subreddit_from_path(&PathBuf::from("python.zst")),
            Some("python".to_string())
        );
    }

    #[test]
    fn test_pending_subreddits() {
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        for name in [
            "rust_submissions.zst",
            "rust_comments.zst",
            "golang_comments.zst",
            "zig_submissions.zst",
            "notes.txt",
        ] {
            std::fs::write(data.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(out.path().join("golang")).unwrap();

        assert_eq!(
            discover_subreddits(data.path()).unwrap(),
            vec!["golang", "rust", "zig"]
        );
        assert_eq!(
            pending_subreddits(data.path(), out.path()).unwrap(),
            vec!["rust", "zig"]
        );
    }

    #[test]
    fn test_missing_data_dir() {
        let result = discover_subreddits(Path::new("/nonexistent/subpulse-data"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
