//! On-disk artifacts of a run.
//!
//! Layout under the subreddit root:
//!
//! ```text
//! <root>/<sub>_analysis_summary.json            combined summary
//! <root>/{submissions,comments}/
//!     <sub>_chunk_<n>_prompt.txt
//!     <sub>_chunk_<n>_analysis.md
//!     <sub>_all_analyses.json
//!     <sub>_meta_prompt.txt
//!     <sub>_meta_analysis.md
//!     <sub>_analysis_summary.json
//! <root>/combined/
//!     <sub>_combined_prompt.txt
//!     <sub>_combined_analysis.md
//! ```
//!
//! Writes never abort a run. A failed write is logged and reported as `None`.

use serde::Serialize;
use std::path::{Path, PathBuf};

use subpulse_core::{AppError, AppResult};

use crate::types::{AggregatedSummary, AnalysisResult, ArchiveKind, CombinedSummary};

/// Writes run artifacts below one subreddit's output root.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    subreddit: String,
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(subreddit: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            subreddit: subreddit.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one archive kind's artifacts.
    pub fn kind_dir(&self, kind: ArchiveKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    pub fn combined_dir(&self) -> PathBuf {
        self.root.join("combined")
    }

    /// Path of the canonical summary at the subreddit root.
    pub fn final_summary_path(&self) -> PathBuf {
        self.root.join(self.file_name("analysis_summary.json"))
    }

    pub fn chunk_prompt(&self, kind: ArchiveKind, ordinal: usize, prompt: &str) -> Option<PathBuf> {
        let path = self
            .kind_dir(kind)
            .join(self.file_name(&format!("chunk_{}_prompt.txt", ordinal)));
        self.persist(path, prompt.as_bytes())
    }

    pub fn chunk_analysis(
        &self,
        kind: ArchiveKind,
        ordinal: usize,
        analysis: &str,
    ) -> Option<PathBuf> {
        let path = self
            .kind_dir(kind)
            .join(self.file_name(&format!("chunk_{}_analysis.md", ordinal)));
        self.persist(path, analysis.as_bytes())
    }

    pub fn all_analyses(&self, kind: ArchiveKind, results: &[AnalysisResult]) -> Option<PathBuf> {
        let path = self.kind_dir(kind).join(self.file_name("all_analyses.json"));
        self.persist_json(path, &results)
    }

    pub fn meta_prompt(&self, kind: ArchiveKind, prompt: &str) -> Option<PathBuf> {
        let path = self.kind_dir(kind).join(self.file_name("meta_prompt.txt"));
        self.persist(path, prompt.as_bytes())
    }

    pub fn meta_analysis(&self, kind: ArchiveKind, analysis: &str) -> Option<PathBuf> {
        let path = self.kind_dir(kind).join(self.file_name("meta_analysis.md"));
        self.persist(path, analysis.as_bytes())
    }

    pub fn summary(&self, kind: ArchiveKind, summary: &AggregatedSummary) -> Option<PathBuf> {
        let path = self.kind_dir(kind).join(self.file_name("analysis_summary.json"));
        self.persist_json(path, summary)
    }

    pub fn combined_prompt(&self, prompt: &str) -> Option<PathBuf> {
        let path = self.combined_dir().join(self.file_name("combined_prompt.txt"));
        self.persist(path, prompt.as_bytes())
    }

    pub fn combined_analysis(&self, analysis: &str) -> Option<PathBuf> {
        let path = self.combined_dir().join(self.file_name("combined_analysis.md"));
        self.persist(path, analysis.as_bytes())
    }

    pub fn final_summary(&self, summary: &CombinedSummary) -> Option<PathBuf> {
        self.persist_json(self.final_summary_path(), summary)
    }

    fn file_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.subreddit, suffix)
    }

    fn persist_json<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> Option<PathBuf> {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.persist(path, &bytes),
            Err(e) => {
                report_failure(&path, &AppError::from(e));
                None
            }
        }
    }

    fn persist(&self, path: PathBuf, contents: &[u8]) -> Option<PathBuf> {
        match write_file(&path, contents) {
            Ok(()) => {
                tracing::info!("Saved {}", path.display());
                Some(path)
            }
            Err(e) => {
                report_failure(&path, &e);
                None
            }
        }
    }
}

fn write_file(path: &Path, contents: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn report_failure(path: &Path, err: &AppError) {
    tracing::error!(kind = ?err.kind(), "Failed to write {}: {}", path.display(), err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageStats;
    use crate::types::{ChunkMetadata, SummaryText};
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let temp = TempDir::new().unwrap();
        let writer = ArtifactWriter::new("rust", temp.path().join("rust"));

        let prompt = writer.chunk_prompt(ArchiveKind::Comments, 2, "prompt text").unwrap();
        assert_eq!(prompt, temp.path().join("rust/comments/rust_chunk_2_prompt.txt"));
        assert_eq!(std::fs::read_to_string(&prompt).unwrap(), "prompt text");

        let analysis = writer.chunk_analysis(ArchiveKind::Submissions, 1, "# Findings").unwrap();
        assert_eq!(analysis, temp.path().join("rust/submissions/rust_chunk_1_analysis.md"));

        let combined = writer.combined_prompt("both").unwrap();
        assert_eq!(combined, temp.path().join("rust/combined/rust_combined_prompt.txt"));

        assert_eq!(
            writer.final_summary_path(),
            temp.path().join("rust/rust_analysis_summary.json")
        );
    }

    #[test]
    fn test_json_artifacts() {
        let temp = TempDir::new().unwrap();
        let writer = ArtifactWriter::new("rust", temp.path());

        let results = vec![AnalysisResult {
            chunk_id: 1,
            metadata: ChunkMetadata::default(),
            analysis: "text".to_string(),
        }];
        let path = writer.all_analyses(ArchiveKind::Comments, &results).unwrap();
        let back: Vec<AnalysisResult> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, results);

        let summary = AggregatedSummary {
            subreddit: "rust".to_string(),
            chunks_analyzed: 1,
            total_posts_analyzed: 10,
            coverage_data: CoverageStats::new(10, 20, 100),
            analysis_date: "2025-01-01".to_string(),
            text: SummaryText::SingleChunk("text".to_string()),
        };
        let path = writer.summary(ArchiveKind::Comments, &summary).unwrap();
        assert!(path.ends_with("comments/rust_analysis_summary.json"));
    }

    #[test]
    fn test_failed_write_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        // A file where the kind directory should be
        std::fs::write(temp.path().join("comments"), b"in the way").unwrap();
        let writer = ArtifactWriter::new("rust", temp.path());

        assert!(writer.chunk_prompt(ArchiveKind::Comments, 1, "x").is_none());
        assert!(writer.chunk_prompt(ArchiveKind::Submissions, 1, "x").is_some());
    }
}
