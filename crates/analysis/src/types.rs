//! Analysis pipeline type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::coverage::{CoverageStats, OverallCoverage};

/// Authors never counted toward distinct-author cardinality.
pub const EXCLUDED_AUTHORS: [&str; 2] = ["[deleted]", "AutoModerator"];

/// Text values that mean the content is gone.
pub const REMOVED_TEXT: [&str; 2] = ["[deleted]", "[removed]"];

/// Record type held by one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Submissions,
    Comments,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submissions => "submissions",
            Self::Comments => "comments",
        }
    }

    /// Heading label used when analyses of both kinds are mixed.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Submissions => "Submissions",
            Self::Comments => "Comments",
        }
    }

    /// File name suffix of this kind's archive.
    pub fn archive_suffix(&self) -> &'static str {
        match self {
            Self::Submissions => "_submissions.zst",
            Self::Comments => "_comments.zst",
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One post or comment read from an archive.
///
/// Only the fields the pipeline looks at are kept; everything else in the
/// record is ignored. Numeric fields are stored raw because dumps mix
/// integers, floats and numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub created_utc: Option<Value>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub score: Option<Value>,

    #[serde(default)]
    pub num_comments: Option<Value>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub selftext: Option<String>,

    #[serde(default)]
    pub body: Option<String>,
}

impl ContentItem {
    /// Creation time, if `created_utc` holds a usable epoch value.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.created_utc.as_ref().and_then(as_integer)?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Score, 0 when absent or unparseable.
    pub fn score(&self) -> i64 {
        self.score.as_ref().and_then(as_integer).unwrap_or(0)
    }

    /// Comment count of a submission, 0 when absent or unparseable.
    pub fn num_comments(&self) -> i64 {
        self.num_comments.as_ref().and_then(as_integer).unwrap_or(0)
    }

    /// Author, unless it is one of the excluded sentinels.
    pub fn qualifying_author(&self) -> Option<&str> {
        self.author
            .as_deref()
            .filter(|a| !EXCLUDED_AUTHORS.contains(a))
    }

    /// Submission body, `None` when empty or removed.
    pub fn visible_selftext(&self) -> Option<&str> {
        visible(self.selftext.as_deref())
    }

    /// Comment body, `None` when empty or removed.
    pub fn visible_body(&self) -> Option<&str> {
        visible(self.body.as_deref())
    }
}

fn visible(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty() && !REMOVED_TEXT.contains(t))
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Ordered batch of records analyzed together.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 1-based position in archive order
    pub ordinal: usize,

    pub items: Vec<ContentItem>,
}

/// Earliest and latest creation dates (`YYYY-MM-DD`) in a chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Descriptive statistics of one chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub post_count: usize,
    pub date_range: DateRange,
    pub authors: BTreeSet<String>,
    pub unique_authors: usize,
    pub total_score: i64,
    pub avg_score: f64,
}

/// Analysis of one chunk that the LLM answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub chunk_id: usize,
    pub metadata: ChunkMetadata,
    pub analysis: String,
}

/// Text of a per-archive summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SummaryText {
    /// Exactly one chunk succeeded; its analysis verbatim
    #[serde(rename = "analysis")]
    SingleChunk(String),

    /// Synthesis of two or more chunk analyses
    #[serde(rename = "meta_analysis")]
    Meta(String),
}

impl SummaryText {
    pub fn text(&self) -> &str {
        match self {
            Self::SingleChunk(text) | Self::Meta(text) => text,
        }
    }
}

/// Persisted summary of one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSummary {
    pub subreddit: String,
    pub chunks_analyzed: usize,
    pub total_posts_analyzed: usize,
    pub coverage_data: CoverageStats,
    pub analysis_date: String,
    #[serde(flatten)]
    pub text: SummaryText,
}

/// Coverage figures persisted with the combined summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedCoverage {
    pub overall: OverallCoverage,
    pub submissions: CoverageStats,
    pub comments: CoverageStats,
}

/// Persisted summary across submissions and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedSummary {
    pub subreddit: String,
    pub analysis_date: String,
    pub submissions_analyzed: usize,
    pub comments_analyzed: usize,
    pub coverage_data: CombinedCoverage,
    pub combined_analysis: String,
}

/// Total items covered by a list of chunk results.
pub fn items_analyzed(results: &[AnalysisResult]) -> usize {
    results.iter().map(|r| r.metadata.post_count).sum()
}
