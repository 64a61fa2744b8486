//! Prompt definitions compiled into the binary.

/// Per-chunk community analysis.
pub const CHUNK_ANALYSIS: &str = "analysis.chunk";

/// Synthesis of several chunk analyses of one archive.
pub const META_ANALYSIS: &str = "analysis.meta";

/// Synthesis across submission and comment analyses.
pub const COMBINED_ANALYSIS: &str = "analysis.combined";

const BUILTINS: [(&str, &str); 3] = [
    (CHUNK_ANALYSIS, include_str!("../prompts/analysis.chunk.yml")),
    (META_ANALYSIS, include_str!("../prompts/analysis.meta.yml")),
    (COMBINED_ANALYSIS, include_str!("../prompts/analysis.combined.yml")),
];

/// YAML source of a built-in prompt.
pub fn builtin_source(id: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(builtin_id, _)| *builtin_id == id)
        .map(|(_, source)| *source)
}

/// Ids of all built-in prompts.
pub fn builtin_ids() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(id, _)| *id)
}
