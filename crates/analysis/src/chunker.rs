//! Chunking of ingested records.

use crate::types::{Chunk, ContentItem};

/// Split `items` into contiguous chunks of `chunk_size` records, keeping at
/// most `max_chunks`. The final chunk may be shorter. Ordinals start at 1.
///
/// Returns no chunks when `chunk_size` is 0.
pub fn chunk_items(items: Vec<ContentItem>, chunk_size: usize, max_chunks: usize) -> Vec<Chunk> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::with_capacity(max_chunks.min(items.len().div_ceil(chunk_size)));
    let mut iter = items.into_iter().peekable();

    while chunks.len() < max_chunks && iter.peek().is_some() {
        let batch: Vec<ContentItem> = iter.by_ref().take(chunk_size).collect();
        chunks.push(Chunk {
            ordinal: chunks.len() + 1,
            items: batch,
        });
    }

    tracing::debug!("Created {} chunks of up to {} items", chunks.len(), chunk_size);
    chunks
}
