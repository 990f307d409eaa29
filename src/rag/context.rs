//! Formats retrieved chunks into the context block of a prompt.

use crate::types::ScoredChunk;

/// Join chunks in ranked order, each under a `"{document}:"` header line,
/// separated by blank lines.
pub fn assemble(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("{}:\n{}", chunk.document, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
