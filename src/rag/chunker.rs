//! Overlapping fixed-size text chunking.
//!
//! Windows are measured in characters (Unicode scalar values), so a chunk
//! boundary never falls inside a multi-byte code point.

use crate::types::{AppError, Chunk, Document, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker, rejecting parameters that would never advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size <= chunk_overlap {
            return Err(AppError::InvalidChunkingParameters {
                chunk_size,
                overlap: chunk_overlap,
            });
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance between the starts of consecutive chunks
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        // Byte offset of every char, plus the end of the string
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;

        (0..char_count)
            .step_by(self.step())
            .map(|start| {
                let end = (start + self.chunk_size).min(char_count);
                text[boundaries[start]..boundaries[end]].to_string()
            })
            .collect()
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.chunk(&document.content)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                document: document.name.clone(),
                index,
                text,
            })
            .collect()
    }
}
