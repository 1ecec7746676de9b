//! Recursive character text splitter.
//!
//! Splits on the first separator that occurs in the text (paragraphs, then
//! lines, then words, then characters), recursing into any piece still too
//! long, and greedily merges small pieces back into chunks of at most
//! `chunk_size` characters. Consecutive chunks share up to `chunk_overlap`
//! characters of trailing pieces. Separators stay attached to the start of
//! the piece that follows them, chunks are whitespace-trimmed and empty
//! chunks are dropped.

use std::collections::VecDeque;

use tracing::warn;

use crate::errors::{IngestError, Result};

/// Default separators, coarsest first. The empty separator splits into
/// single characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into overlapping chunks.
#[derive(Clone, Debug)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::with_separators(chunk_size, chunk_overlap, &DEFAULT_SEPARATORS)
    }

    /// Create a splitter with custom separators, coarsest first.
    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: &[&str],
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(IngestError::Config("chunk size must be positive".into()));
        }
        if chunk_overlap > chunk_size {
            return Err(IngestError::Config(format!(
                "chunk overlap ({chunk_overlap}) is larger than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: separators.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&str] = &[];
        for (i, sep) in separators.iter().copied().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&std::mem::take(&mut small)));
            }
            if finer.is_empty() {
                chunks.extend(trimmed(&piece));
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    /// Greedily join pieces into chunks, carrying trailing pieces forward as
    /// overlap.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        len = total,
                        chunk_size = self.chunk_size,
                        "created a chunk longer than the chunk size"
                    );
                }
                if !current.is_empty() {
                    chunks.extend(join_trimmed(&current));
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        let Some(front) = current.pop_front() else {
                            break;
                        };
                        total -= char_len(front);
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }
        chunks.extend(join_trimmed(&current));
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on `separator`, prefixing each piece after the first with it.
/// An empty separator yields single characters. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    let mut parts = text.split(separator);
    let first = parts.next().map(str::to_string);
    first
        .into_iter()
        .chain(parts.map(|p| format!("{separator}{p}")))
        .filter(|p| !p.is_empty())
        .collect()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    trimmed(&pieces.iter().copied().collect::<String>())
}

fn trimmed(chunk: &str) -> Option<String> {
    let chunk = chunk.trim();
    (!chunk.is_empty()).then(|| chunk.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
