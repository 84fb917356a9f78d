// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! Sentence-wise text chunking for indexing.

/// Default chunk ceiling, chosen to keep several passages inside one prompt.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1000;

/// Chunks below this are noise (page numbers, stray headers) and are skipped.
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 100;

/// Split `text` into chunks of at most `max_chars`, breaking on sentence
/// boundaries. A sentence longer than `max_chars` becomes its own chunk
/// rather than being split mid-sentence. Chunks shorter than `min_chars`
/// are dropped.
pub fn split_into_chunks(text: &str, max_chars: usize, min_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split_inclusive(['.', '?', '!']) {
        let sentence = sentence.trim_start_matches(['\n', '\r']);
        if sentence.is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + sentence.len() > max_chars {
            push_chunk(&mut chunks, &mut current, min_chars);
        }
        current.push_str(sentence);
    }
    push_chunk(&mut chunks, &mut current, min_chars);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, current: &mut String, min_chars: usize) {
    let trimmed = current.trim();
    if trimmed.len() >= min_chars {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}
