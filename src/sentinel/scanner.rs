//! Heuristic function scanner.
//!
//! Finds function-like constructs in source text and measures their line
//! spans. Best effort by design: regex candidates plus a balanced-delimiter
//! scan, not a parser. The narrow [`scan`] interface keeps the rest of the
//! sentinel ignorant of how candidates are found, so a real incremental
//! parser could replace this module without touching debounce or cooldown
//! logic.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// A function-like construct found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    /// Best-effort name, or `"anonymous"`.
    pub name: String,
    /// Byte offset of the opening delimiter.
    pub start: usize,
    /// Line span between the opening and matching closing delimiter,
    /// counting both delimiter lines.
    pub lines: usize,
}

// Candidate patterns, each anchored on the opening brace.
static FN_DECLARATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:export\s+)?(?:async\s+)?function\s+\w+\s*\([^)]*\)\s*(?::\s*[^{]+)?\s*\{")
        .expect("static regex: function declaration pattern")
});

static ARROW_BINDING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:export\s+)?(?:const|let|var)\s+\w+\s*=\s*(?:async\s*)?\([^)]*\)\s*(?::\s*[^{=]+)?=>\s*\{",
    )
    .expect("static regex: arrow binding pattern")
});

static METHOD_SHORTHAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:public|private|protected|static|\s)*\s*\w+\s*\([^)]*\)\s*(?::\s*[^{]+)?\s*\{")
        .expect("static regex: method shorthand pattern")
});

// Skips any run of leading keywords so `export const handler = ...` names
// the binding, not the keyword.
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:export|function|const|let|var|async|public|private|protected|static)\s+)*(\w+)",
    )
    .expect("static regex: name extraction pattern")
});

/// Scans source text for function-like constructs.
///
/// Candidates whose opening delimiter resolves to the same offset are
/// deduplicated (the patterns overlap on purpose). A candidate with no
/// matching closing delimiter is dropped rather than scanned unboundedly.
#[must_use]
pub fn scan(text: &str) -> Vec<FunctionSpan> {
    let mut seen_starts = HashSet::new();
    let mut spans = Vec::new();

    for pattern in [
        &FN_DECLARATION_REGEX,
        &ARROW_BINDING_REGEX,
        &METHOD_SHORTHAND_REGEX,
    ] {
        for candidate in pattern.find_iter(text) {
            let Some(brace_offset) = text[candidate.start()..].find('{') else {
                continue;
            };
            let start = candidate.start() + brace_offset;
            if !seen_starts.insert(start) {
                continue;
            }

            let Some(end) = matching_close(text, start) else {
                // Unbalanced delimiters: treat as no function found here.
                continue;
            };

            let name = NAME_REGEX
                .captures(&text[candidate.start()..start])
                .and_then(|captures| captures.get(1))
                .map_or_else(|| "anonymous".to_string(), |m| m.as_str().to_string());

            let lines = text[start..end].bytes().filter(|b| *b == b'\n').count() + 1;
            spans.push(FunctionSpan { name, start, lines });
        }
    }

    spans
}

/// Finds the byte offset just past the delimiter matching `text[open]`.
///
/// Nesting-aware, bounded by the text length. Returns `None` when the
/// opening delimiter is never closed.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth: usize = 1;
    let mut index = open + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
        index += 1;
    }
    None
}
