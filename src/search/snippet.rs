//! Query-dependent snippet extraction
//!
//! Picks the earliest whole-word occurrence of any query term in the passage
//! text, cuts a window around it snapped to sentence or word boundaries, and
//! marks truncation with ellipses. Highlighting wraps matched terms in ANSI
//! codes for the terminal REPL.

/// Maximum snippet length in bytes
const SNIPPET_LENGTH: usize = 200;
/// Context kept before the first matched term
const CONTEXT_WINDOW: usize = 50;

/// Extract a snippet from `content` centered on the first query-term match.
/// Falls back to the head of the passage when nothing matches.
pub fn generate(content: &str, query_terms: &[String]) -> String {
    if content.is_empty() || query_terms.is_empty() {
        return truncate(content, SNIPPET_LENGTH);
    }

    let best_pos = query_terms
        .iter()
        .filter_map(|term| find_whole_word(content, term, 0))
        .min();

    let Some(pos) = best_pos else {
        return truncate(content, SNIPPET_LENGTH);
    };

    let mut start = floor_boundary(content, pos.saturating_sub(CONTEXT_WINDOW));
    let mut end = floor_boundary(content, (start + SNIPPET_LENGTH).min(content.len()));

    if start > 0 {
        // Snap back to a nearby sentence start, else a word boundary
        if let Some(sentence) = content[..start].rfind(['.', '!', '?', '\n']) {
            if start - sentence < 100 {
                start = sentence + 1;
                while start < content.len() && content.as_bytes()[start].is_ascii_whitespace() {
                    start += 1;
                }
            } else if let Some(word) = content[..start].rfind([' ', '\t', '\n']) {
                start = word + 1;
            }
        } else if let Some(word) = content[..start].rfind([' ', '\t', '\n']) {
            start = word + 1;
        }
    }

    if end < content.len() {
        // Extend to a nearby sentence end, else cut at a word boundary
        if let Some(sentence) = content[end..].find(['.', '!', '?', '\n']) {
            if sentence < 100 {
                end += sentence + 1;
            } else if let Some(word) = content[end..].find([' ', '\t', '\n']) {
                end += word;
            }
        } else if let Some(word) = content[end..].find([' ', '\t', '\n']) {
            end += word;
        }
    }

    let mut snippet = content[start..end.max(start)].trim().to_string();
    if start > 0 {
        snippet = format!("...{}", snippet);
    }
    if end < content.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Wrap every whole-word query-term match in ANSI bold-yellow.
pub fn highlight(snippet: &str, query_terms: &[String]) -> String {
    let mut matches: Vec<(usize, usize)> = Vec::new();
    for term in query_terms {
        let mut pos = 0;
        while let Some(found) = find_whole_word(snippet, term, pos) {
            matches.push((found, term.len()));
            pos = found + term.len();
        }
    }

    if matches.is_empty() {
        return snippet.to_string();
    }

    matches.sort_unstable();
    let mut kept: Vec<(usize, usize)> = Vec::new();
    for (start, len) in matches {
        let overlaps = kept
            .iter()
            .any(|&(s, l)| start < s + l && start + len > s);
        if !overlaps {
            kept.push((start, len));
        }
    }

    // Insert codes back to front so earlier offsets stay valid
    let mut result = snippet.to_string();
    for &(start, len) in kept.iter().rev() {
        result.insert_str(start + len, "\x1b[0m");
        result.insert_str(start, "\x1b[1;33m");
    }
    result
}

/// Case-insensitive whole-word search over bytes; a match must not touch an
/// alphanumeric byte on either side. Byte offsets into `text`.
fn find_whole_word(text: &str, word: &str, start_pos: usize) -> Option<usize> {
    if word.is_empty() || start_pos >= text.len() {
        return None;
    }
    let haystack: Vec<u8> = text.bytes().map(|b| b.to_ascii_lowercase()).collect();
    let needle: Vec<u8> = word.bytes().map(|b| b.to_ascii_lowercase()).collect();

    let mut pos = start_pos;
    while pos + needle.len() <= haystack.len() {
        let offset = haystack[pos..]
            .windows(needle.len())
            .position(|w| w == needle.as_slice())?;
        let found = pos + offset;

        let valid_start = found == 0 || !haystack[found - 1].is_ascii_alphanumeric();
        let after = found + needle.len();
        let valid_end = after >= haystack.len() || !haystack[after].is_ascii_alphanumeric();
        if valid_start && valid_end {
            return Some(found);
        }
        pos = found + 1;
    }
    None
}

/// Largest char boundary at or below `idx`.
fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let limit = floor_boundary(text, max_len);
    let mut cut = limit;
    if let Some(word_end) = text[..limit].rfind([' ', '\t', '\n']) {
        if word_end * 10 > max_len * 8 {
            cut = word_end;
        }
    }
    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_short_content_passes_through() {
        let snippet = generate("a short passage", &terms(&["missing"]));
        assert_eq!(snippet, "a short passage");
    }

    #[test]
    fn test_snippet_contains_match() {
        let long_head = "filler word ".repeat(30);
        let content = format!("{}the salmon swims upstream. More text follows here.", long_head);
        let snippet = generate(&content, &terms(&["salmon"]));
        assert!(snippet.contains("salmon"));
        assert!(snippet.starts_with("..."));
    }

    #[test]
    fn test_whole_word_matching() {
        // "fox" must not match inside "foxes" when a standalone "fox" exists later
        let content = "foxes are plural but a fox is singular";
        assert_eq!(find_whole_word(content, "fox", 0), Some(23));
    }

    #[test]
    fn test_case_insensitive_match() {
        assert_eq!(find_whole_word("The Fox jumps", "fox", 0), Some(4));
    }

    #[test]
    fn test_no_match_falls_back_to_head() {
        let content = "word ".repeat(100);
        let snippet = generate(&content, &terms(&["absent"]));
        assert!(snippet.len() <= SNIPPET_LENGTH + 3);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_multibyte_content_does_not_split_chars() {
        let content = "caf\u{e9} ".repeat(80);
        let snippet = generate(&content, &terms(&["caf"]));
        // Must not panic and must produce valid UTF-8 output
        assert!(!snippet.is_empty());
    }

    #[test]
    fn test_highlight_wraps_matches() {
        let highlighted = highlight("the fox runs", &terms(&["fox"]));
        assert_eq!(highlighted, "the \x1b[1;33mfox\x1b[0m runs");
    }

    #[test]
    fn test_highlight_without_match_is_identity() {
        let text = "nothing to see";
        assert_eq!(highlight(text, &terms(&["fox"])), text);
    }

    #[test]
    fn test_empty_query_terms() {
        let snippet = generate("some passage text", &[]);
        assert_eq!(snippet, "some passage text");
    }
}
