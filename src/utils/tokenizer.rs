//! Line tokenizer shared by indexing and querying.
//!
//! A line is cut wherever the character class flips between alphanumeric and
//! non-alphanumeric. Nothing is dropped: concatenating the tokens of a line
//! gives back the lower-cased line.

use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Other,
}

fn classify_char(ch: char) -> CharClass {
    if ch.is_alphanumeric() {
        CharClass::Word
    } else {
        CharClass::Other
    }
}

/// Tokenize a line (or a query phrase) into lower-cased runs.
///
/// Always returns at least one token: the empty string tokenizes to `[""]`.
///
/// ```
/// use linedex::utils::tokenize;
///
/// assert_eq!(tokenize("Ned Land!"), vec!["ned", " ", "land", "!"]);
/// assert_eq!(tokenize(""), vec![""]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    // Lower-case the whole text once so context-dependent mappings (final
    // sigma) see their neighbours, then cut it where the spans end.
    let lowered = text.to_lowercase();
    let mut pos = 0;
    token_spans(text)
        .map(|span| {
            let len = lowered_len(span);
            let token = lowered[pos..pos + len].to_string();
            pos += len;
            token
        })
        .collect()
}

/// Byte length of `span` once lower-cased. Final sigma only chooses between
/// two 2-byte forms, so per-char mapping gives the same length.
fn lowered_len(span: &str) -> usize {
    span.chars()
        .flat_map(char::to_lowercase)
        .map(char::len_utf8)
        .sum()
}

/// Iterate over the original-case spans that [`tokenize`] lower-cases.
pub fn token_spans(text: &str) -> TokenSpans<'_> {
    TokenSpans {
        text,
        pos: 0,
        done: false,
    }
}

/// Iterator returned by [`token_spans`].
#[derive(Debug, Clone)]
pub struct TokenSpans<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for TokenSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.pos..];
        let mut chars = rest.char_indices();
        let class = match chars.next() {
            Some((_, ch)) => classify_char(ch),
            None => {
                // Only reachable for empty input: the pending span is still emitted
                self.done = true;
                return Some(rest);
            }
        };

        let end = chars
            .find(|&(_, ch)| classify_char(ch) != class)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let start = self.pos;
        self.pos += end;
        if self.pos == self.text.len() {
            self.done = true;
        }

        Some(&self.text[start..self.pos])
    }
}

impl FusedIterator for TokenSpans<'_> {}

/// Whether `needle` occurs as a contiguous run of tokens inside `haystack`.
pub fn contains_tokens(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
