//! Output formatting for search results

use crate::index::LineId;
use crate::utils::{token_spans, tokenize};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// How matches are printed
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub color: bool,
    /// Prefix each line with its 0-based line number
    pub line_numbers: bool,
}

/// Byte ranges of `line` where `phrase` occurs at token granularity.
/// Overlapping occurrences are merged.
pub fn highlight_ranges(line: &str, phrase: &str) -> Vec<(usize, usize)> {
    let needle = tokenize(phrase);
    let spans: Vec<&str> = token_spans(line).collect();
    let lowered: Vec<String> = spans.iter().map(|s| s.to_lowercase()).collect();

    let mut offsets = Vec::with_capacity(spans.len() + 1);
    let mut pos = 0;
    offsets.push(pos);
    for span in &spans {
        pos += span.len();
        offsets.push(pos);
    }

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    if needle.len() > lowered.len() {
        return ranges;
    }

    for (start, window) in lowered.windows(needle.len()).enumerate() {
        if window != needle.as_slice() {
            continue;
        }
        let (from, to) = (offsets[start], offsets[start + needle.len()]);
        match ranges.last_mut() {
            Some(last) if from <= last.1 => last.1 = last.1.max(to),
            _ => ranges.push((from, to)),
        }
    }

    ranges
}

/// Print matched lines to stdout
pub fn print_matches<'a>(
    matches: impl IntoIterator<Item = (LineId, &'a str)>,
    phrase: &str,
    options: OutputOptions,
) -> io::Result<()> {
    let choice = if options.color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_matches(&mut stdout, matches, phrase, options)
}

/// Write matched lines to any color-aware writer
pub fn write_matches<'a, W: WriteColor>(
    out: &mut W,
    matches: impl IntoIterator<Item = (LineId, &'a str)>,
    phrase: &str,
    options: OutputOptions,
) -> io::Result<()> {
    for (line_id, content) in matches {
        let line_num = options.line_numbers.then_some(line_id);
        let ranges = highlight_ranges(content, phrase);
        print_match_line(out, line_num, content, &ranges)?;
    }
    Ok(())
}

/// Print a match line with highlighted matches
fn print_match_line<W: WriteColor>(
    out: &mut W,
    line_num: Option<LineId>,
    content: &str,
    ranges: &[(usize, usize)],
) -> io::Result<()> {
    if let Some(n) = line_num {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", n)?;
        out.reset()?;
        write!(out, ":")?;
    }

    let mut cursor = 0;
    for &(start, end) in ranges {
        if start > cursor {
            write!(out, "{}", &content[cursor..start])?;
        }
        if end > start {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(out, "{}", &content[start..end])?;
            out.reset()?;
        }
        cursor = end;
    }

    if cursor < content.len() {
        write!(out, "{}", &content[cursor..])?;
    }

    writeln!(out)?;

    Ok(())
}

/// Print the number of matching lines (for --count)
pub fn print_count(count: u64, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(stdout, "{}", count)?;
    stdout.reset()?;
    Ok(())
}
