//! Immutable, 0-indexed store of corpus lines

use crate::index::types::{LineId, MAX_LINES, line_id};
use memchr::memchr_iter;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a corpus from disk
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("can't read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line} is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("corpus has more than {} lines", MAX_LINES)]
    TooLarge,
}

/// Ordered lines of the source text
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    lines: Vec<Box<str>>,
}

impl Corpus {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split text into lines. Lines end at `\n` and lose one trailing `\r`;
    /// a final newline does not open an extra empty line.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let body = text.strip_suffix('\n').unwrap_or(text);
        Self::new(body.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line)))
    }

    /// Load a corpus file through a memory map
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let io_err = |source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            // Mapping a zero-length file fails on some platforms
            return Ok(Self::default());
        }

        // SAFETY: the map is read once and dropped before returning
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        let corpus = Self::from_bytes(&mmap)?;
        if corpus.len() > MAX_LINES {
            return Err(CorpusError::TooLarge);
        }
        Ok(corpus)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CorpusError> {
        let mut lines = Vec::new();
        let mut start = 0;

        for end in memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len())) {
            if end == bytes.len() && start == end {
                // Trailing newline (or empty input)
                break;
            }
            let raw = &bytes[start..end];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = std::str::from_utf8(raw).map_err(|_| CorpusError::InvalidUtf8 {
                line: lines.len(),
            })?;
            lines.push(Box::<str>::from(line));
            start = end + 1;
        }

        Ok(Self { lines })
    }

    pub fn get(&self, line: LineId) -> Option<&str> {
        self.lines.get(line as usize).map(AsRef::as_ref)
    }

    pub fn lines(&self) -> &[Box<str>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines paired with their ids
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (LineId, &str)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (line_id(i), line.as_ref()))
    }
}
