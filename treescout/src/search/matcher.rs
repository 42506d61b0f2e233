use memchr::memmem::Finder;
use std::io::{self, BufRead};
use std::sync::Arc;

const LINE_CAPACITY: usize = 256;

/// Literal, case-sensitive keyword test applied one line at a time.
///
/// Lines are raw bytes, so files that are not valid UTF-8 are searched as-is.
/// A keyword whose only occurrence straddles a newline is not found.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: Arc<str>,
    finder: Finder<'static>,
}

impl KeywordMatcher {
    /// Creates a matcher sharing the given keyword
    pub fn new(keyword: Arc<str>) -> Self {
        let finder = Finder::new(keyword.as_bytes()).into_owned();
        Self { keyword, finder }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Reads `reader` line by line and stops at the first line containing the keyword
    pub fn matches<R: BufRead>(&self, reader: R) -> io::Result<bool> {
        scan_lines(reader, &self.finder)
    }
}

/// Returns whether any single line of `reader` contains `keyword`.
///
/// A line is everything up to and including `\n`, or the tail of the stream.
/// Returns on the first hit without reading further; the reader is left open.
pub fn contains_keyword<R: BufRead>(reader: R, keyword: &[u8]) -> io::Result<bool> {
    scan_lines(reader, &Finder::new(keyword))
}

fn scan_lines<R: BufRead>(mut reader: R, finder: &Finder<'_>) -> io::Result<bool> {
    let mut line = Vec::with_capacity(LINE_CAPACITY);
    while reader.read_until(b'\n', &mut line)? > 0 {
        if finder.find(&line).is_some() {
            return Ok(true);
        }
        line.clear();
    }
    Ok(false)
}
