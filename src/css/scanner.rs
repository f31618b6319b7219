//! Lexical helpers shared by the rule-list parser and the value parsers
//!
//! [`TopLevel`] walks CSS source byte by byte, stepping over strings,
//! comments and escapes, and reports every remaining byte together with its
//! bracket nesting depth. Every split point the parsers use is an ASCII
//! byte, so slicing at the reported offsets is always UTF-8 safe.

/// Iterator over the "code" bytes of CSS source: `(offset, byte, depth)`
///
/// Openers report the depth outside them, closers the depth after them, so a
/// matching `{`/`}` pair reports the same depth.
pub(crate) struct TopLevel<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> TopLevel<'a> {
    pub(crate) fn new(source: &'a str, from: usize) -> Self {
        Self::with_depth(source, from, 0)
    }

    pub(crate) fn with_depth(source: &'a str, from: usize, depth: usize) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: from,
            depth,
        }
    }

    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn skip_comment(&mut self) {
        self.pos += 2;
        while self.pos + 1 < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.bytes.len();
    }
}

impl Iterator for TopLevel<'_> {
    type Item = (usize, u8, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let index = self.pos;
            let byte = self.bytes[index];
            match byte {
                b'"' | b'\'' => self.skip_string(byte),
                b'/' if self.bytes.get(index + 1) == Some(&b'*') => self.skip_comment(),
                b'\\' => self.pos += 2,
                b'(' | b'[' | b'{' => {
                    self.pos += 1;
                    let depth = self.depth;
                    self.depth += 1;
                    return Some((index, byte, depth));
                }
                b')' | b']' | b'}' => {
                    self.pos += 1;
                    self.depth = self.depth.saturating_sub(1);
                    return Some((index, byte, self.depth));
                }
                _ => {
                    self.pos += 1;
                    return Some((index, byte, self.depth));
                }
            }
        }
        None
    }
}

/// First offset at or after `from` holding one of `targets` at depth 0
pub(crate) fn find_top_level(source: &str, from: usize, targets: &[u8]) -> Option<usize> {
    TopLevel::new(source, from)
        .find(|(_, byte, depth)| *depth == 0 && targets.contains(byte))
        .map(|(index, _, _)| index)
}

/// Offset of the `}` closing the block opened at `open`
pub(crate) fn find_block_end(source: &str, open: usize) -> Option<usize> {
    TopLevel::with_depth(source, open + 1, 1)
        .find(|(_, byte, depth)| *byte == b'}' && *depth == 0)
        .map(|(index, _, _)| index)
}

/// Skip whitespace and comments starting at `from`
pub(crate) fn skip_whitespace_and_comments(source: &str, from: usize) -> usize {
    let bytes = source.as_bytes();
    let mut pos = from;
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) == Some(&b'/') && bytes.get(pos + 1) == Some(&b'*') {
            pos = source[pos + 2..]
                .find("*/")
                .map_or(bytes.len(), |end| pos + 2 + end + 2);
        } else {
            return pos;
        }
    }
}

/// Split on `separator` wherever it appears outside brackets, strings and comments
pub(crate) fn split_top_level(source: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, byte, depth) in TopLevel::new(source, 0) {
        if byte == separator && depth == 0 {
            parts.push(&source[start..index]);
            start = index + 1;
        }
    }
    parts.push(&source[start..]);
    parts
}

/// Split on runs of top-level ASCII whitespace, dropping empty pieces
pub(crate) fn split_top_level_whitespace(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, byte, depth) in TopLevel::new(source, 0) {
        if byte.is_ascii_whitespace() && depth == 0 {
            if index > start {
                parts.push(&source[start..index]);
            }
            start = index + 1;
        }
    }
    if start < source.len() {
        parts.push(&source[start..]);
    }
    parts
}
