//! Splits an in-memory document into lines without copying.
//!
//! The [LineBuffer] hands out one line at a time to the XML tokenizer via [BufRead]. This keeps
//! every slice it hands out pointing into the original data and makes it cheap to map a byte
//! position (as reported by the tokenizer) back to a line number.
//!
//! ```
//! use adm::xml::lines::LineBuffer;
//!
//! let mut lines = LineBuffer::new(b"<a>\n<b/>\n</a>");
//! assert_eq!(lines.next(), Some(&b"<a>\n"[..]));
//! assert_eq!(lines.line(), 2);
//! assert_eq!(lines.collect::<Vec<_>>().len(), 2);
//! ```
use std::io::{BufRead, Read};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Provides line wise access to a byte slice.
pub struct LineBuffer<'a> {
    data: &'a [u8],
    position: usize,
    line: usize,
}

impl<'a> LineBuffer<'a> {
    /// Creates a buffer for the given data, skipping a leading UTF-8 byte order mark.
    pub fn new(data: &'a [u8]) -> Self {
        LineBuffer {
            data: data.strip_prefix(UTF8_BOM).unwrap_or(data),
            position: 0,
            line: 1,
        }
    }

    /// Returns the line number (starting at 1) of the next byte to be read.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Determines the line number of the given byte offset.
    ///
    /// # Example
    /// ```
    /// # use adm::xml::lines::LineBuffer;
    /// let lines = LineBuffer::new(b"<a>\n<b/>\n</a>");
    /// assert_eq!(lines.line_of(0), 1);
    /// assert_eq!(lines.line_of(5), 2);
    /// assert_eq!(lines.line_of(100), 3);
    /// ```
    pub fn line_of(&self, position: usize) -> usize {
        let end = position.min(self.data.len());
        1 + self.data[..end].iter().filter(|byte| **byte == b'\n').count()
    }

    fn current_line(&self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        match rest.iter().position(|byte| *byte == b'\n') {
            Some(index) => &rest[..=index],
            None => rest,
        }
    }
}

impl<'a> Iterator for LineBuffer<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.current_line();
        if line.is_empty() {
            None
        } else {
            self.consume(line.len());
            Some(line)
        }
    }
}

impl Read for LineBuffer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let line = self.current_line();
        let length = line.len().min(buf.len());
        buf[..length].copy_from_slice(&line[..length]);
        self.consume(length);

        Ok(length)
    }
}

impl BufRead for LineBuffer<'_> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        Ok(self.current_line())
    }

    fn consume(&mut self, amt: usize) {
        let end = (self.position + amt).min(self.data.len());
        self.line += self.data[self.position..end]
            .iter()
            .filter(|byte| **byte == b'\n')
            .count();
        self.position = end;
    }
}
