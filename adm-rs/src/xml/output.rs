//! Provides the chunked output protocol used by the document writer.
//!
//! The writer never owns the memory it writes into. Instead a [ChunkSink] hands out one chunk
//! at a time. Once a chunk is full, the sink is told how many bytes have been written into it
//! and is asked for the next one. Serialized text may straddle any number of chunks, so even
//! a chunk size of a single byte works.
//!
//! # Example
//!
//! ```
//! # use adm::status::AdmResult;
//! use adm::xml::output::{BytesSink, Output};
//!
//! # fn main() -> AdmResult<()> {
//! let mut sink = BytesSink::new(4);
//! let mut output = Output::new(&mut sink);
//! output.write_str("<audioObject/>")?;
//! assert_eq!(output.finish()?, 14);
//!
//! assert_eq!(&sink.into_bytes()[..], b"<audioObject/>");
//! # Ok(())
//! # }
//! ```
use std::io::Write;

use bytes::{Bytes, BytesMut};

use crate::adm_error;
use crate::status::AdmResult;

/// Receives the output of a writer chunk by chunk.
pub trait ChunkSink {
    /// Accepts the bytes written into the current chunk and prepares the next one.
    ///
    /// For the very first call `written` is zero as no chunk has been handed out yet. Returns
    /// `false` if no more chunks are available.
    fn next_chunk(&mut self, written: usize) -> AdmResult<bool>;

    /// Provides the current chunk.
    fn chunk(&mut self) -> &mut [u8];

    /// Accepts the bytes written into the last chunk once the output is complete.
    fn finish(&mut self, written: usize) -> AdmResult<()>;
}

/// Writes a byte stream into the chunks of a [ChunkSink].
pub struct Output<'a, S: ChunkSink> {
    sink: &'a mut S,
    written: usize,
    capacity: usize,
    total: usize,
}

impl<'a, S: ChunkSink> Output<'a, S> {
    /// Creates a new output for the given sink.
    ///
    /// The first chunk is only requested once there is something to write.
    pub fn new(sink: &'a mut S) -> Self {
        Output {
            sink,
            written: 0,
            capacity: 0,
            total: 0,
        }
    }

    fn advance(&mut self) -> AdmResult<()> {
        if !self.sink.next_chunk(self.written)? {
            return Err(adm_error!(
                NullPointer,
                "No output chunk was provided after {} bytes",
                self.total
            ));
        }

        self.written = 0;
        self.capacity = self.sink.chunk().len();
        if self.capacity == 0 {
            return Err(adm_error!(
                InvalidArgument,
                "An empty output chunk was provided after {} bytes",
                self.total
            ));
        }

        Ok(())
    }

    /// Appends the given bytes, requesting new chunks as needed.
    pub fn write(&mut self, mut data: &[u8]) -> AdmResult<()> {
        while !data.is_empty() {
            if self.written == self.capacity {
                self.advance()?;
            }

            let length = (self.capacity - self.written).min(data.len());
            let start = self.written;
            let chunk = self.sink.chunk();
            if chunk.len() < start + length {
                return Err(adm_error!(
                    InvalidArgument,
                    "The output chunk shrunk while being written"
                ));
            }
            chunk[start..start + length].copy_from_slice(&data[..length]);

            self.written += length;
            self.total += length;
            data = &data[length..];
        }

        Ok(())
    }

    /// Appends the given string.
    pub fn write_str(&mut self, data: &str) -> AdmResult<()> {
        self.write(data.as_bytes())
    }

    /// Hands the last chunk to the sink and returns the total number of bytes written.
    pub fn finish(self) -> AdmResult<usize> {
        self.sink.finish(self.written)?;
        Ok(self.total)
    }
}

/// Collects all chunks into a single buffer.
pub struct BytesSink {
    buffer: BytesMut,
    chunk: Vec<u8>,
    chunk_size: usize,
}

impl BytesSink {
    /// Creates a sink which hands out chunks of the given size.
    pub fn new(chunk_size: usize) -> Self {
        BytesSink {
            buffer: BytesMut::with_capacity(chunk_size),
            chunk: Vec::new(),
            chunk_size,
        }
    }

    /// Returns everything collected so far.
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl ChunkSink for BytesSink {
    fn next_chunk(&mut self, written: usize) -> AdmResult<bool> {
        self.buffer.extend_from_slice(&self.chunk[..written]);
        self.chunk.clear();
        self.chunk.resize(self.chunk_size, 0);

        Ok(true)
    }

    fn chunk(&mut self) -> &mut [u8] {
        &mut self.chunk
    }

    fn finish(&mut self, written: usize) -> AdmResult<()> {
        self.buffer.extend_from_slice(&self.chunk[..written]);
        self.chunk.clear();

        Ok(())
    }
}

/// Forwards each chunk to the given writer.
pub struct IoSink<W: Write> {
    writer: W,
    chunk: Vec<u8>,
}

impl<W: Write> IoSink<W> {
    /// Creates a sink which forwards chunks of the given size to the writer.
    pub fn new(writer: W, chunk_size: usize) -> Self {
        IoSink {
            writer,
            chunk: vec![0; chunk_size],
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for IoSink<W> {
    fn next_chunk(&mut self, written: usize) -> AdmResult<bool> {
        self.writer.write_all(&self.chunk[..written])?;
        Ok(true)
    }

    fn chunk(&mut self) -> &mut [u8] {
        &mut self.chunk
    }

    fn finish(&mut self, written: usize) -> AdmResult<()> {
        self.writer.write_all(&self.chunk[..written])?;
        self.writer.flush()?;

        Ok(())
    }
}
