//! In-memory sink for streamed bundle output.

use std::io;

/// Accumulates byte chunks and exposes them as one string once finished.
///
/// Writes never fail. Reading consumes the sink, so the text can only be
/// observed after the producer is done with it.
#[derive(Debug, Default)]
pub struct ByteSink {
    chunks: Vec<Vec<u8>>,
    len: usize,
}

impl ByteSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one chunk.
    pub fn write_chunk(&mut self, chunk: impl AsRef<[u8]>) {
        let chunk = chunk.as_ref();
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push(chunk.to_vec());
    }

    /// Total bytes buffered so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finish writing and decode everything as UTF-8 text.
    ///
    /// Chunk boundaries may split multi-byte characters, so decoding happens
    /// on the concatenation, never per chunk.
    pub fn finish(self) -> String {
        let bytes = self.chunks.concat();
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

impl io::Write for ByteSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn concatenates_chunks_in_order() {
        let mut sink = ByteSink::new();
        sink.write_chunk("var a = 1;");
        sink.write_chunk(b"\n");
        sink.write_chunk(String::from("var b = 2;"));
        assert_eq!(sink.len(), 21);
        assert_eq!(sink.finish(), "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn decodes_characters_split_across_chunks() {
        let bytes = "héllo".as_bytes();
        let mut sink = ByteSink::new();
        sink.write_chunk(&bytes[..2]);
        sink.write_chunk(&bytes[2..]);
        assert_eq!(sink.finish(), "héllo");
    }

    #[test]
    fn io_write_accepts_everything() {
        let mut sink = ByteSink::new();
        write!(sink, "{}-{}", "app", 42).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.finish(), "app-42");
    }

    #[test]
    fn empty_sink_finishes_empty() {
        let sink = ByteSink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.finish(), "");
    }
}
