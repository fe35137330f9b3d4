//! Newline framing for the shell's input stream.
//!
//! Reads from the input stream rarely line up with what the user typed: a
//! pasted block arrives as one read, a slow pipe can split a line across
//! several. Bytes are accumulated in a [`LineBuffer`] and complete lines are
//! drained on `\n`; anything left when the stream ends is yielded as a final
//! line.

use tokio::io::{AsyncRead, AsyncReadExt};

use minish_types::error::{EncodingError, Result, ShellError};

/// Size of each read from the underlying stream.
const READ_CHUNK: usize = 4096;

/// Reassembles arbitrary byte chunks into decoded lines.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    max_len: usize,
    /// Set after an overlong line was reported; bytes are dropped until the
    /// next newline.
    discarding: bool,
}

impl LineBuffer {
    /// Create a buffer that rejects lines longer than `max_len` bytes.
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(256),
            max_len,
            discarding: false,
        }
    }

    /// Append bytes received from the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete line, if one has been received.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            line.pop();
            return Some(self.finish_line(line));
        }

        // No newline yet. Guard against unbounded growth; a trailing `\r`
        // may still be half of a CRLF and does not count.
        let pending = match self.buf.last() {
            Some(b'\r') => self.buf.len() - 1,
            _ => self.buf.len(),
        };
        if pending > self.max_len {
            self.buf.clear();
            if !self.discarding {
                self.discarding = true;
                return Some(Err(ShellError::LineTooLong(self.max_len)));
            }
        }
        None
    }

    /// Flush the unterminated remainder once the stream has ended.
    pub fn finish(&mut self) -> Option<Result<String>> {
        let rest = std::mem::take(&mut self.buf);
        if std::mem::take(&mut self.discarding) || rest.is_empty() {
            return None;
        }
        Some(self.finish_line(rest))
    }

    fn finish_line(&self, mut line: Vec<u8>) -> Result<String> {
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > self.max_len {
            return Err(ShellError::LineTooLong(self.max_len));
        }
        String::from_utf8(line).map_err(|e| EncodingError::from(e).into())
    }
}

/// Async line source over any byte stream (stdin in the binary, in-memory
/// readers in tests).
pub struct LineReader<R> {
    input: R,
    buffer: LineBuffer,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(input: R, max_line_len: usize) -> Self {
        Self {
            input,
            buffer: LineBuffer::new(max_line_len),
            eof: false,
        }
    }

    /// Next decoded line, `Ok(None)` once the stream is exhausted.
    ///
    /// Encoding and length errors affect only the offending line; the
    /// reader can be polled again afterwards. I/O errors are returned as
    /// `ShellError::Io`.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.buffer.next_line() {
                return line.map(Some);
            }
            if self.eof {
                return self.buffer.finish().transpose();
            }
            let n = self.input.read(&mut chunk).await?;
            if n == 0 {
                self.eof = true;
            } else {
                self.buffer.push(&chunk[..n]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Delivers one predefined chunk per read.
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ChunkedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl AsyncRead for ChunkedReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if let Some(chunk) = self.chunks.pop_front() {
                buf.put_slice(&chunk);
            }
            Poll::Ready(Ok(()))
        }
    }

    async fn read_all<R: AsyncRead + Unpin>(reader: &mut LineReader<R>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn buffer_waits_for_newline() {
        let mut buf = LineBuffer::new(64);
        buf.push(b"pw");
        assert!(buf.next_line().is_none());
        buf.push(b"d\n");
        assert_eq!(buf.next_line().unwrap().unwrap(), "pwd");
        assert!(buf.next_line().is_none());
    }

    #[test]
    fn buffer_strips_crlf() {
        let mut buf = LineBuffer::new(64);
        buf.push(b"ls /tmp\r\n");
        assert_eq!(buf.next_line().unwrap().unwrap(), "ls /tmp");
    }

    #[test]
    fn buffer_keeps_empty_lines() {
        let mut buf = LineBuffer::new(64);
        buf.push(b"\n\n");
        assert_eq!(buf.next_line().unwrap().unwrap(), "");
        assert_eq!(buf.next_line().unwrap().unwrap(), "");
        assert!(buf.next_line().is_none());
    }

    #[test]
    fn buffer_invalid_utf8_only_affects_its_line() {
        let mut buf = LineBuffer::new(64);
        buf.push(b"ls \xff\xfe\npwd\n");
        match buf.next_line().unwrap() {
            Err(ShellError::Encoding(e)) => assert_eq!(e.valid_up_to, 3),
            other => panic!("expected encoding error, got {other:?}"),
        }
        assert_eq!(buf.next_line().unwrap().unwrap(), "pwd");
    }

    #[test]
    fn buffer_overlong_line_is_reported_once_and_skipped() {
        let mut buf = LineBuffer::new(8);
        buf.push(b"0123456789");
        assert!(matches!(
            buf.next_line(),
            Some(Err(ShellError::LineTooLong(8)))
        ));
        buf.push(b"abcdefghijkl");
        assert!(buf.next_line().is_none());
        buf.push(b"tail\npwd\n");
        assert_eq!(buf.next_line().unwrap().unwrap(), "pwd");
    }

    #[test]
    fn buffer_overlong_complete_line() {
        let mut buf = LineBuffer::new(4);
        buf.push(b"toolong\nls\n");
        assert!(matches!(
            buf.next_line(),
            Some(Err(ShellError::LineTooLong(4)))
        ));
        assert_eq!(buf.next_line().unwrap().unwrap(), "ls");
    }

    #[test]
    fn crlf_line_at_limit_accepted_however_it_is_split() {
        let mut whole = LineBuffer::new(4);
        whole.push(b"abcd\r\n");
        assert_eq!(whole.next_line().unwrap().unwrap(), "abcd");

        let mut split = LineBuffer::new(4);
        split.push(b"abcd\r");
        assert!(split.next_line().is_none());
        split.push(b"\n");
        assert_eq!(split.next_line().unwrap().unwrap(), "abcd");
        assert!(split.next_line().is_none());
    }

    #[test]
    fn overlong_line_ending_in_cr_is_still_rejected() {
        let mut buf = LineBuffer::new(4);
        buf.push(b"abcde\r");
        assert!(matches!(
            buf.next_line(),
            Some(Err(ShellError::LineTooLong(4)))
        ));
        buf.push(b"\npwd\n");
        assert_eq!(buf.next_line().unwrap().unwrap(), "pwd");
    }

    #[tokio::test]
    async fn reader_accepts_crlf_at_limit_split_before_newline() {
        let mut reader = LineReader::new(ChunkedReader::new(&[b"abcd\r", b"\n", b"pwd\n"]), 4);
        assert_eq!(read_all(&mut reader).await, vec!["abcd", "pwd"]);
    }

    #[test]
    fn finish_yields_remainder() {
        let mut buf = LineBuffer::new(64);
        buf.push(b"pwd");
        assert!(buf.next_line().is_none());
        assert_eq!(buf.finish().unwrap().unwrap(), "pwd");
        assert!(buf.finish().is_none());
    }

    #[tokio::test]
    async fn reader_splits_batched_input() {
        let mut reader = LineReader::new(&b"pwd\nls /tmp\nwget http://x f\n"[..], 64);
        assert_eq!(
            read_all(&mut reader).await,
            vec!["pwd", "ls /tmp", "wget http://x f"]
        );
    }

    #[tokio::test]
    async fn reader_joins_split_input() {
        let mut reader =
            LineReader::new(ChunkedReader::new(&[b"p", b"w", b"d\nl", b"s\r", b"\n"]), 64);
        assert_eq!(read_all(&mut reader).await, vec!["pwd", "ls"]);
    }

    #[tokio::test]
    async fn reader_yields_unterminated_last_line() {
        let mut reader = LineReader::new(ChunkedReader::new(&[b"pwd\nls"]), 64);
        assert_eq!(read_all(&mut reader).await, vec!["pwd", "ls"]);
        assert!(reader.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reader_continues_after_encoding_error() {
        let mut reader = LineReader::new(&b"\xc3\x28\npwd\n"[..], 64);
        assert!(matches!(
            reader.next_line().await,
            Err(ShellError::Encoding(_))
        ));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("pwd"));
        assert!(reader.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reader_decodes_multibyte_split_across_reads() {
        // "é" is 0xC3 0xA9; split it between two reads.
        let mut reader = LineReader::new(ChunkedReader::new(&[b"ls caf\xc3", b"\xa9\n"]), 64);
        assert_eq!(read_all(&mut reader).await, vec!["ls café"]);
    }
}
