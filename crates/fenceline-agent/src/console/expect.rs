// Expect-style session driver: send text, block until one of a set of
// patterns matches the accumulated output, bounded by a deadline.
//
// The session owns the connection exclusively. Commands are strictly
// synchronous — every send is followed by exactly one expect before the
// next send — so the accumulated buffer always belongs to the response
// of the command most recently sent.

use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::time::Instant;
use tracing::{trace, warn};

use crate::console::telnet::NegotiationFilter;
use crate::error::{Error, Result};

/// One thing `expect` can wait for.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Plain substring match.
    Literal(String),
    /// Anchored or free regular expression match.
    Regex(Regex),
}

impl Pattern {
    /// Convenience constructor for substring patterns.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Byte range of the first match in `haystack`, if any.
    fn find(&self, haystack: &str) -> Option<(usize, usize)> {
        match self {
            Self::Literal(text) => haystack
                .find(text.as_str())
                .map(|start| (start, start + text.len())),
            Self::Regex(re) => re.find(haystack).map(|m| (m.start(), m.end())),
        }
    }

    /// Human-readable form for timeout diagnostics.
    fn describe(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Regex(re) => re.as_str().to_string(),
        }
    }
}

/// A persistent interactive conversation with the device.
///
/// Established once (connect + login) and torn down once (logout) per
/// invocation; in between, the fencing agent only issues send/expect
/// pairs through it.
pub struct Session {
    reader: Box<dyn AsyncRead + Unpin + Send>,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    /// Accumulated device output not yet consumed by a match.
    buffer: String,
    /// Output that preceded (and excluded) the last match.
    before: String,
    /// Telnet option-negotiation stripper; `None` on ssh sessions.
    filter: Option<NegotiationFilter>,
    /// Owning handle for a spawned ssh client, so the child outlives
    /// the pipes and gets reaped on close.
    child: Option<Child>,
}

impl Session {
    /// Wrap an established reader/writer pair.
    pub(crate) fn new(
        reader: Box<dyn AsyncRead + Unpin + Send>,
        writer: Box<dyn AsyncWrite + Unpin + Send>,
        filter: Option<NegotiationFilter>,
        child: Option<Child>,
    ) -> Self {
        Self {
            reader,
            writer,
            buffer: String::new(),
            before: String::new(),
            filter,
            child,
        }
    }

    /// Build a session over an arbitrary duplex stream, without telnet
    /// filtering. Intended for in-memory test peers.
    pub fn from_stream<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::new(Box::new(reader), Box::new(writer), None, None)
    }

    /// Send raw text (no line terminator). Menu-driven firmware reads
    /// single selection keys without a newline.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        trace!(?text, "send");
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send text followed by CRLF.
    pub async fn send_line(&mut self, text: &str) -> Result<()> {
        trace!(?text, "send line");
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Block until one of `patterns` matches the accumulated output or
    /// `timeout` elapses.
    ///
    /// On a match, returns the index of the matched pattern; the text
    /// preceding the match becomes [`before`](Self::before) and both it
    /// and the match are consumed, so successive expects never re-match
    /// old output. On timeout, fails with [`Error::Timeout`] — fatal by
    /// contract, the device is unresponsive.
    pub async fn expect(&mut self, patterns: &[Pattern], timeout: Duration) -> Result<usize> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 4096];

        loop {
            if let Some((idx, start, end)) = self.first_match(patterns) {
                trace!(pattern = idx, "matched");
                self.before = self.buffer[..start].to_string();
                self.buffer.drain(..end);
                return Ok(idx);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timeout_error(patterns, timeout));
            }

            let read = tokio::time::timeout(remaining, self.reader.read(&mut chunk)).await;
            match read {
                Err(_) => return Err(self.timeout_error(patterns, timeout)),
                Ok(Err(e)) => return Err(Error::Io(e)),
                Ok(Ok(0)) => {
                    warn!("session closed by device");
                    return Err(Error::Connection {
                        reason: "session closed by device".into(),
                    });
                }
                Ok(Ok(n)) => {
                    let bytes = match &mut self.filter {
                        Some(filter) => {
                            let (text, replies) = filter.filter(&chunk[..n]);
                            // Negotiation refusals go straight back out;
                            // the device may wait for them before
                            // sending anything further.
                            if !replies.is_empty() {
                                self.writer.write_all(&replies).await?;
                                self.writer.flush().await?;
                            }
                            text
                        }
                        None => chunk[..n].to_vec(),
                    };
                    self.buffer.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
        }
    }

    /// The buffered output that preceded the last match.
    pub fn before(&self) -> &str {
        &self.before
    }

    /// Tear the session down: close the write side and reap a spawned
    /// ssh child if one exists. Best-effort — called on every exit path.
    pub async fn close(mut self) {
        let _ = self.writer.shutdown().await;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
    }

    fn first_match(&self, patterns: &[Pattern]) -> Option<(usize, usize, usize)> {
        patterns
            .iter()
            .enumerate()
            .find_map(|(idx, p)| p.find(&self.buffer).map(|(s, e)| (idx, s, e)))
    }

    fn timeout_error(&self, patterns: &[Pattern], timeout: Duration) -> Error {
        let waiting_for = patterns
            .iter()
            .map(Pattern::describe)
            .collect::<Vec<_>>()
            .join(" | ");
        Error::Timeout {
            seconds: timeout.as_secs(),
            waiting_for,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    fn session_over_duplex() -> (Session, tokio::io::DuplexStream) {
        let (near, far) = duplex(4096);
        let (read, write) = tokio::io::split(near);
        (Session::from_stream(read, write), far)
    }

    #[tokio::test]
    async fn literal_match_consumes_through_the_match() {
        let (mut session, mut far) = session_over_duplex();
        far.write_all(b"banner text\r\nfence> ").await.unwrap();

        let idx = session
            .expect(&[Pattern::literal("fence> ")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(idx, 0);
        assert_eq!(session.before(), "banner text\r\n");
    }

    #[tokio::test]
    async fn regex_match_exposes_before_text() {
        let (mut session, mut far) = session_over_duplex();
        far.write_all(b"Power Status : on\r\nto quit:").await.unwrap();

        let prompt = Pattern::Regex(Regex::new("to quit:").unwrap());
        session.expect(&[prompt], Duration::from_secs(1)).await.unwrap();
        assert!(session.before().contains("Power Status : on"));
    }

    #[tokio::test]
    async fn alternatives_report_which_pattern_matched() {
        let (mut session, mut far) = session_over_duplex();
        far.write_all(b"... 'yes' or 'no' ...").await.unwrap();

        let idx = session
            .expect(
                &[
                    Pattern::literal("want to power off"),
                    Pattern::literal("'yes' or 'no'"),
                ],
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(idx, 1);
    }

    #[tokio::test]
    async fn consumed_output_is_never_rematched() {
        let (mut session, mut far) = session_over_duplex();
        far.write_all(b"first> ").await.unwrap();

        let prompt = [Pattern::literal("> ")];
        session.expect(&prompt, Duration::from_secs(1)).await.unwrap();
        assert_eq!(session.before(), "first");

        far.write_all(b"second> ").await.unwrap();
        session.expect(&prompt, Duration::from_secs(1)).await.unwrap();
        assert_eq!(session.before(), "second");
    }

    #[tokio::test]
    async fn timeout_surfaces_as_timeout_error() {
        let (mut session, _far) = session_over_duplex();

        let err = session
            .expect(&[Pattern::literal("never")], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn peer_close_surfaces_as_connection_error() {
        let (mut session, far) = session_over_duplex();
        drop(far);

        let err = session
            .expect(&[Pattern::literal("prompt")], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn telnet_negotiation_is_refused_during_expect() {
        let (near, mut far) = duplex(4096);
        let (read, write) = tokio::io::split(near);
        let mut session = Session::new(
            Box::new(read),
            Box::new(write),
            Some(NegotiationFilter::new()),
            None,
        );

        // IAC DO ECHO, IAC WILL SGA wrapped around the prompt text.
        far.write_all(&[255, 253, 1, b'o', b'k', 255, 251, 3])
            .await
            .unwrap();
        session
            .expect(&[Pattern::literal("ok")], Duration::from_secs(1))
            .await
            .unwrap();

        // The refusals were written back before the match returned.
        let mut received = [0u8; 16];
        let n = far.read(&mut received).await.unwrap();
        assert_eq!(&received[..n], &[255, 252, 1, 255, 254, 3]);
    }

    #[tokio::test]
    async fn send_line_appends_crlf() {
        let (mut session, mut far) = session_over_duplex();
        session.send_line("yes").await.unwrap();

        let mut received = [0u8; 16];
        let n = far.read(&mut received).await.unwrap();
        assert_eq!(&received[..n], b"yes\r\n");
    }
}
