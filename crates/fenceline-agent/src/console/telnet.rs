// Telnet connection setup and option-negotiation handling.
//
// Management cards speak mostly raw text over their telnet port, but
// many still open the conversation with a burst of IAC option
// negotiation (RFC 854). Every offered option is refused: WILL gets
// DONT, DO gets WONT, and the negotiation bytes are stripped from the
// stream so pattern matching only ever sees terminal text.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

use crate::console::expect::Session;
use crate::error::{Error, Result};

/// Default telnet port of the RSB management card.
pub const DEFAULT_PORT: u16 = 3172;

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const WONT: u8 = 252;
const DO: u8 = 253;
const DONT: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    /// Plain terminal data.
    Text,
    /// Saw an IAC, waiting for the command byte.
    Command,
    /// Saw IAC + negotiation verb, waiting for the option byte.
    Option,
    /// Inside an IAC SB ... IAC SE subnegotiation.
    Subnegotiation,
    /// Saw an IAC inside a subnegotiation.
    SubnegotiationCommand,
}

/// Stateful handler for telnet in-band negotiation.
///
/// Carries its state across chunk boundaries, so a negotiation sequence
/// split over two reads is still handled.
#[derive(Debug)]
pub struct NegotiationFilter {
    state: FilterState,
    /// The negotiation verb pending its option byte.
    verb: u8,
}

impl NegotiationFilter {
    pub fn new() -> Self {
        Self {
            state: FilterState::Text,
            verb: 0,
        }
    }

    /// Process `input`, returning the text bytes stripped of negotiation
    /// plus the refusal bytes owed to the server (WONT for every DO,
    /// DONT for every WILL).
    pub fn filter(&mut self, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut text = Vec::with_capacity(input.len());
        let mut replies = Vec::new();

        for &byte in input {
            match self.state {
                FilterState::Text => {
                    if byte == IAC {
                        self.state = FilterState::Command;
                    } else {
                        text.push(byte);
                    }
                }
                FilterState::Command => {
                    if matches!(byte, WILL | WONT | DO | DONT) {
                        self.verb = byte;
                        self.state = FilterState::Option;
                    } else if byte == SB {
                        self.state = FilterState::Subnegotiation;
                    } else if byte == IAC {
                        // Escaped 0xff data byte.
                        text.push(IAC);
                        self.state = FilterState::Text;
                    } else {
                        // Two-byte command (NOP, AYT, ...): swallow it.
                        self.state = FilterState::Text;
                    }
                }
                FilterState::Option => {
                    // Refuse every offered option; the session wants a
                    // plain byte pipe, not ECHO/SGA/terminal-type modes.
                    match self.verb {
                        WILL => replies.extend_from_slice(&[IAC, DONT, byte]),
                        DO => replies.extend_from_slice(&[IAC, WONT, byte]),
                        _ => {}
                    }
                    self.state = FilterState::Text;
                }
                FilterState::Subnegotiation => {
                    if byte == IAC {
                        self.state = FilterState::SubnegotiationCommand;
                    }
                }
                FilterState::SubnegotiationCommand => {
                    self.state = if byte == SE {
                        FilterState::Text
                    } else {
                        FilterState::Subnegotiation
                    };
                }
            }
        }

        (text, replies)
    }
}

impl Default for NegotiationFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Open a telnet session to `host:port`, bounded by `connect_timeout`.
pub async fn connect(host: &str, port: u16, connect_timeout: Duration) -> Result<Session> {
    let address = format!("{host}:{port}");
    debug!(%address, "connecting via telnet");

    let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(&address))
        .await
        .map_err(|_| Error::Timeout {
            seconds: connect_timeout.as_secs(),
            waiting_for: format!("TCP connection to {address}"),
        })?
        .map_err(|e| Error::Connection {
            reason: format!("{address}: {e}"),
        })?;

    let (read, write) = stream.into_split();
    Ok(Session::new(
        Box::new(read),
        Box::new(write),
        Some(NegotiationFilter::new()),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let mut filter = NegotiationFilter::new();
        let (text, replies) = filter.filter(b"Power Status : on");
        assert_eq!(text, b"Power Status : on");
        assert!(replies.is_empty());
    }

    #[test]
    fn offered_options_are_stripped_and_refused() {
        let mut filter = NegotiationFilter::new();
        // IAC DO ECHO, IAC WILL SGA surrounding real text
        let input = [255, 253, 1, b'o', b'k', 255, 251, 3];
        let (text, replies) = filter.filter(&input);
        assert_eq!(text, b"ok");
        // DO ECHO -> WONT ECHO, WILL SGA -> DONT SGA
        assert_eq!(replies, [IAC, WONT, 1, IAC, DONT, 3]);
    }

    #[test]
    fn wont_and_dont_need_no_reply() {
        let mut filter = NegotiationFilter::new();
        // IAC WONT ECHO, IAC DONT SGA
        let (text, replies) = filter.filter(&[255, 252, 1, 255, 254, 3]);
        assert!(text.is_empty());
        assert!(replies.is_empty());
    }

    #[test]
    fn sequence_split_across_chunks_is_still_handled() {
        let mut filter = NegotiationFilter::new();
        let (text, replies) = filter.filter(&[b'a', 255]);
        assert_eq!(text, b"a");
        assert!(replies.is_empty());

        let (text, replies) = filter.filter(&[253]);
        assert!(text.is_empty());
        assert!(replies.is_empty());

        // The option byte lands in a third chunk; the refusal still
        // names the right option.
        let (text, replies) = filter.filter(&[1, b'b']);
        assert_eq!(text, b"b");
        assert_eq!(replies, [IAC, WONT, 1]);
    }

    #[test]
    fn subnegotiation_block_is_stripped() {
        let mut filter = NegotiationFilter::new();
        // IAC SB TERMINAL-TYPE ... IAC SE
        let input = [b'x', 255, 250, 24, 1, 255, 240, b'y'];
        let (text, replies) = filter.filter(&input);
        assert_eq!(text, b"xy");
        assert!(replies.is_empty());
    }

    #[test]
    fn escaped_iac_byte_is_kept() {
        let mut filter = NegotiationFilter::new();
        let (text, replies) = filter.filter(&[255, 255]);
        assert_eq!(text, vec![255]);
        assert!(replies.is_empty());
    }
}
