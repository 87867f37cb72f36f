//! Telnet framing
//!
//! Splits the inbound byte stream into response lines and option
//! negotiation requests, and writes commands and negotiation replies back.
//! Only the NVT subset a line-oriented device needs is handled:
//! subnegotiations and two-byte commands are dropped, `IAC IAC` unescapes
//! to a data byte. A line ends at `LF`, `CR LF` or `CR NUL`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{Result, TransportError};

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

/// Longest response line (or pending subnegotiation) accepted before the
/// stream is considered broken
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Option negotiation verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Will,
    Wont,
    Do,
    Dont,
}

impl Verb {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            WILL => Some(Verb::Will),
            WONT => Some(Verb::Wont),
            DO => Some(Verb::Do),
            DONT => Some(Verb::Dont),
            _ => None,
        }
    }

    fn as_byte(&self) -> u8 {
        match self {
            Verb::Will => WILL,
            Verb::Wont => WONT,
            Verb::Do => DO,
            Verb::Dont => DONT,
        }
    }

    /// The reply that declines a request, if the verb is a request at all
    pub fn refusal(&self) -> Option<Verb> {
        match self {
            Verb::Do => Some(Verb::Wont),
            Verb::Will => Some(Verb::Dont),
            Verb::Wont | Verb::Dont => None,
        }
    }
}

/// A unit of telnet traffic, in either direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetFrame {
    /// A text line; inbound lines are trimmed, outbound lines get `\r\n`
    Line(String),

    /// `IAC <verb> <option>`
    Negotiate { verb: Verb, option: u8 },
}

/// Codec for [`TelnetFrame`]s over a raw byte stream
#[derive(Debug)]
pub struct TelnetCodec {
    line: Vec<u8>,
    // A CR was the last data byte; an LF or NUL after it ends the line
    after_cr: bool,
    max_line_length: usize,
}

impl TelnetCodec {
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            line: Vec::new(),
            after_cr: false,
            max_line_length,
        }
    }

    fn push(&mut self, byte: u8) -> Result<()> {
        if self.line.len() >= self.max_line_length {
            self.line.clear();
            return Err(TransportError::LineTooLong {
                max: self.max_line_length,
            });
        }
        self.line.push(byte);
        Ok(())
    }

    fn take_line(&mut self) -> TelnetFrame {
        let raw = std::mem::take(&mut self.line);
        TelnetFrame::Line(String::from_utf8_lossy(&raw).trim().to_string())
    }

    /// Finds the end of the subnegotiation at the start of `src`
    ///
    /// Returns the length up to and including `IAC SE`, or `None` while it is
    /// still incomplete. Escaped `IAC IAC` pairs inside the payload are data.
    fn subnegotiation_len(&self, src: &[u8]) -> Result<Option<usize>> {
        let mut i = 2;
        while i < src.len() {
            if src[i] != IAC {
                i += 1;
                continue;
            }
            match src.get(i + 1) {
                Some(&SE) => return Ok(Some(i + 2)),
                Some(_) => i += 2,
                None => break,
            }
        }

        if src.len() > self.max_line_length {
            return Err(TransportError::SubnegotiationTooLong {
                max: self.max_line_length,
            });
        }
        Ok(None)
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetFrame;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetFrame>> {
        while let Some(&byte) = src.first() {
            if byte != IAC {
                src.advance(1);
                let after_cr = std::mem::replace(&mut self.after_cr, byte == b'\r');
                match byte {
                    b'\n' => return Ok(Some(self.take_line())),
                    0 if after_cr => return Ok(Some(self.take_line())),
                    b'\r' | 0 => {}
                    _ => self.push(byte)?,
                }
                continue;
            }

            let Some(&command) = src.get(1) else {
                return Ok(None);
            };

            match command {
                IAC => {
                    src.advance(2);
                    self.after_cr = false;
                    self.push(IAC)?;
                }
                SB => match self.subnegotiation_len(src)? {
                    Some(len) => src.advance(len),
                    None => return Ok(None),
                },
                _ => match Verb::from_byte(command) {
                    Some(verb) => {
                        let Some(&option) = src.get(2) else {
                            return Ok(None);
                        };
                        src.advance(3);
                        return Ok(Some(TelnetFrame::Negotiate { verb, option }));
                    }
                    // NOP, GA, AYT and friends carry nothing for us
                    None => src.advance(2),
                },
            }
        }

        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<TelnetFrame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                // Unterminated line or truncated command: nothing usable left
                src.clear();
                self.line.clear();
                self.after_cr = false;
                Ok(None)
            }
        }
    }
}

impl Encoder<TelnetFrame> for TelnetCodec {
    type Error = TransportError;

    fn encode(&mut self, frame: TelnetFrame, dst: &mut BytesMut) -> Result<()> {
        match frame {
            TelnetFrame::Line(text) => {
                dst.reserve(text.len() + 2);
                dst.put_slice(text.as_bytes());
                dst.put_slice(b"\r\n");
            }
            TelnetFrame::Negotiate { verb, option } => {
                dst.put_slice(&[IAC, verb.as_byte(), option]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECHO: u8 = 1;
    const SUPPRESS_GO_AHEAD: u8 = 3;
    const TERMINAL_TYPE: u8 = 24;
    const NOP: u8 = 241;

    fn line(text: &str) -> Option<TelnetFrame> {
        Some(TelnetFrame::Line(text.to_string()))
    }

    #[test]
    fn test_decode_lines() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&b"P1=1.013 bar\r\n  P2=0.998  \r\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), line("P1=1.013 bar"));
        assert_eq!(codec.decode(&mut buf).unwrap(), line("P2=0.998"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_waits_for_line_end() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&b"ALLR 12"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b".5\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), line("ALLR 12.5"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_cr_nul_ends_line() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&b"P1=1.013\r\0P2=0.998\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), line("P1=1.013"));
        assert_eq!(codec.decode(&mut buf).unwrap(), line("P2=0.998"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_cr_nul_split_across_reads() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&b"P1=1.013\r"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"\0");
        assert_eq!(codec.decode(&mut buf).unwrap(), line("P1=1.013"));
    }

    #[test]
    fn test_decode_bare_cr_and_nul_are_dropped() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&b"A\rB\0C\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), line("ABC"));
    }

    #[test]
    fn test_decode_negotiation_before_line() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[IAC, DO, TERMINAL_TYPE, IAC, WILL, ECHO]);
        buf.extend_from_slice(b"OK\r\n");

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TelnetFrame::Negotiate {
                verb: Verb::Do,
                option: TERMINAL_TYPE
            })
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TelnetFrame::Negotiate {
                verb: Verb::Will,
                option: ECHO
            })
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), line("OK"));
    }

    #[test]
    fn test_decode_split_command() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&[IAC][..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 1);

        buf.extend_from_slice(&[WONT]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&[SUPPRESS_GO_AHEAD]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(TelnetFrame::Negotiate {
                verb: Verb::Wont,
                option: SUPPRESS_GO_AHEAD
            })
        );
    }

    #[test]
    fn test_decode_skips_subnegotiation_and_nop() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"A");
        buf.extend_from_slice(&[IAC, SB, TERMINAL_TYPE, 1]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&[IAC, SE, IAC, NOP]);
        buf.extend_from_slice(b"B\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), line("AB"));
    }

    #[test]
    fn test_decode_subnegotiation_with_escaped_iac() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[IAC, SB, TERMINAL_TYPE, IAC, IAC, SE, 7, IAC, SE]);
        buf.extend_from_slice(b"OK\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), line("OK"));
    }

    #[test]
    fn test_decode_unterminated_subnegotiation_is_bounded() {
        let mut codec = TelnetCodec::with_max_line_length(8);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[IAC, SB, TERMINAL_TYPE, 0, 1, 2]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(&[3, 4, 5, 6]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(TransportError::SubnegotiationTooLong { max: 8 })
        ));
    }

    #[test]
    fn test_decode_escaped_iac() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"x");
        buf.extend_from_slice(&[IAC, IAC]);
        buf.extend_from_slice(b"y\n");

        // A lone 0xFF is not UTF-8 and comes out as the replacement character
        assert_eq!(codec.decode(&mut buf).unwrap(), line("x\u{FFFD}y"));
    }

    #[test]
    fn test_decode_line_too_long() {
        let mut codec = TelnetCodec::with_max_line_length(4);
        let mut buf = BytesMut::from(&b"12345\n"[..]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(TransportError::LineTooLong { max: 4 })
        ));
    }

    #[test]
    fn test_decode_eof_discards_partial_line() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::from(&b"done\npartial"[..]);

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), line("done"));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(TelnetFrame::Line("ALLR".to_string()), &mut buf)
            .unwrap();
        codec
            .encode(
                TelnetFrame::Negotiate {
                    verb: Verb::Wont,
                    option: ECHO,
                },
                &mut buf,
            )
            .unwrap();

        assert_eq!(&buf[..], &[b'A', b'L', b'L', b'R', b'\r', b'\n', IAC, WONT, ECHO]);
    }

    #[test]
    fn test_refusals() {
        assert_eq!(Verb::Do.refusal(), Some(Verb::Wont));
        assert_eq!(Verb::Will.refusal(), Some(Verb::Dont));
        assert_eq!(Verb::Dont.refusal(), None);
        assert_eq!(Verb::Wont.refusal(), None);
    }
}
