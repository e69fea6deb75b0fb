//! SMTP transport: connection establishment with port fallback, line
//! deframing, reply assembly, and in-place STARTTLS upgrade.
//!
//! Replies are accumulated by [`ReplyDecoder`], which owns the raw byte
//! buffer. The buffer survives the TLS upgrade: bytes read after the 220
//! to `STARTTLS` but before the handshake belong to the secured channel.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use native_tls::{HandshakeError, TlsConnector, TlsStream};

use crate::smtp::error::SmtpProbeError;
use crate::smtp::options::SmtpProbeOptions;

pub(crate) const IMPLICIT_TLS_PORT: u16 = 465;

/// A reply longer than this is a protocol violation and aborts the session.
const MAX_REPLY_BYTES: usize = 8 * 1024;

/// A logical SMTP reply: one shared 3-digit code, one text line per
/// continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// Capability advertised on any line of an EHLO reply.
    pub fn has_capability(&self, cap: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .map(|token| token.eq_ignore_ascii_case(cap))
                .unwrap_or(false)
        })
    }

    /// The reply text with continuation lines joined, used for catch-all
    /// text comparison.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

struct ParsedLine {
    code: u16,
    is_final: bool,
    text: String,
}

fn parse_reply_line(line: &str) -> Result<ParsedLine, SmtpProbeError> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(SmtpProbeError::protocol(format!(
            "invalid reply line: {line:?}"
        )));
    }
    let code = line[..3]
        .parse::<u16>()
        .map_err(|_| SmtpProbeError::protocol(format!("invalid code in line: {line:?}")))?;
    if !(100..=599).contains(&code) {
        return Err(SmtpProbeError::protocol(format!(
            "reply code {code} out of range"
        )));
    }
    let is_final = bytes.get(3) != Some(&b'-');
    let text = if line.len() > 4 {
        line[4..].to_string()
    } else {
        String::new()
    };
    Ok(ParsedLine {
        code,
        is_final,
        text,
    })
}

fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.iter().position(|byte| *byte == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
    if line.ends_with(b"\r\n") {
        line.truncate(line.len() - 2);
    } else if line.ends_with(b"\n") {
        line.truncate(line.len() - 1);
    }
    Some(line)
}

/// Accumulates raw bytes and emits completed replies. Feeding the same
/// byte stream in any chunking yields the same sequence of replies.
#[derive(Debug, Default)]
pub(crate) struct ReplyDecoder {
    buffer: Vec<u8>,
    code: Option<u16>,
    lines: Vec<String>,
    accumulated: usize,
}

impl ReplyDecoder {
    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub(crate) fn decode(&mut self) -> Result<Option<SmtpReply>, SmtpProbeError> {
        while let Some(raw) = take_line(&mut self.buffer) {
            let line = String::from_utf8(raw)
                .map_err(|err| SmtpProbeError::protocol(format!("reply is not UTF-8: {err}")))?;
            self.accumulated += line.len();
            if self.accumulated > MAX_REPLY_BYTES {
                return Err(SmtpProbeError::protocol("reply exceeds 8 KiB"));
            }
            let parsed = parse_reply_line(&line)?;
            match self.code {
                Some(code) if code != parsed.code => {
                    return Err(SmtpProbeError::protocol(format!(
                        "inconsistent reply codes: {code} vs {}",
                        parsed.code
                    )));
                }
                None => self.code = Some(parsed.code),
                _ => {}
            }
            self.lines.push(parsed.text);
            if parsed.is_final {
                let reply = SmtpReply {
                    code: self.code.take().unwrap_or(0),
                    lines: std::mem::take(&mut self.lines),
                };
                self.accumulated = 0;
                return Ok(Some(reply));
            }
        }
        if self.accumulated + self.buffer.len() > MAX_REPLY_BYTES {
            return Err(SmtpProbeError::protocol("reply exceeds 8 KiB"));
        }
        Ok(None)
    }
}

#[derive(Debug)]
enum StreamState {
    Plain(TcpStream),
    Tls(TlsStream<TcpStream>),
    Invalid,
}

#[derive(Debug)]
pub(crate) struct SmtpStream {
    state: StreamState,
    decoder: ReplyDecoder,
}

impl SmtpStream {
    fn connect_addr(
        addr: &SocketAddr,
        options: &SmtpProbeOptions,
    ) -> Result<Self, SmtpProbeError> {
        let stream = TcpStream::connect_timeout(addr, options.connect_timeout).map_err(|err| {
            SmtpProbeError::Connect {
                host: addr.to_string(),
                source: err,
            }
        })?;
        stream
            .set_read_timeout(Some(options.command_timeout))
            .map_err(SmtpProbeError::io)?;
        stream
            .set_write_timeout(Some(options.command_timeout))
            .map_err(SmtpProbeError::io)?;
        Ok(Self {
            state: StreamState::Plain(stream),
            decoder: ReplyDecoder::default(),
        })
    }

    pub(crate) fn is_secure(&self) -> bool {
        matches!(self.state, StreamState::Tls(_))
    }

    /// Wrap the socket in a TLS client handshake. The decoder buffer is
    /// preserved: whatever was read pre-handshake still parses afterwards.
    pub(crate) fn upgrade_tls(
        &mut self,
        host: &str,
        connector: &TlsConnector,
    ) -> Result<(), SmtpProbeError> {
        let mut state = StreamState::Invalid;
        std::mem::swap(&mut self.state, &mut state);
        let plain = match state {
            StreamState::Plain(stream) => stream,
            StreamState::Tls(stream) => {
                self.state = StreamState::Tls(stream);
                return Ok(());
            }
            StreamState::Invalid => {
                return Err(SmtpProbeError::protocol("invalid stream state"));
            }
        };
        let tls = complete_handshake(connector, host, plain)?;
        self.state = StreamState::Tls(tls);
        Ok(())
    }

    pub(crate) fn send_command(&mut self, command: &str) -> Result<(), SmtpProbeError> {
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.write_all(&data)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), SmtpProbeError> {
        match &mut self.state {
            StreamState::Plain(stream) => {
                stream.write_all(data).map_err(SmtpProbeError::io)?;
                stream.flush().map_err(SmtpProbeError::io)
            }
            StreamState::Tls(stream) => {
                stream.write_all(data).map_err(SmtpProbeError::io)?;
                stream.flush().map_err(SmtpProbeError::io)
            }
            StreamState::Invalid => Err(SmtpProbeError::protocol("invalid stream state")),
        }
    }

    pub(crate) fn read_reply(&mut self) -> Result<SmtpReply, SmtpProbeError> {
        loop {
            if let Some(reply) = self.decoder.decode()? {
                return Ok(reply);
            }
            let mut buf = [0u8; 512];
            let read = match &mut self.state {
                StreamState::Plain(stream) => stream.read(&mut buf),
                StreamState::Tls(stream) => stream.read(&mut buf),
                StreamState::Invalid => {
                    return Err(SmtpProbeError::protocol("invalid stream state"));
                }
            };
            let read = read.map_err(SmtpProbeError::io)?;
            if read == 0 {
                return Err(SmtpProbeError::io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.decoder.feed(&buf[..read]);
        }
    }
}

fn complete_handshake(
    connector: &TlsConnector,
    host: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, SmtpProbeError> {
    let failure = |source| SmtpProbeError::Tls {
        host: host.to_string(),
        source,
    };
    match connector.connect(host, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(err)) => Err(failure(err)),
        Err(HandshakeError::WouldBlock(mut mid)) => loop {
            match mid.handshake() {
                Ok(tls) => break Ok(tls),
                Err(HandshakeError::Failure(err)) => break Err(failure(err)),
                Err(HandshakeError::WouldBlock(next)) => mid = next,
            }
        },
    }
}

/// One probe conversation with one MX host. Owned by a single probe call;
/// the socket is closed on drop, on every exit path.
pub(crate) struct SmtpSession {
    host: String,
    stream: SmtpStream,
}

impl SmtpSession {
    /// Try each submission port in order; the first connect that succeeds
    /// wins. Port 465 starts with TLS from byte zero.
    pub(crate) fn connect(
        host: &str,
        options: &SmtpProbeOptions,
        connector: &TlsConnector,
    ) -> Result<Self, SmtpProbeError> {
        let mut last_err = None;
        for port in &options.ports {
            match Self::connect_port(host, *port, options, connector) {
                Ok(session) => {
                    tracing::debug!(%host, port, secure = session.is_secure(), "connected");
                    return Ok(session);
                }
                Err(err) => {
                    tracing::debug!(%host, port, %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(SmtpProbeError::NoReachablePort {
            host: host.to_string(),
        }))
    }

    fn connect_port(
        host: &str,
        port: u16,
        options: &SmtpProbeOptions,
        connector: &TlsConnector,
    ) -> Result<Self, SmtpProbeError> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(SmtpProbeError::io)?
            .collect();
        let mut last_err = None;
        for addr in &addrs {
            match SmtpStream::connect_addr(addr, options) {
                Ok(mut stream) => {
                    if port == IMPLICIT_TLS_PORT {
                        if let Err(err) = stream.upgrade_tls(host, connector) {
                            last_err = Some(err);
                            continue;
                        }
                    }
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or(SmtpProbeError::NoReachablePort {
            host: host.to_string(),
        }))
    }

    pub(crate) fn is_secure(&self) -> bool {
        self.stream.is_secure()
    }

    pub(crate) fn read_banner(&mut self) -> Result<SmtpReply, SmtpProbeError> {
        let reply = self.stream.read_reply()?;
        self.trace_reply(&reply);
        Ok(reply)
    }

    pub(crate) fn send_command(&mut self, command: &str) -> Result<SmtpReply, SmtpProbeError> {
        tracing::debug!(host = %self.host, %command, "C");
        self.stream.send_command(command)?;
        let reply = self.stream.read_reply()?;
        self.trace_reply(&reply);
        Ok(reply)
    }

    /// Send `STARTTLS` and upgrade on a 220. A refusal keeps the session in
    /// cleartext and is not an error; a failed handshake is.
    pub(crate) fn starttls(&mut self, connector: &TlsConnector) -> Result<bool, SmtpProbeError> {
        let reply = self.send_command("STARTTLS")?;
        if reply.code != 220 {
            tracing::debug!(host = %self.host, code = reply.code, "STARTTLS declined, continuing in cleartext");
            return Ok(false);
        }
        let host = self.host.clone();
        self.stream.upgrade_tls(&host, connector)?;
        Ok(true)
    }

    /// Best-effort QUIT; all errors are swallowed. The socket itself closes
    /// when the session drops.
    pub(crate) fn quit(&mut self) {
        tracing::debug!(host = %self.host, command = "QUIT", "C");
        if self.stream.send_command("QUIT").is_ok() {
            let _ = self.stream.read_reply();
        }
    }

    fn trace_reply(&self, reply: &SmtpReply) {
        tracing::debug!(host = %self.host, code = reply.code, text = %reply.text(), "S");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(decoder: &mut ReplyDecoder) -> Vec<SmtpReply> {
        let mut replies = Vec::new();
        while let Some(reply) = decoder.decode().expect("valid stream") {
            replies.push(reply);
        }
        replies
    }

    #[test]
    fn parses_single_line_reply() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"220 mx.example.com ESMTP ready\r\n");
        let replies = decode_all(&mut decoder);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].code, 220);
        assert_eq!(replies[0].lines, vec!["mx.example.com ESMTP ready"]);
    }

    #[test]
    fn parses_multi_line_reply_with_shared_code() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"250-mx.example.com\r\n250-SIZE 35882577\r\n250-STARTTLS\r\n250 HELP\r\n");
        let replies = decode_all(&mut decoder);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].code, 250);
        assert_eq!(replies[0].lines.len(), 4);
        assert!(replies[0].has_capability("STARTTLS"));
        assert!(replies[0].has_capability("starttls"));
        assert!(!replies[0].has_capability("PIPELINING"));
    }

    #[test]
    fn reply_split_across_chunks_still_parses() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"220 mx.exa");
        assert!(decoder.decode().expect("incomplete is fine").is_none());
        decoder.feed(b"mple.com ESMTP\r\n");
        let replies = decode_all(&mut decoder);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].code, 220);
    }

    #[test]
    fn bare_code_line_is_a_final_line() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"250\r\n");
        let replies = decode_all(&mut decoder);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].lines, vec![String::new()]);
    }

    #[test]
    fn inconsistent_codes_are_a_violation() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"250-first\r\n550 second\r\n");
        assert!(decoder.decode().is_err());
    }

    #[test]
    fn non_digit_prefix_is_a_violation() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"hello there\r\n");
        assert!(decoder.decode().is_err());
    }

    #[test]
    fn out_of_range_code_is_a_violation() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"999 nope\r\n");
        assert!(decoder.decode().is_err());
    }

    #[test]
    fn oversized_reply_is_a_violation() {
        let mut decoder = ReplyDecoder::default();
        let line = format!("250-{}\r\n", "x".repeat(1000));
        for _ in 0..9 {
            decoder.feed(line.as_bytes());
        }
        assert!(decoder.decode().is_err());
    }

    #[test]
    fn unterminated_oversized_buffer_is_a_violation() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(&[b'2'; MAX_REPLY_BYTES + 1]);
        assert!(decoder.decode().is_err());
    }

    #[test]
    fn lone_newline_terminator_is_tolerated() {
        let mut decoder = ReplyDecoder::default();
        decoder.feed(b"220 greetings\n");
        let replies = decode_all(&mut decoder);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].lines, vec!["greetings"]);
    }

    const STREAM: &[u8] = b"220 mx.example.com ESMTP\r\n250-SIZE 35882577\r\n250-STARTTLS\r\n250 HELP\r\n550 no such user here\r\n";

    fn parse_in_chunks(stream: &[u8], cuts: &[usize]) -> Vec<SmtpReply> {
        let mut decoder = ReplyDecoder::default();
        let mut replies = Vec::new();
        let mut start = 0;
        for cut in cuts.iter().chain(std::iter::once(&stream.len())) {
            decoder.feed(&stream[start..*cut]);
            replies.extend(decode_all(&mut decoder));
            start = *cut;
        }
        replies
    }

    proptest! {
        #[test]
        fn chunking_never_changes_the_parse(
            mut cuts in proptest::collection::vec(0..STREAM.len(), 0..8)
        ) {
            cuts.sort_unstable();
            cuts.dedup();
            let chunked = parse_in_chunks(STREAM, &cuts);
            let whole = parse_in_chunks(STREAM, &[]);
            prop_assert_eq!(chunked, whole);
        }
    }
}
