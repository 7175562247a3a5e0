//! Half-duplex request/response transport.
//!
//! Every logical operation on the scope is one command write followed by at
//! most one read. Replies come back in two framings that share a
//! termination marker: formatted ASCII (queries like `SAST?`) and raw
//! binary blocks (`WF?` transfers).

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::Result;

/// Termination byte for instrument replies, ASCII and binary alike.
const TERMINATOR: u8 = b'\n';

/// Request/response I/O as the instrument sees it.
///
/// Implementations are blocking and half-duplex; the driver assumes it is
/// the only writer for the duration of each logical operation.
pub trait Transport {
    /// Send one command, without its termination character.
    fn write_command(&mut self, command: &str) -> Result<()>;

    /// Read raw bytes up to (not including) the termination marker.
    fn read_terminated_bytes(&mut self) -> Result<Vec<u8>>;

    /// Read an ASCII reply and strip framing whitespace.
    fn read_formatted_string(&mut self) -> Result<String> {
        let raw = self.read_terminated_bytes()?;
        let reply = String::from_utf8(raw)?;
        Ok(reply.trim().to_string())
    }
}

/// Serial-port transport for a directly attached scope.
pub struct SerialTransport {
    serial: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open the given port and clear any stale buffered traffic.
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let serial = serialport::new(port, baud_rate)
            .timeout(Duration::from_millis(500))
            .open()?;

        let mut transport = Self { serial };
        transport.drain()?;
        Ok(transport)
    }

    /// Discard anything sitting in the OS buffers.
    fn drain(&mut self) -> Result<()> {
        self.serial.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }
}

impl Transport for SerialTransport {
    fn write_command(&mut self, command: &str) -> Result<()> {
        log::trace!("-> {command}");
        self.serial.write_all(command.as_bytes())?;
        self.serial.write_all(&[TERMINATOR])?;
        Ok(())
    }

    fn read_terminated_bytes(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            self.serial.read_exact(&mut byte)?;
            if byte[0] == TERMINATOR {
                break;
            }
            response.push(byte[0]);
        }
        log::trace!("<- {} bytes", response.len());
        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted transport double: a queue of expected command/reply
    //! exchanges, asserted in order as the code under test runs.

    use std::collections::VecDeque;

    use super::Transport;
    use crate::error::Result;

    #[derive(Debug)]
    struct Exchange {
        command: String,
        reply: Option<Vec<u8>>,
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeTransport {
        script: VecDeque<Exchange>,
        pending: Option<Vec<u8>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Expect a query and replay an ASCII reply.
        pub fn expect(mut self, command: &str, reply: &str) -> Self {
            self.script.push_back(Exchange {
                command: command.to_string(),
                reply: Some(reply.as_bytes().to_vec()),
            });
            self
        }

        /// Expect a query and replay a raw binary reply.
        pub fn expect_raw(mut self, command: &str, reply: Vec<u8>) -> Self {
            self.script.push_back(Exchange {
                command: command.to_string(),
                reply: Some(reply),
            });
            self
        }

        /// Expect a set command that produces no reply.
        pub fn expect_write(mut self, command: &str) -> Self {
            self.script.push_back(Exchange {
                command: command.to_string(),
                reply: None,
            });
            self
        }

        /// Assert that the whole script was consumed.
        pub fn finish(self) {
            assert!(
                self.script.is_empty(),
                "unconsumed exchanges: {:?}",
                self.script
            );
        }
    }

    impl Transport for FakeTransport {
        fn write_command(&mut self, command: &str) -> Result<()> {
            let exchange = self
                .script
                .pop_front()
                .expect("command sent past the end of the script");
            assert_eq!(command, exchange.command, "command out of order");
            self.pending = exchange.reply;
            Ok(())
        }

        fn read_terminated_bytes(&mut self) -> Result<Vec<u8>> {
            Ok(self.pending.take().expect("read with no scripted reply"))
        }
    }
}
