//! Serial port links for the console and both radios

use std::io::{self, Read, Write};
use std::time::Duration;

use link_mux::{ConsoleSource, LinkError, RadioLink};
use serialport::SerialPort;
use tracing::{debug, trace};

use crate::settings::PortSettings;

/// Console poll wait; a read that times out counts as "nothing available"
const CONSOLE_POLL: Duration = Duration::from_millis(10);

fn open(settings: &PortSettings, timeout: Duration) -> Result<Box<dyn SerialPort>, serialport::Error> {
    debug!("Opening {} at {} baud", settings.port, settings.baud_rate);
    serialport::new(&settings.port, settings.baud_rate)
        .timeout(timeout)
        .open()
}

fn is_idle(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// Console link over a serial port
pub struct SerialConsole {
    port: Box<dyn SerialPort>,
}

impl SerialConsole {
    /// Open the console port
    pub fn open(settings: &PortSettings) -> Result<Self, serialport::Error> {
        Ok(Self {
            port: open(settings, CONSOLE_POLL)?,
        })
    }
}

impl ConsoleSource for SerialConsole {
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if is_idle(&e) => Ok(None),
            Err(e) => Err(LinkError::Io(e)),
        }
    }
}

/// Port operations a radio link needs beyond `Read` and `Write`
pub trait RadioPort: Read + Write + Send {
    /// Change how long a read waits for data
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl RadioPort for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_timeout(timeout).map_err(io::Error::from)
    }
}

/// Radio link over a serial port
///
/// The port is a byte stream: a read returns whatever has arrived, which may
/// be part of a line or several lines. Framing is left to the router. Each
/// sent payload is terminated with `\n`.
pub struct SerialRadio<P = Box<dyn SerialPort>> {
    name: String,
    port: P,
    timeout: Duration,
}

impl SerialRadio {
    /// Open a radio port
    pub fn open(settings: &PortSettings) -> Result<Self, serialport::Error> {
        let timeout = Duration::from_millis(50);
        Ok(Self::with_port(
            settings.port.clone(),
            open(settings, timeout)?,
            timeout,
        ))
    }
}

impl<P: RadioPort> SerialRadio<P> {
    /// Wrap an open port whose read timeout is currently `timeout`
    pub fn with_port(name: String, port: P, timeout: Duration) -> Self {
        Self {
            name,
            port,
            timeout,
        }
    }
}

impl<P: RadioPort> RadioLink for SerialRadio<P> {
    fn send(&mut self, data: &[u8]) -> Result<(), LinkError> {
        trace!("{} TX {} bytes", self.name, data.len());
        let mut line = Vec::with_capacity(data.len() + 1);
        line.extend_from_slice(data);
        line.push(b'\n');
        self.port.write_all(&line)?;
        self.port.flush()?;
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError> {
        if timeout != self.timeout {
            self.port.set_read_timeout(timeout)?;
            self.timeout = timeout;
        }

        match self.port.read(buf) {
            Ok(n) => {
                if n > 0 {
                    trace!("{} RX {} bytes", self.name, n);
                }
                Ok(n)
            }
            Err(e) if is_idle(&e) => Ok(0),
            Err(e) => Err(LinkError::Io(e)),
        }
    }
}
