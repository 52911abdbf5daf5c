use crate::{RangefinderConfig, Result};

/// A serial device visible to a backend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PortInfo {
    pub name: String,
    pub driver: String,
}

/// A minimal blocking line-oriented link to one sensor.
pub trait Link {
    /// Open `port` with the line settings in `config`.
    fn open(port: &str, config: &RangefinderConfig) -> Result<Self>
    where
        Self: Sized;

    /// Attempt to list ports this backend could open.
    fn list() -> Result<Vec<PortInfo>>;

    /// Name of the port this link was opened on.
    fn port(&self) -> &str;

    /// Discard bytes received but not yet read.
    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }

    /// Send one command line; the terminator is added by the link.
    fn send(&mut self, line: &str) -> Result<()>;

    /// Receive one reply line without its terminator. `None` waits forever.
    fn recv(&mut self, timeout_ms: Option<u64>) -> Result<String>;
}
