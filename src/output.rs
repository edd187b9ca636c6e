//! Output controller. Owns the single binary light output and the last
//! confirmed state of the underlying hardware pin.

pub mod sysfs;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to configure output pin: {0}")]
    Configure(#[source] std::io::Error),

    #[error("failed to write output pin: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to release output pin: {0}")]
    Release(#[source] std::io::Error),
}

/// A single digital output line with asynchronous completion
///
/// All operations return only once the hardware has confirmed (or rejected)
/// the request.
#[async_trait]
pub trait DigitalOutput: Send {
    async fn configure_output(&mut self) -> Result<(), OutputError>;
    async fn write(&mut self, level: bool) -> Result<(), OutputError>;
    async fn release_all(&mut self) -> Result<(), OutputError>;
}

/// Drives the light output and tracks its confirmed state
///
/// The state field always holds the last *successfully applied* write; it is
/// never updated optimistically, and is `None` until the device is set up.
pub struct OutputController<D> {
    device: D,
    state: Option<bool>,
}

impl<D: DigitalOutput> OutputController<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            state: None,
        }
    }

    /// Configures the output device for writing
    ///
    /// A configuration failure is fatal, there is no recovery path without
    /// working hardware. The output defaults to off after a successful setup.
    pub async fn setup(&mut self) -> Result<(), OutputError> {
        self.device.configure_output().await?;
        self.state = Some(false);
        debug!("output pin configured");
        Ok(())
    }

    /// Writes `value` to the output and waits for confirmation
    ///
    /// On success the confirmed state is recorded and returned so the caller
    /// can report it. A write error leaves the recorded state untouched and
    /// propagates; the hardware is in an unknown condition at that point.
    pub async fn set_state(&mut self, value: bool) -> Result<bool, OutputError> {
        self.device.write(value).await?;
        self.state = Some(value);
        info!(value, "output state applied");
        Ok(value)
    }

    /// Last successfully applied output state, if any
    pub fn state(&self) -> Option<bool> {
        self.state
    }

    /// Releases all claimed hardware resources
    ///
    /// Must run before process exit.
    pub async fn teardown(&mut self) -> Result<(), OutputError> {
        self.device.release_all().await?;
        info!("output pin released");
        Ok(())
    }
}
