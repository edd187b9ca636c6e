//! Linux sysfs GPIO backend for the light output.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use super::{DigitalOutput, OutputError};

const GPIO_ROOT: &str = "/sys/class/gpio";

/// A single GPIO line driven through the kernel sysfs interface
pub struct SysfsOutput {
    pin: u32,
    root: PathBuf,
}

impl SysfsOutput {
    pub fn new(pin: u32) -> Self {
        Self {
            pin,
            root: PathBuf::from(GPIO_ROOT),
        }
    }

    #[cfg(test)]
    fn with_root(pin: u32, root: PathBuf) -> Self {
        Self { pin, root }
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }
}

#[async_trait]
impl DigitalOutput for SysfsOutput {
    async fn configure_output(&mut self) -> Result<(), OutputError> {
        // Exporting an already-exported pin fails with EBUSY, which is fine
        // as long as we can still set the direction below.
        match fs::write(self.root.join("export"), self.pin.to_string()).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::ResourceBusy => {
                debug!(pin = self.pin, "pin already exported");
            }
            Err(e) => return Err(OutputError::Configure(e)),
        }

        fs::write(self.pin_dir().join("direction"), "out")
            .await
            .map_err(OutputError::Configure)?;

        debug!(pin = self.pin, "configured as output");
        Ok(())
    }

    async fn write(&mut self, level: bool) -> Result<(), OutputError> {
        let value = if level { "1" } else { "0" };
        fs::write(self.pin_dir().join("value"), value)
            .await
            .map_err(OutputError::Write)?;

        debug!(pin = self.pin, value, "wrote output level");
        Ok(())
    }

    async fn release_all(&mut self) -> Result<(), OutputError> {
        fs::write(self.root.join("unexport"), self.pin.to_string())
            .await
            .map_err(OutputError::Release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::{tempdir, TempDir};

    // Exercise the backend against a plain directory standing in for the
    // sysfs tree. The kernel normally creates gpioN/ in response to the
    // export write, here we pre-create it.
    async fn fake_gpio_tree(pin: u32) -> (TempDir, SysfsOutput) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(format!("gpio{pin}")))
            .await
            .unwrap();
        let output = SysfsOutput::with_root(pin, dir.path().to_path_buf());
        (dir, output)
    }

    #[tokio::test]
    async fn configure_exports_pin_and_sets_direction() {
        let (dir, mut output) = fake_gpio_tree(11).await;

        output.configure_output().await.unwrap();

        let exported = fs::read_to_string(dir.path().join("export")).await.unwrap();
        assert_eq!(exported, "11");
        let direction = fs::read_to_string(dir.path().join("gpio11/direction"))
            .await
            .unwrap();
        assert_eq!(direction, "out");
    }

    #[tokio::test]
    async fn write_sets_value_file() {
        let (dir, mut output) = fake_gpio_tree(11).await;
        output.configure_output().await.unwrap();

        output.write(true).await.unwrap();
        let value = fs::read_to_string(dir.path().join("gpio11/value"))
            .await
            .unwrap();
        assert_eq!(value, "1");

        output.write(false).await.unwrap();
        let value = fs::read_to_string(dir.path().join("gpio11/value"))
            .await
            .unwrap();
        assert_eq!(value, "0");
    }

    #[tokio::test]
    async fn configure_fails_without_gpio_tree() {
        let mut output = SysfsOutput::with_root(7, PathBuf::from("/nonexistent/gpio"));
        let err = output.configure_output().await.unwrap_err();
        assert!(matches!(err, OutputError::Configure(_)));
    }
}
