use crate::cli::Cli;
use crate::types::DeviceIdentity;

#[derive(Clone, Debug)]
pub struct Config {
    /// WebSocket endpoint of the cloud message broker
    pub cloud_endpoint: String,

    /// Identity used to register on the cloud channel
    pub identity: DeviceIdentity,

    /// Physical pin number driving the light
    pub output_pin: u32,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            cloud_endpoint: cli.cloud_endpoint,
            identity: DeviceIdentity {
                device_id: cli.device_id.into(),
                token: cli.device_token.into(),
            },
            output_pin: cli.output_pin,
        }
    }
}
