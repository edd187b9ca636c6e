use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// WebSocket endpoint of the cloud message broker
    #[arg(
        env = "LUMEN_CLOUD_ENDPOINT",
        long = "cloud-endpoint",
        value_name = "uri",
        default_value = "wss://api.artik.cloud/v1.1/websocket?ack=true"
    )]
    pub cloud_endpoint: String,

    /// Unique identifier for this device
    #[arg(env = "LUMEN_DEVICE_ID", long = "device-id", value_name = "id")]
    pub device_id: String,

    /// Device token for authentication with the cloud
    #[arg(env = "LUMEN_DEVICE_TOKEN", long = "device-token", value_name = "token")]
    pub device_token: String,

    /// Physical pin number of the light output
    #[arg(
        env = "LUMEN_OUTPUT_PIN",
        long = "output-pin",
        value_name = "pin",
        default_value_t = 11
    )]
    pub output_pin: u32,
}

pub fn parse() -> Cli {
    Parser::parse()
}
