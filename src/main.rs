mod agent;
mod cli;
mod command;
mod config;
mod link;
mod output;
mod types;

use agent::Agent;
use anyhow::Result;
use config::Config;
use output::sysfs::SysfsOutput;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for human-readable logs
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or(
                EnvFilter::default()
                    .add_directive("debug".parse()?)
                    .add_directive("tungstenite=error".parse()?),
            ),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false).without_time()),
        )
        .init();

    info!("Service started");

    let config = Config::from(cli::parse());
    info!("Configuration loaded successfully");
    debug!("{:#?}", config);

    let output = SysfsOutput::new(config.output_pin);
    Agent::new(config, output).run().await
}
