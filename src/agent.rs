//! Lifecycle manager. Sequences startup, runs the single-consumer event
//! loop and tears the output down on shutdown.

use anyhow::{Context, Result};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command;
use crate::config::Config;
use crate::link::{register, report, CloudChannel, LinkEvent};
use crate::output::{DigitalOutput, OutputController, OutputError};

/// The device agent
///
/// Owns the output controller and, while running, the cloud channel handle.
/// All work happens on one logical thread of control: channel events and the
/// termination signal are folded into a single loop, so messages are handled
/// one at a time in arrival order and the output state needs no locking.
pub struct Agent<D> {
    config: Config,
    controller: OutputController<D>,
}

impl<D: DigitalOutput> Agent<D> {
    pub fn new(config: Config, device: D) -> Self {
        Self {
            config,
            controller: OutputController::new(device),
        }
    }

    /// Runs the agent until the cloud channel closes, a termination signal
    /// arrives, or the hardware faults
    ///
    /// The output is torn down before returning in every case. Hardware
    /// faults are the only fatal errors; everything else ends the run
    /// cleanly.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for termination signal: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Like [`Agent::run`] with the termination trigger supplied by the
    /// caller
    async fn run_with_shutdown(mut self, shutdown: impl Future<Output = ()> + Send) -> Result<()> {
        // Connecting is backgrounded by the channel, so the output setup
        // below runs while the handshake is in flight.
        let (event_tx, events) = mpsc::unbounded_channel();
        let channel = CloudChannel::connect(&self.config.cloud_endpoint, event_tx);
        info!(endpoint = %self.config.cloud_endpoint, "opening cloud channel");

        if let Err(e) = self.controller.setup().await {
            // the pin may be half claimed, try to release it before failing
            if let Err(teardown_err) = self.controller.teardown().await {
                warn!("output teardown failed: {teardown_err}");
            }
            return Err(e).context("output setup failed");
        }

        info!("agent running");
        let outcome = self.event_loop(&channel, events, shutdown).await;

        info!(
            link = ?channel.state(),
            output = ?self.controller.state(),
            "agent terminating"
        );
        let teardown = self.controller.teardown().await;

        // a hardware fault from the loop takes precedence over one from
        // teardown
        outcome?;
        teardown.context("output teardown failed")?;

        info!("agent terminated");
        Ok(())
    }

    async fn event_loop(
        &mut self,
        channel: &CloudChannel,
        mut events: mpsc::UnboundedReceiver<LinkEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), OutputError> {
        // the termination listener must register once and stay armed while
        // an event handler runs; a request arriving mid-handler is picked up
        // on the next loop iteration
        tokio::pin!(shutdown);

        // set after the registration message goes out; observability only,
        // sends are not gated on it
        let mut registered = false;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("termination signal received");
                    return Ok(());
                }

                event = events.recv() => match event {
                    Some(LinkEvent::Opened) => {
                        registered = register::register(channel, &self.config.identity);
                    }

                    Some(LinkEvent::Message(raw)) => {
                        self.handle_message(channel, &raw).await?;
                    }

                    Some(LinkEvent::Closed) | None => {
                        info!(registered, "cloud channel closed");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles one inbound message; only hardware faults propagate
    async fn handle_message(
        &mut self,
        channel: &CloudChannel,
        raw: &str,
    ) -> Result<(), OutputError> {
        match command::decode(raw) {
            Ok(Some(target)) => {
                let confirmed = self.controller.set_state(target).await?;
                report::report(channel, &self.config.identity, confirmed);
            }
            Ok(None) => {
                debug!("no action taken for inbound message");
            }
            Err(e) => {
                // fatal for this one message only
                warn!("{e}");
            }
        }
        Ok(())
    }
}
