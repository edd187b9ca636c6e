//! Cloud channel component. Maintains the single WebSocket session to the
//! cloud broker and forwards its events to the agent's mailbox.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Events emitted by the channel into the agent's single-consumer mailbox
///
/// A session emits exactly one `Opened` on success, any number of `Message`s
/// while open, and exactly one terminating `Closed`. Remote close, local
/// close and transport errors all collapse to `Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened,
    Message(String),
    Closed,
}

/// Connection state of the one outstanding cloud session
///
/// `Closed` is terminal for this process run; there is no reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
}

/// Handle to the cloud WebSocket session
///
/// The session itself lives on a background task; this handle only carries
/// the outbound send queue and the observable connection state.
pub struct CloudChannel {
    outbound_tx: mpsc::UnboundedSender<String>,
    state_rx: watch::Receiver<LinkState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CloudChannel {
    /// Starts connecting to `endpoint` and returns immediately
    ///
    /// Session events are delivered on `events` as the connection progresses.
    /// A failed connect surfaces as a `Closed` event like any other session
    /// end.
    pub fn connect(endpoint: &str, events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LinkState::Connecting);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(Self::session_task(
            endpoint.to_string(),
            outbound_rx,
            shutdown_rx,
            state_tx,
            events,
        ));

        Self {
            outbound_tx,
            state_rx,
            shutdown_tx,
        }
    }

    /// Queues `payload` for transmission, fire-and-forget
    ///
    /// If the channel is not open the payload is dropped with a log line;
    /// nothing is buffered and no error surfaces to the caller.
    pub fn send(&self, payload: String) {
        if *self.state_rx.borrow() != LinkState::Open {
            warn!("cloud channel not open, dropping outbound payload");
            return;
        }
        if self.outbound_tx.send(payload).is_err() {
            warn!("cloud channel session ended, dropping outbound payload");
        }
    }

    /// Current connection state
    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    async fn session_task(
        endpoint: String,
        mut outbound_rx: mpsc::UnboundedReceiver<String>,
        mut shutdown_rx: broadcast::Receiver<()>,
        state_tx: watch::Sender<LinkState>,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) {
        let stream = match connect_async(&endpoint).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!("failed to open cloud channel: {e}");
                let _ = state_tx.send(LinkState::Closed);
                let _ = events.send(LinkEvent::Closed);
                return;
            }
        };

        info!("cloud channel open");
        // publish the state before the event so handlers of Opened can send
        let _ = state_tx.send(LinkState::Open);
        let _ = events.send(LinkEvent::Opened);

        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("closing cloud channel");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }

                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(payload) => {
                            if let Err(e) = sink.send(Message::Text(payload.into())).await {
                                warn!("cloud channel send failed: {e}");
                                break;
                            }
                        }
                        // handle dropped, nothing more to transmit
                        None => {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }

                incoming = source.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = events.send(LinkEvent::Message(text.to_string()));
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("cloud channel closed by remote");
                            break;
                        }
                        Some(Ok(other)) => {
                            debug!("ignoring non-text frame: {other:?}");
                        }
                        Some(Err(e)) => {
                            warn!("cloud channel transport error: {e}");
                            break;
                        }
                    }
                }
            }
        }

        let _ = state_tx.send(LinkState::Closed);
        let _ = events.send(LinkEvent::Closed);
    }
}

impl Drop for CloudChannel {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}
