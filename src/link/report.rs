//! State reporter. Sends the confirmed output state back to the cloud after
//! every applied change.

use serde::Serialize;
use tracing::{info, warn};

use super::CloudChannel;
use crate::types::{epoch_millis, DeviceId, DeviceIdentity};

#[derive(Serialize, Debug)]
struct StateMessage<'a> {
    sdid: &'a DeviceId,
    ts: u64,
    data: StateData,
    cid: String,
}

#[derive(Serialize, Debug)]
struct StateData {
    state: u8,
}

/// Builds the state-update payload with the given timestamp
pub fn state_payload(
    identity: &DeviceIdentity,
    state: bool,
    now_ms: u64,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StateMessage {
        sdid: &identity.device_id,
        ts: now_ms,
        data: StateData {
            state: state.into(),
        },
        cid: now_ms.to_string(),
    })
}

/// Reports a confirmed output state over the cloud channel, best-effort
///
/// The physical output is authoritative at this point; a failed report is
/// logged and swallowed, it never rolls anything back.
pub fn report(channel: &CloudChannel, identity: &DeviceIdentity, state: bool) {
    match state_payload(identity, state, epoch_millis()) {
        Ok(payload) => {
            info!(%payload, "sending state report");
            channel.send(payload);
        }
        Err(e) => {
            warn!("failed to build state report: {e}");
        }
    }
}
