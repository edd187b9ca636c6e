//! Registration protocol. Announces the device identity on a freshly opened
//! cloud channel.

use serde::Serialize;
use tracing::{info, warn};

use super::CloudChannel;
use crate::types::{epoch_millis, DeviceId, DeviceIdentity};

#[derive(Serialize, Debug)]
struct RegisterMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,

    sdid: &'a DeviceId,

    #[serde(rename = "Authorization")]
    authorization: String,

    cid: String,
}

/// Builds the registration payload with the given correlation timestamp
pub fn registration_payload(
    identity: &DeviceIdentity,
    now_ms: u64,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&RegisterMessage {
        kind: "register",
        sdid: &identity.device_id,
        authorization: format!("bearer {}", identity.token),
        cid: now_ms.to_string(),
    })
}

/// Sends the registration message over the cloud channel
///
/// Called exactly once per channel open. Errors are logged and swallowed;
/// registration is neither retried nor does a failure end the session.
/// Returns whether the message was handed to the channel, which the agent
/// records as its "channel ready" flag.
pub fn register(channel: &CloudChannel, identity: &DeviceIdentity) -> bool {
    info!("registering device on the cloud channel");
    match registration_payload(identity, epoch_millis()) {
        Ok(payload) => {
            info!(%payload, "sending register message");
            channel.send(payload);
            true
        }
        Err(e) => {
            warn!("failed to build register message: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            device_id: "device-123".to_string().into(),
            token: "secret-token".to_string().into(),
        }
    }

    #[test]
    fn payload_carries_identity_and_correlation_id() {
        let payload = registration_payload(&identity(), 1451436813630).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "register",
                "sdid": "device-123",
                "Authorization": "bearer secret-token",
                "cid": "1451436813630"
            })
        );
    }

    #[test]
    fn correlation_id_is_a_decimal_string() {
        let payload = registration_payload(&identity(), 7).unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["cid"], json!("7"));
    }
}
