//! Command dispatcher. Decodes inbound cloud messages into target output
//! states.
//!
//! Example of a received message carrying an action:
//!
//! ```json
//! {
//!   "type": "action",
//!   "cts": 1451436813630, "ts": 1451436813631,
//!   "mid": "37e1d61b61b74a3ba962726cb3ef62f1",
//!   "sdid": "xxxx", "ddid": "xxxx",
//!   "data": {"actions": [{"name": "setOn", "parameters": {}}]}
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed inbound message: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    data: EnvelopeData,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
struct Action {
    name: String,

    #[serde(default)]
    parameters: Value,
}

/// Decodes one raw inbound message into a target output state
///
/// Returns `Ok(None)` for everything that is filtered rather than acted on:
/// non-action envelopes, empty action lists and unrecognized action names.
/// A parse failure is fatal for this one message and surfaces as an error
/// with no side effects.
///
/// Only the first action of the list is considered; any further actions are
/// ignored.
pub fn decode(raw: &str) -> Result<Option<bool>, DispatchError> {
    let envelope: Envelope = serde_json::from_str(raw)?;

    if envelope.kind != "action" {
        debug!(kind = %envelope.kind, "ignoring non-action message");
        return Ok(None);
    }

    let Some(action) = envelope.data.actions.first() else {
        // upstream always sends at least one action, anything else violates
        // the protocol
        warn!("action message with empty action list");
        return Ok(None);
    };

    debug!(name = %action.name, parameters = %action.parameters, "received action");

    match action.name.to_lowercase().as_str() {
        "seton" => Ok(Some(true)),
        "setoff" => Ok(Some(false)),
        other => {
            info!("doing nothing for unrecognized action {other}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action_message(name: &str) -> String {
        json!({
            "type": "action",
            "data": {"actions": [{"name": name, "parameters": {}}]}
        })
        .to_string()
    }

    #[test]
    fn recognized_actions_map_regardless_of_case() {
        for name in ["setOn", "SETON", "seton"] {
            assert_eq!(decode(&action_message(name)).unwrap(), Some(true));
        }
        for name in ["setOff", "SETOFF", "setoff"] {
            assert_eq!(decode(&action_message(name)).unwrap(), Some(false));
        }
    }

    #[test]
    fn unrecognized_action_is_ignored() {
        assert_eq!(decode(&action_message("setDimmer")).unwrap(), None);
    }

    #[test]
    fn non_action_messages_are_filtered() {
        let raw = json!({"type": "ping"}).to_string();
        assert_eq!(decode(&raw).unwrap(), None);

        // even when an actions list is present
        let raw = json!({
            "type": "register",
            "data": {"actions": [{"name": "setOn"}]}
        })
        .to_string();
        assert_eq!(decode(&raw).unwrap(), None);
    }

    #[test]
    fn empty_action_list_is_ignored() {
        let raw = json!({"type": "action", "data": {"actions": []}}).to_string();
        assert_eq!(decode(&raw).unwrap(), None);
    }

    #[test]
    fn missing_data_is_treated_as_empty() {
        let raw = json!({"type": "action"}).to_string();
        assert_eq!(decode(&raw).unwrap(), None);
    }

    #[test]
    fn only_the_first_action_counts() {
        let raw = json!({
            "type": "action",
            "data": {"actions": [
                {"name": "setOff"},
                {"name": "setOn"}
            ]}
        })
        .to_string();
        assert_eq!(decode(&raw).unwrap(), Some(false));
    }

    #[test]
    fn invalid_payload_is_a_parse_error() {
        let err = decode("not json at all").unwrap_err();
        assert!(matches!(err, DispatchError::Parse(_)));

        // valid JSON of the wrong shape also fails to parse
        let err = decode("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, DispatchError::Parse(_)));
    }

    #[test]
    fn extra_envelope_fields_are_tolerated() {
        let raw = json!({
            "type": "action",
            "cts": 1451436813630_u64,
            "ts": 1451436813631_u64,
            "mid": "37e1d61b61b74a3ba962726cb3ef62f1",
            "sdid": "xxxx",
            "data": {"actions": [{"name": "setOn", "parameters": {}}]}
        })
        .to_string();
        assert_eq!(decode(&raw).unwrap(), Some(true));
    }
}
