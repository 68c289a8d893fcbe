use super::{
    errors::{ProtocolError, Result},
    messages::{ClientEnvelope, ServerMessage},
};

/// Maximum accepted size of one client message (16KB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024;

/// Parses one client text frame.
pub fn decode_envelope(text: &str) -> Result<ClientEnvelope> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            actual: text.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(serde_json::from_str(text)?)
}

/// Best-effort recovery of the request id from a frame that failed to
/// decode, so the rejection can still be paired by the client.
pub fn peek_request_id(text: &str) -> u64 {
    if text.len() > MAX_MESSAGE_SIZE {
        return 0;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| value.get("id").and_then(serde_json::Value::as_u64))
        .unwrap_or(0)
}

pub fn encode(message: &ServerMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}
