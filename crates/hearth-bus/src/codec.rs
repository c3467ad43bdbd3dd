// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON encoding of bus messages.

use hearth_core::{BusMessage, HearthError};

/// Largest encoded message accepted on the bus (192 KiB).
///
/// Stays below the default Unix datagram send buffer so one message is
/// always one datagram.
pub const MAX_MESSAGE_BYTES: usize = 192 * 1024;

/// Encode a message, rejecting anything over [`MAX_MESSAGE_BYTES`].
pub fn encode(message: &BusMessage) -> Result<Vec<u8>, HearthError> {
    let bytes = serde_json::to_vec(message).map_err(|e| HearthError::Bus {
        message: "failed to encode bus message".to_string(),
        source: Some(Box::new(e)),
    })?;
    if bytes.len() > MAX_MESSAGE_BYTES {
        return Err(HearthError::bus(format!(
            "bus message is {} bytes, limit is {MAX_MESSAGE_BYTES}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Decode one message.
pub fn decode(bytes: &[u8]) -> Result<BusMessage, HearthError> {
    serde_json::from_slice(bytes).map_err(|e| HearthError::Bus {
        message: "undecodable bus message".to_string(),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::{ExecMode, QueryRequest, RequesterId};
    use proptest::prelude::*;
    use serde_json::json;

    fn query(sql: String) -> BusMessage {
        BusMessage::Query(QueryRequest {
            requester_id: RequesterId("tab-1".into()),
            correlation_id: 1,
            sql,
            params: vec![json!(1)],
            mode: ExecMode::All,
        })
    }

    #[test]
    fn wire_shape_is_type_tagged() {
        let bytes = encode(&query("SELECT 1".into())).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "query");
        assert_eq!(value["requesterId"], "tab-1");
        assert_eq!(value["mode"], "all");
    }

    #[test]
    fn oversized_messages_are_rejected() {
        let err = encode(&query("x".repeat(MAX_MESSAGE_BYTES))).unwrap_err();
        assert!(matches!(err, HearthError::Bus { .. }));
    }

    #[test]
    fn garbage_is_a_bus_error() {
        assert!(matches!(decode(b"not json"), Err(HearthError::Bus { .. })));
        assert!(decode(br#"{"type":"gossip"}"#).is_err());
    }

    proptest! {
        #[test]
        fn any_statement_text_survives_the_wire(sql in ".{0,512}") {
            let msg = query(sql);
            let decoded = decode(&encode(&msg).unwrap()).unwrap();
            prop_assert_eq!(decoded, msg);
        }
    }
}
