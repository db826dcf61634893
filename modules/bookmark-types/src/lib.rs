//! Shared types for the bookmark service and its HTTP clients.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =====================================================
// Domain Types
// =====================================================

/// Item identifier → last playback position.
///
/// This is also the on-disk format: one JSON object, e.g. `{"abc": 1234, "ep2": 99}`.
pub type Bookmarks = HashMap<String, i64>;

/// Body of `GET /bookmark/get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkTime {
    pub time: i64,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub total_items: usize,
    /// True while there are changes the flusher has not picked up yet
    pub pending_changes: bool,
    pub flush_interval_secs: u64,
    /// RFC 3339 time of the last successful write to disk
    pub last_flush_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bookmark_time_wire_shape() {
        let body = serde_json::to_value(BookmarkTime { time: 1234 }).unwrap();
        assert_eq!(body, serde_json::json!({ "time": 1234 }));
    }

    #[test]
    fn rpc_ok_omits_error() {
        let body = serde_json::to_value(RpcResponse::ok(3usize)).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "data": 3 }));
    }

    #[test]
    fn bookmarks_parse_from_plain_object() {
        let parsed: Bookmarks = serde_json::from_str(r#"{"abc": 1234, "ep2": 99}"#).unwrap();
        assert_eq!(parsed.get("abc"), Some(&1234));
        assert_eq!(parsed.get("ep2"), Some(&99));
    }
}
