//! The wire envelope and the body codecs.
//!
//! Every value the engine publishes is wrapped in an envelope carrying the
//! writer's user id and a per-key sequence number. The envelope is what
//! makes echo handling deterministic (see `echo.rs`); the body inside is
//! the plain JSON shape peers agreed on per key.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::SyncError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    /// User id of the writing client.
    pub origin: String,
    /// Monotonic per-key counter on the writing client.
    pub seq: u64,
    pub body: Value,
}

impl SyncEnvelope {
    pub fn new(origin: &str, seq: u64, body: Value) -> Self {
        Self {
            origin: origin.to_string(),
            seq,
            body,
        }
    }

    pub fn parse(value: &Value, key: &str) -> Result<SyncEnvelope, SyncError> {
        serde_json::from_value(value.clone()).map_err(|_| SyncError::NotAnEnvelope {
            key: key.to_string(),
        })
    }

    pub fn into_value(self, key: &str) -> Result<Value, SyncError> {
        serde_json::to_value(self).map_err(|_| SyncError::EncodeFailed {
            key: key.to_string(),
        })
    }
}

// Body codecs. Decoders validate shape and finiteness; a payload that
// fails here is discarded and the previous snapshot kept.

pub fn position_to_body(position: Vec3) -> Value {
    json!([position.x, position.y, position.z])
}

pub fn position_from_body(body: &Value, key: &str) -> Result<Vec3, SyncError> {
    let malformed = |detail: &str| SyncError::MalformedPayload {
        key: key.to_string(),
        detail: detail.to_string(),
    };
    let items = body.as_array().ok_or_else(|| malformed("expected array"))?;
    if items.len() != 3 {
        return Err(malformed("expected 3 components"));
    }
    let mut components = [0.0f32; 3];
    for (slot, item) in components.iter_mut().zip(items) {
        let n = item
            .as_f64()
            .ok_or_else(|| malformed("component is not a number"))? as f32;
        if !n.is_finite() {
            return Err(malformed("component is not finite"));
        }
        *slot = n;
    }
    Ok(Vec3::from_array(components))
}

pub fn yaw_to_body(yaw: f32) -> Value {
    json!(yaw)
}

pub fn yaw_from_body(body: &Value, key: &str) -> Result<f32, SyncError> {
    let yaw = body.as_f64().ok_or_else(|| SyncError::MalformedPayload {
        key: key.to_string(),
        detail: "expected number".to_string(),
    })? as f32;
    if !yaw.is_finite() {
        return Err(SyncError::MalformedPayload {
            key: key.to_string(),
            detail: "yaw is not finite".to_string(),
        });
    }
    Ok(yaw)
}

pub fn spawned_to_body(spawned: bool) -> Value {
    json!(spawned)
}

pub fn spawned_from_body(body: &Value, key: &str) -> Result<bool, SyncError> {
    body.as_bool().ok_or_else(|| SyncError::MalformedPayload {
        key: key.to_string(),
        detail: "expected bool".to_string(),
    })
}
