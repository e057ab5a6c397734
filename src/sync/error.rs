use thiserror::Error;

/// Errors raised while moving values across the relay boundary.
///
/// None of these propagate out of the per-frame reconciliation loop; the
/// bridges log them and keep the last valid snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The relay delivered a value that is not a sync envelope.
    #[error("value for key {key} is not a sync envelope")]
    NotAnEnvelope { key: String },

    /// The envelope body failed its shape check (wrong tuple length,
    /// wrong type, non-finite number).
    #[error("malformed payload for key {key}: {detail}")]
    MalformedPayload { key: String, detail: String },

    /// A local value could not be encoded for publication.
    #[error("failed to encode value for key {key}")]
    EncodeFailed { key: String },
}
