//! Unified error type for the Parlor broker.

use parlor_transport::TransportError;

/// Top-level error surfaced by the broker's build and run paths.
///
/// Only transport failures propagate this far: malformed envelopes are
/// skipped in the handler and room errors become `error` replies to the
/// requesting client. The `#[from]` attribute lets the `?` operator
/// convert transport errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: BrokerError = TransportError::SendFailed(io).into();
        assert!(matches!(err, BrokerError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }
}
