//! Connection status as shown to the user

use std::fmt;

/// Debounced view of the poller's connection flag
///
/// A single failed poll after being connected only drops to `Connecting`;
/// a second consecutive failure reports the connection as lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    NotConnected,
    Connecting,
    Connected,
}

/// Edge reported by [`ConnectionStatus::next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Lost,
}

impl ConnectionStatus {
    /// Advance with the outcome of the latest poll
    pub fn next(self, connection_successful: bool) -> (Self, Option<ConnectionEvent>) {
        use ConnectionStatus::*;

        match (self, connection_successful) {
            (Connected, true) => (Connected, None),
            (_, true) => (Connected, Some(ConnectionEvent::Connected)),
            (Connected, false) => (Connecting, None),
            (Connecting, false) => (NotConnected, Some(ConnectionEvent::Lost)),
            (NotConnected, false) => (NotConnected, None),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionStatus::NotConnected => "Not Connected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected to: OP25",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_from_any_state() {
        for status in [ConnectionStatus::NotConnected, ConnectionStatus::Connecting] {
            assert_eq!(
                status.next(true),
                (ConnectionStatus::Connected, Some(ConnectionEvent::Connected))
            );
        }
        assert_eq!(ConnectionStatus::Connected.next(true), (ConnectionStatus::Connected, None));
    }

    #[test]
    fn test_loss_takes_two_failures() {
        let (status, event) = ConnectionStatus::Connected.next(false);
        assert_eq!((status, event), (ConnectionStatus::Connecting, None));

        let (status, event) = status.next(false);
        assert_eq!((status, event), (ConnectionStatus::NotConnected, Some(ConnectionEvent::Lost)));

        assert_eq!(status.next(false), (ConnectionStatus::NotConnected, None));
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionStatus::default().to_string(), "Not Connected");
        assert_eq!(ConnectionStatus::Connected.to_string(), "Connected to: OP25");
    }
}
