//! Socket configuration.

use std::time::Duration;

/// Configuration for socket behavior.
///
/// Passed to [`PacketSocket::with_config`](crate::PacketSocket::with_config);
/// `SocketConfig::default()` is a sensible starting point.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Upper bound on how long a connect attempt may spend
    /// establishing the link, handshake included.
    ///
    /// Default: 10 seconds.
    pub connect_timeout: Duration,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connect_timeout() {
        let config = SocketConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
