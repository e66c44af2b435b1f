//! Tunable protocol limits.

use crate::protocol::{DEFAULT_CHUNK_SIZE, MAX_PAYLOAD_SIZE};

/// Limits shared by the codec, parser, stream decoder and transfer models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Largest payload accepted on construction or on receive.
    pub max_payload_size: usize,
    /// Chunk size new file transfers start with.
    pub chunk_size: u32,
}

impl ProtocolConfig {
    /// Create a config with the compiled-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum payload size.
    pub fn max_payload_size(mut self, max: usize) -> Self {
        self.max_payload_size = max;
        self
    }

    /// Set the file transfer chunk size.
    ///
    /// A zero chunk size is bumped to 1 so transfers always make progress.
    pub fn chunk_size(mut self, size: u32) -> Self {
        self.chunk_size = size.max(1);
        self
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.max_payload_size, 16 * 1024 * 1024);
        assert_eq!(config.chunk_size, 64 * 1024);
        assert_eq!(ProtocolConfig::new(), config);
    }

    #[test]
    fn test_builder_setters() {
        let config = ProtocolConfig::new().max_payload_size(100).chunk_size(0);
        assert_eq!(config.max_payload_size, 100);
        assert_eq!(config.chunk_size, 1);
    }
}
