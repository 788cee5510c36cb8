#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Play state and position as seen by the render path.
///
/// The core doesn't own timing policy (tempo, loops, punch-in); it only
/// obeys play/stop/locate and counts frames while playing.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportState {
    pub playing: bool,
    pub position_samples: u64,
}

#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self) {
        self.state.playing = true;
    }

    pub fn stop(&mut self) {
        self.state.playing = false;
    }

    pub fn locate(&mut self, position_samples: u64) {
        self.state.position_samples = position_samples;
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn position(&self) -> u64 {
        self.state.position_samples
    }

    /// Count rendered frames. Stopped transports don't move.
    pub fn advance(&mut self, frames: u64) {
        if self.state.playing {
            self.state.position_samples = self.state.position_samples.saturating_add(frames);
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advances_only_while_playing() {
        let mut transport = Transport::new();
        transport.advance(512);
        assert_eq!(transport.position(), 0);

        transport.play();
        transport.advance(512);
        transport.advance(256);
        assert_eq!(transport.position(), 768);

        transport.stop();
        transport.advance(512);
        assert_eq!(transport.position(), 768);

        transport.locate(44_100);
        assert_eq!(transport.state().position_samples, 44_100);
        assert!(!transport.state().playing);
    }
}
