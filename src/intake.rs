// Latest-intent-wins selection over a batch of pending command envelopes

use tracing::debug;

use crate::messages::{CommandEnvelope, CommandError};

#[derive(Debug, Default)]
pub struct CommandIntake {
    last_applied: Option<f64>,
}

impl CommandIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the newest envelope from a batch, dropping the rest
    ///
    /// Ties go to the later arrival. Envelopes older than the last one applied
    /// are stale and never selected.
    pub fn select<I>(&mut self, batch: I) -> Option<CommandEnvelope>
    where
        I: IntoIterator<Item = CommandEnvelope>,
    {
        let mut latest: Option<CommandEnvelope> = None;
        let mut discarded = 0usize;

        for envelope in batch {
            if self.last_applied.is_some_and(|last| envelope.timestamp < last) {
                debug!("Discarding stale command '{}' @ {}", envelope.command, envelope.timestamp);
                discarded += 1;
                continue;
            }
            let newer = latest
                .as_ref()
                .is_none_or(|current| envelope.timestamp >= current.timestamp);
            if latest.is_some() {
                discarded += 1;
            }
            if newer {
                latest = Some(envelope);
            }
        }

        if discarded > 0 {
            debug!("Superseded {} pending command(s)", discarded);
        }
        if let Some(envelope) = &latest {
            self.last_applied = Some(envelope.timestamp);
        }
        latest
    }
}

/// Decode a raw payload into an envelope
pub fn decode(payload: &[u8]) -> Result<CommandEnvelope, CommandError> {
    serde_json::from_slice(payload).map_err(|e| CommandError::MalformedEnvelope(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(command: &str, ts: f64) -> CommandEnvelope {
        CommandEnvelope::new(command, None, ts)
    }

    #[test]
    fn test_newest_wins() {
        let mut intake = CommandIntake::new();
        let picked = intake
            .select(vec![env("forward", 10.0), env("stop", 30.0), env("left", 20.0)])
            .unwrap();
        assert_eq!(picked.command, "stop");
    }

    #[test]
    fn test_tie_goes_to_later_arrival() {
        let mut intake = CommandIntake::new();
        let picked = intake.select(vec![env("forward", 5.0), env("backward", 5.0)]).unwrap();
        assert_eq!(picked.command, "backward");
    }

    #[test]
    fn test_stale_commands_are_discarded() {
        let mut intake = CommandIntake::new();
        intake.select(vec![env("forward", 100.0)]).unwrap();
        assert_eq!(intake.select(vec![env("left", 99.0)]), None);
        assert_eq!(intake.select(vec![env("right", 101.0)]).unwrap().command, "right");
    }

    #[test]
    fn test_empty_batch() {
        let mut intake = CommandIntake::new();
        assert_eq!(intake.select(Vec::new()), None);
    }

    #[test]
    fn test_decode() {
        let envelope = decode(br#"{"command":"joystick","value":{"x":1,"y":2},"timestamp":1700000000000}"#)
            .unwrap();
        assert_eq!(envelope.command, "joystick");
        assert_eq!(envelope.timestamp, 1_700_000_000_000.0);
        assert!(matches!(decode(b"nope"), Err(CommandError::MalformedEnvelope(_))));
    }
}
