//! Fire-and-forget speech sink with per-tag cooldowns.
//!
//! The AI queues lines here; the host drains them into its chat/dialogue
//! layer. Tagged lines are suppressed while their tag's cooldown is live, so
//! a drowning character complains about oxygen once, not every tick.

use std::collections::HashMap;

/// A queued spoken line
#[derive(Debug, Clone, PartialEq)]
pub struct SpokenLine {
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Speech {
    queue: Vec<SpokenLine>,
    /// Remaining cooldown seconds per tag
    cooldowns: HashMap<String, f32>,
}

impl Speech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line. A tagged line is dropped if the tag is still cooling
    /// down; otherwise it starts the tag's cooldown. Untagged lines always
    /// pass. Returns whether the line was queued.
    pub fn say(&mut self, text: impl Into<String>, tag: Option<&str>, cooldown_secs: f32) -> bool {
        if let Some(tag) = tag {
            if self.cooldowns.get(tag).copied().unwrap_or(0.0) > 0.0 {
                return false;
            }
            self.cooldowns.insert(tag.to_string(), cooldown_secs);
        }
        self.queue.push(SpokenLine { text: text.into() });
        true
    }

    /// Decay cooldowns by elapsed time
    pub fn update(&mut self, dt: f32) {
        self.cooldowns.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
    }

    /// Take all queued lines, leaving the queue empty
    pub fn drain(&mut self) -> Vec<SpokenLine> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> &[SpokenLine] {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_lines_deduplicate() {
        let mut speech = Speech::new();
        assert!(speech.say("I can't breathe!", Some("low-oxygen"), 30.0));
        assert!(!speech.say("I can't breathe!", Some("low-oxygen"), 30.0));
        assert_eq!(speech.drain().len(), 1);
    }

    #[test]
    fn test_cooldown_expires() {
        let mut speech = Speech::new();
        speech.say("I'm bleeding!", Some("bleeding"), 2.0);
        speech.update(1.0);
        assert!(!speech.say("I'm bleeding!", Some("bleeding"), 2.0));
        speech.update(1.5);
        assert!(speech.say("I'm bleeding!", Some("bleeding"), 2.0));
    }

    #[test]
    fn test_untagged_lines_always_pass() {
        let mut speech = Speech::new();
        assert!(speech.say("Aye.", None, 0.0));
        assert!(speech.say("Aye.", None, 0.0));
        assert_eq!(speech.drain().len(), 2);
        assert!(speech.pending().is_empty());
    }
}
