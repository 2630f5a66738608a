use hexvi_messages::KeyEvent;

/// Keys kept per macro slot. Recording past this is dropped.
const MAX_MACRO_KEYS: usize = 256;

/// 26 macro slots keyed a..z. One may be recording at a time; playback
/// re-emits the recorded keys through the pending-key queue.
pub(crate) struct MacroTable {
    slots: [Vec<KeyEvent>; 26],
    recording: Option<usize>,
    last_played: Option<usize>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable {
            slots: std::array::from_fn(|_| Vec::new()),
            recording: None,
            last_played: None,
        }
    }

    pub fn slot_of(ch: char) -> Option<usize> {
        if ch.is_ascii_lowercase() {
            Some(ch as usize - 'a' as usize)
        } else {
            None
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Begin recording into the slot for `ch`. The previous content of
    /// the slot is discarded.
    pub fn start(&mut self, ch: char) -> bool {
        match Self::slot_of(ch) {
            Some(i) => {
                self.slots[i].clear();
                self.recording = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        self.recording = None;
    }

    pub fn record(&mut self, key: KeyEvent) {
        if let Some(i) = self.recording {
            if self.slots[i].len() < MAX_MACRO_KEYS {
                self.slots[i].push(key);
            } else {
                log::warn!("macro slot full, key dropped");
            }
        }
    }

    /// Drop the most recently recorded key: the closing `q` and the `@`
    /// of a nested playback are not part of the macro.
    pub fn unrecord_last(&mut self) {
        if let Some(i) = self.recording {
            self.slots[i].pop();
        }
    }

    /// Keys to play for `ch`; `None` plays the last played slot again.
    pub fn playback(&mut self, ch: Option<char>) -> Option<Vec<KeyEvent>> {
        let i = match ch {
            Some(c) => Self::slot_of(c)?,
            None => self.last_played?,
        };
        self.last_played = Some(i);
        Some(self.slots[i].clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_and_play() {
        let mut m = MacroTable::new();
        assert!(m.start('a'));
        m.record(KeyEvent::ch('x'));
        m.record(KeyEvent::ch('x'));
        m.stop();
        assert_eq!(2, m.playback(Some('a')).unwrap().len());
        // @@ replays the same slot.
        assert_eq!(2, m.playback(None).unwrap().len());
    }

    #[test]
    fn only_lowercase_slots() {
        let mut m = MacroTable::new();
        assert!(!m.start('A'));
        assert!(!m.start('1'));
        assert!(m.playback(Some('Z')).is_none());
    }

    #[test]
    fn unrecord_drops_tail_key() {
        let mut m = MacroTable::new();
        m.start('q');
        m.record(KeyEvent::ch('x'));
        m.record(KeyEvent::ch('q'));
        m.unrecord_last();
        m.stop();
        assert_eq!(1, m.playback(Some('q')).unwrap().len());
    }

    #[test]
    fn restart_clears_slot() {
        let mut m = MacroTable::new();
        m.start('a');
        m.record(KeyEvent::ch('x'));
        m.stop();
        m.start('a');
        m.stop();
        assert!(m.playback(Some('a')).unwrap().is_empty());
    }
}
