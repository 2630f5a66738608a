use crossterm::event::{KeyCode, KeyModifiers};
use hexvi_messages::{Key, KeyEvent, KeyMods};

pub(crate) fn convert_key_event(key: crossterm::event::KeyEvent) -> KeyEvent {
    let plain_key = match key.code {
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Esc => Key::Esc,
        _ => Key::Unknown,
    };

    let mut mods = KeyMods::empty();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        mods |= KeyMods::CONTROL;
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        mods |= KeyMods::ALT;
    }

    KeyEvent::new(plain_key, mods)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_and_ctrl_chars() {
        let k = convert_key_event(crossterm::event::KeyEvent::new(
            KeyCode::Char('x'),
            KeyModifiers::NONE,
        ));
        assert_eq!(Some('x'), k.plain_char());

        let k = convert_key_event(crossterm::event::KeyEvent::new(
            KeyCode::Char('d'),
            KeyModifiers::CONTROL,
        ));
        assert!(k.is_ctrl('d'));
        assert_eq!(None, k.plain_char());
    }

    #[test]
    fn shifted_chars_stay_plain() {
        // The terminal reports uppercase with SHIFT set; the editor only
        // cares about the character.
        let k = convert_key_event(crossterm::event::KeyEvent::new(
            KeyCode::Char('X'),
            KeyModifiers::SHIFT,
        ));
        assert_eq!(Some('X'), k.plain_char());
    }
}
