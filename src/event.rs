use crossterm::event;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Terminal-agnostic key representation so handlers never touch crossterm
/// types directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
  Enter,
  Tab,
  Backspace,
  Esc,
  Left,
  Right,
  Up,
  Down,
  Home,
  End,
  PageUp,
  PageDown,
  Delete,
  Char(char),
  Ctrl(char),
  Alt(char),
  Unknown,
}

impl From<event::KeyEvent> for Key {
  fn from(key_event: event::KeyEvent) -> Self {
    match key_event {
      event::KeyEvent {
        code: event::KeyCode::Esc,
        ..
      } => Key::Esc,
      event::KeyEvent {
        code: event::KeyCode::Backspace,
        ..
      } => Key::Backspace,
      event::KeyEvent {
        code: event::KeyCode::Left,
        ..
      } => Key::Left,
      event::KeyEvent {
        code: event::KeyCode::Right,
        ..
      } => Key::Right,
      event::KeyEvent {
        code: event::KeyCode::Up,
        ..
      } => Key::Up,
      event::KeyEvent {
        code: event::KeyCode::Down,
        ..
      } => Key::Down,
      event::KeyEvent {
        code: event::KeyCode::Home,
        ..
      } => Key::Home,
      event::KeyEvent {
        code: event::KeyCode::End,
        ..
      } => Key::End,
      event::KeyEvent {
        code: event::KeyCode::PageUp,
        ..
      } => Key::PageUp,
      event::KeyEvent {
        code: event::KeyCode::PageDown,
        ..
      } => Key::PageDown,
      event::KeyEvent {
        code: event::KeyCode::Delete,
        ..
      } => Key::Delete,
      event::KeyEvent {
        code: event::KeyCode::Enter,
        ..
      } => Key::Enter,
      event::KeyEvent {
        code: event::KeyCode::Tab,
        ..
      } => Key::Tab,
      event::KeyEvent {
        code: event::KeyCode::Char(c),
        modifiers: event::KeyModifiers::ALT,
        ..
      } => Key::Alt(c),
      event::KeyEvent {
        code: event::KeyCode::Char(c),
        modifiers: event::KeyModifiers::CONTROL,
        ..
      } => Key::Ctrl(c),
      event::KeyEvent {
        code: event::KeyCode::Char(c),
        ..
      } => Key::Char(c),
      _ => Key::Unknown,
    }
  }
}

/// Wheel movement as a signed browse delta, positive is down. Anything
/// that is not a scroll (moves, clicks, drags) maps to nothing.
pub fn scroll_delta(kind: event::MouseEventKind) -> Option<f64> {
  match kind {
    event::MouseEventKind::ScrollUp => Some(-10.0),
    event::MouseEventKind::ScrollDown => Some(10.0),
    _ => None,
  }
}

/// What the input thread delivers to the main loop.
pub enum Event<I> {
  Input(I),
  /// Scroll wheel movement, positive is down.
  Scroll(f64),
  Tick,
}

/// Polls the terminal on its own thread and interleaves tick events at the
/// configured rate.
pub struct Events {
  rx: mpsc::Receiver<Event<Key>>,
}

impl Events {
  pub fn new(tick_rate: u64) -> Events {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
      loop {
        match event::poll(Duration::from_millis(tick_rate)) {
          Ok(true) => match event::read() {
            Ok(event::Event::Key(key)) => {
              if key.kind != event::KeyEventKind::Release
                && tx.send(Event::Input(Key::from(key))).is_err()
              {
                return;
              }
            }
            Ok(event::Event::Mouse(mouse)) => {
              if let Some(delta) = scroll_delta(mouse.kind) {
                if tx.send(Event::Scroll(delta)).is_err() {
                  return;
                }
              }
            }
            _ => {}
          },
          Ok(false) => {
            if tx.send(Event::Tick).is_err() {
              return;
            }
          }
          Err(_) => return,
        }
      }
    });

    Events { rx }
  }

  pub fn next(&self) -> Result<Event<Key>, mpsc::RecvError> {
    self.rx.recv()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

  #[test]
  fn converts_plain_and_modified_chars() {
    assert_eq!(
      Key::from(KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE)),
      Key::Char('k')
    );
    assert_eq!(
      Key::from(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
      Key::Ctrl('c')
    );
    assert_eq!(
      Key::from(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)),
      Key::Alt('x')
    );
  }

  #[test]
  fn wheel_events_map_to_signed_deltas() {
    use crossterm::event::{MouseButton, MouseEventKind};
    assert_eq!(scroll_delta(MouseEventKind::ScrollUp), Some(-10.0));
    assert_eq!(scroll_delta(MouseEventKind::ScrollDown), Some(10.0));
    assert_eq!(scroll_delta(MouseEventKind::Moved), None);
    assert_eq!(scroll_delta(MouseEventKind::Down(MouseButton::Left)), None);
  }

  #[test]
  fn converts_navigation_keys() {
    assert_eq!(
      Key::from(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)),
      Key::Left
    );
    assert_eq!(
      Key::from(KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE)),
      Key::PageDown
    );
    assert_eq!(
      Key::from(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
      Key::Enter
    );
  }
}
