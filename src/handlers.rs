//! Global transport shortcuts.
//!
//! Each latin key also accepts the character produced by the same physical
//! key under the Russian layout, so shortcuts keep working regardless of
//! the active input language. `а` doubles as both previous-track and
//! fullscreen in that layout; previous-track wins.

use crate::event::Key;
use crate::player::Player;

pub fn handler(key: Key, player: &mut Player) {
  if player.input_active {
    return;
  }
  let key = normalize(key);
  match key {
    Key::Char(' ') | Key::Char('k') | Key::Char('л') => {
      player.toggle_play();
    }
    Key::Right | Key::Char('в') => {
      player.next_track();
    }
    Key::Left | Key::Char('а') => {
      player.previous_track();
    }
    Key::Up | Key::Char('ц') => {
      let step = i16::from(player.volume_step);
      player.step_volume(step);
    }
    Key::Down | Key::Char('н') => {
      let step = i16::from(player.volume_step);
      player.step_volume(-step);
    }
    Key::Char('f') => {
      if player.current_track.is_some() {
        player.is_fullscreen = !player.is_fullscreen;
      }
    }
    Key::Char('m') | Key::Char('ь') => {
      player.toggle_mute();
    }
    Key::Char('l') | Key::Char('д') => {
      if let Some(key) = player
        .current_track
        .as_ref()
        .and_then(|t| t.id.clone().or_else(|| Some(t.title.clone())))
      {
        player.toggle_like(&key);
      }
    }
    Key::Char('s') | Key::Char('ы') => {
      player.toggle_shuffle();
      let message = if player.shuffle() {
        "Shuffle on"
      } else {
        "Shuffle off"
      };
      player.notify(message);
    }
    Key::Char('r') | Key::Char('к') => {
      player.toggle_repeat();
      let message = if player.repeat {
        "Repeat on"
      } else {
        "Repeat off"
      };
      player.notify(message);
    }
    Key::Char('q') | Key::Ctrl('c') => {
      player.should_quit = true;
    }
    _ => {}
  }
}

fn normalize(key: Key) -> Key {
  match key {
    Key::Char(c) => Key::Char(c.to_lowercase().next().unwrap_or(c)),
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::audio::NullSink;
  use crate::model::Track;

  fn track(id: &str, title: &str) -> Track {
    Track {
      id: Some(id.to_string()),
      title: title.to_string(),
      duration: 100.0,
      ..Track::default()
    }
  }

  fn player() -> Player {
    let mut player = Player::new(None, Box::new(NullSink));
    player.api_tracks = vec![track("t0", "Zero"), track("t1", "One")];
    let t = player.api_tracks[0].clone();
    player.set_current_track(t, Some("API Tracks"));
    player
  }

  #[test]
  fn space_and_cyrillic_alternate_toggle_playback() {
    let mut p = player();
    assert!(p.is_playing);
    handler(Key::Char(' '), &mut p);
    assert!(!p.is_playing);
    handler(Key::Char('л'), &mut p);
    assert!(p.is_playing);
  }

  #[test]
  fn arrows_and_alternates_move_between_tracks() {
    let mut p = player();
    handler(Key::Right, &mut p);
    assert_eq!(
      p.current_track.as_ref().unwrap().id.as_deref(),
      Some("t1")
    );
    handler(Key::Char('а'), &mut p);
    assert_eq!(
      p.current_track.as_ref().unwrap().id.as_deref(),
      Some("t0")
    );
  }

  #[test]
  fn volume_keys_step_by_the_configured_amount() {
    let mut p = player();
    let before = p.volume;
    handler(Key::Up, &mut p);
    assert_eq!(p.volume, before + 5);
    handler(Key::Char('н'), &mut p);
    assert_eq!(p.volume, before);
  }

  #[test]
  fn uppercase_input_still_matches() {
    let mut p = player();
    handler(Key::Char('M'), &mut p);
    assert_eq!(p.volume, 0);
  }

  #[test]
  fn fullscreen_requires_a_current_track() {
    let mut p = Player::new(None, Box::new(NullSink));
    handler(Key::Char('f'), &mut p);
    assert!(!p.is_fullscreen);

    let mut p = player();
    handler(Key::Char('f'), &mut p);
    assert!(p.is_fullscreen);
  }

  #[test]
  fn like_key_targets_the_current_track() {
    let mut p = player();
    handler(Key::Char('l'), &mut p);
    assert!(p.liked_ids.contains("t0"));
    handler(Key::Char('д'), &mut p);
    assert!(!p.liked_ids.contains("t0"));
  }

  #[test]
  fn shuffle_and_repeat_announce_their_state() {
    let mut p = player();
    handler(Key::Char('s'), &mut p);
    assert!(p.shuffle());
    assert_eq!(p.status_message.as_deref(), Some("Shuffle on"));
    handler(Key::Char('к'), &mut p);
    assert!(p.repeat);
    assert_eq!(p.status_message.as_deref(), Some("Repeat on"));
  }

  #[test]
  fn shortcuts_are_suppressed_while_typing() {
    let mut p = player();
    p.input_active = true;
    handler(Key::Char(' '), &mut p);
    assert!(p.is_playing);
    handler(Key::Char('q'), &mut p);
    assert!(!p.should_quit);
  }

  #[test]
  fn quit_keys_set_the_flag() {
    let mut p = player();
    handler(Key::Ctrl('c'), &mut p);
    assert!(p.should_quit);
  }
}
