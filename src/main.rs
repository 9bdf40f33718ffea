mod audio;
mod event;
mod handlers;
mod lyrics;
mod media;
mod model;
mod network;
mod player;
mod user_config;

use crate::event::{Event, Key};
use crate::lyrics::{LyricTimeline, LyricView};
use crate::model::{format_time, Lyrics, TrackFilters};
use crate::network::{ApiClient, IoEvent, Network};
use crate::player::Player;
use crate::user_config::{UserConfig, UserConfigPaths};
use anyhow::{anyhow, Result};
use backtrace::Backtrace;
use clap::{Arg, Command as ClapApp};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, execute, terminal};
use log::info;
use std::io::{stdout, Write};
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

fn setup_logging() -> Result<()> {
  let pid = std::process::id();
  let log_dir = "/tmp/sipsound_logs/";
  let log_path = format!("{}/sipsoundlog{}", log_dir, pid);

  if !std::path::Path::new(log_dir).exists() {
    std::fs::create_dir_all(log_dir)
      .map_err(|e| anyhow!("Failed to create log directory {}: {}", log_dir, e))?;
  }
  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{}[{}][{}] {}",
        chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
        record.target(),
        record.level(),
        message
      ))
    })
    .level(log::LevelFilter::Info)
    .chain(fern::log_file(&log_path)?)
    .apply()
    .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

  println!("Logging to: {}", log_path);
  Ok(())
}

fn install_panic_hook() {
  let default_hook = panic::take_hook();
  panic::set_hook(Box::new(move |info| {
    let _ = execute!(stdout(), DisableMouseCapture);
    let _ = terminal::disable_raw_mode();
    let panic_log_path = dirs::home_dir().map(|home| {
      home
        .join(".config")
        .join("sipsound")
        .join("sipsound_panic.log")
    });

    if let Some(path) = panic_log_path.as_ref() {
      if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
      }
      if let Ok(mut f) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
      {
        let _ = writeln!(f, "\n==== sipsound panic ====");
        let _ = writeln!(f, "{}", info);
        let _ = writeln!(f, "{:?}", Backtrace::new());
      }
      eprintln!("A crash log was written to: {}", path.to_string_lossy());
    }
    default_hook(info);
  }));
}

#[tokio::main]
async fn start_tokio(io_rx: std::sync::mpsc::Receiver<IoEvent>, network: &mut Network) {
  while let Ok(io_event) = io_rx.recv() {
    network.handle_network_event(io_event).await;
  }
}

/// Lyric state tied to one (track, fullscreen) stretch: created when the
/// fullscreen view opens, torn down on close or track change so a stale
/// timeline never keeps running.
struct LyricSession {
  track_key: String,
  view: LyricView,
  has_lyrics: bool,
}

fn track_key(track: &model::Track) -> String {
  track.id.clone().unwrap_or_else(|| track.title.clone())
}

fn timeline_for(track: &model::Track) -> (LyricTimeline, bool) {
  match &track.lyrics {
    Some(Lyrics::Lines(lines)) => (LyricTimeline::new(lyrics::rows_from_lines(lines)), true),
    Some(Lyrics::Lrc(text)) => {
      let parsed = lyrics::parse_lrc(text);
      if parsed.rows.is_empty() {
        (LyricTimeline::new(lyrics::placeholder_rows()), false)
      } else {
        (LyricTimeline::new(parsed.rows), true)
      }
    }
    None => (LyricTimeline::new(lyrics::placeholder_rows()), false),
  }
}

fn open_lyric_session(player: &mut Player) -> Option<LyricSession> {
  let track = player.current_track.clone()?;
  let (timeline, has_lyrics) = timeline_for(&track);
  if !has_lyrics {
    if let Some(id) = track.id.clone() {
      player.dispatch(IoEvent::GetTrackLyrics(id));
    }
  }
  if !track.image.is_empty() {
    player.dispatch(IoEvent::FetchCover(track.id.clone(), track.image.clone()));
  }
  Some(LyricSession {
    track_key: track_key(&track),
    view: LyricView::new(timeline),
    has_lyrics,
  })
}

/// Keep the session in step with the player: open on fullscreen, drop on
/// close or track change, rebuild once lyrics arrive for a placeholder.
fn sync_lyric_session(player: &mut Player, session: &mut Option<LyricSession>) {
  if !player.is_fullscreen {
    *session = None;
    return;
  }
  let Some(track) = player.current_track.clone() else {
    *session = None;
    return;
  };
  let key = track_key(&track);
  let stale = match session {
    Some(s) => s.track_key != key,
    None => true,
  };
  if stale {
    *session = open_lyric_session(player);
    return;
  }
  if let Some(s) = session {
    if !s.has_lyrics && track.lyrics.is_some() {
      let (timeline, has_lyrics) = timeline_for(&track);
      s.view = LyricView::new(timeline);
      s.has_lyrics = has_lyrics;
    }
  }
}

fn render_status(player: &Player, session: Option<&LyricSession>) {
  let mut line = String::new();
  match &player.current_track {
    Some(track) => {
      let state = if player.is_playing { "▶" } else { "⏸" };
      line.push_str(&format!(
        "{} {} - {} [{}/{}]",
        state,
        track.title,
        track.artist,
        format_time(player.current_time),
        format_time(player.duration)
      ));
      if player.shuffle() {
        line.push_str(" 🔀");
      }
      if player.repeat {
        line.push_str(" 🔁");
      }
      if player.is_liked(track) {
        line.push_str(" ♥");
      }
    }
    None => line.push_str("No track selected"),
  }
  if let Some(session) = session {
    if let Some(row) = session.view.current_row() {
      if !row.text.is_empty() {
        line.push_str(&format!("  | {}", row.display_at(player.current_time)));
      }
    }
  }
  if let Some(message) = &player.status_message {
    line.push_str(&format!("  [{}]", message));
  }

  let mut out = stdout();
  let _ = execute!(
    out,
    cursor::MoveToColumn(0),
    Clear(ClearType::CurrentLine),
    Print(line)
  );
  let _ = out.flush();
}

fn main() -> Result<()> {
  setup_logging()?;
  info!("sipsound {} starting up", env!("CARGO_PKG_VERSION"));
  install_panic_hook();

  let clap_app = ClapApp::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .author(env!("CARGO_PKG_AUTHORS"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(
      Arg::new("tick-rate")
        .short('t')
        .long("tick-rate")
        .help("Set the tick rate (milliseconds): the lower the number the higher the FPS."),
    )
    .arg(
      Arg::new("config")
        .short('c')
        .long("config")
        .help("Specify configuration file path."),
    )
    .arg(
      Arg::new("server-url")
        .short('s')
        .long("server-url")
        .help("Streaming server base URL (overrides the config file)."),
    )
    .arg(
      Arg::new("no-audio")
        .long("no-audio")
        .action(clap::ArgAction::SetTrue)
        .help("Run without an audio device; playback time is simulated."),
    );

  let matches = clap_app.get_matches();

  let mut user_config = UserConfig::new();
  if let Some(config_file_path) = matches.get_one::<String>("config") {
    let config_file_path = PathBuf::from(config_file_path);
    user_config
      .path_to_config
      .replace(UserConfigPaths { config_file_path });
  }
  user_config.load_config()?;
  info!("user config loaded successfully");

  if let Some(tick_rate) = matches
    .get_one::<String>("tick-rate")
    .and_then(|tick_rate| tick_rate.parse::<u64>().ok())
  {
    if !(10..1000).contains(&tick_rate) {
      return Err(anyhow!("tick rate must be between 10 and 999 milliseconds"));
    }
    user_config.behavior.tick_rate_milliseconds = tick_rate;
  }
  if let Some(url) = matches.get_one::<String>("server-url") {
    user_config.server.url = url.clone();
  }

  let client = ApiClient::new(user_config.server.url.clone(), user_config.server.token.clone());

  let (sync_io_tx, sync_io_rx) = std::sync::mpsc::channel::<IoEvent>();

  let sink: Box<dyn audio::AudioSink> = if matches.get_flag("no-audio") {
    Box::new(audio::NullSink)
  } else {
    Box::new(audio::spawn_audio_thread())
  };

  let player = Arc::new(Mutex::new(Player::new(Some(sync_io_tx), sink)));
  {
    let mut player = player
      .lock()
      .map_err(|_| anyhow!("player state poisoned"))?;
    player.volume_step = user_config.behavior.volume_step_percent;
    player.dispatch(IoEvent::LoadTracks(TrackFilters::default()));
    player.dispatch(IoEvent::LoadLikedTracks);
  }

  let cloned_player = Arc::clone(&player);
  std::thread::spawn(move || {
    let mut network = Network::new(client, &cloned_player);
    start_tokio(sync_io_rx, &mut network);
  });

  terminal::enable_raw_mode()?;
  // without this the terminal never reports wheel events
  execute!(stdout(), EnableMouseCapture)?;
  let events = event::Events::new(user_config.behavior.tick_rate_milliseconds);
  let mut lyric_session: Option<LyricSession> = None;

  loop {
    match events.next()? {
      Event::Input(key) => {
        let mut player = player
          .lock()
          .map_err(|_| anyhow!("player state poisoned"))?;
        let in_lyrics = player.is_fullscreen && lyric_session.is_some();
        match key {
          Key::Esc if player.is_fullscreen => {
            player.is_fullscreen = false;
          }
          Key::PageUp if in_lyrics => {
            if let Some(session) = &mut lyric_session {
              session.view.browse(-1, Instant::now());
            }
          }
          Key::PageDown if in_lyrics => {
            if let Some(session) = &mut lyric_session {
              session.view.browse(1, Instant::now());
            }
          }
          Key::Enter if in_lyrics => {
            if let Some(session) = &mut lyric_session {
              let index = session.view.index();
              if let Some(target) = session.view.jump_to(index, Instant::now()) {
                player.seek(target);
              }
            }
          }
          _ => handlers::handler(key, &mut player),
        }
        if player.should_quit {
          break;
        }
      }
      Event::Scroll(delta) => {
        let player = player
          .lock()
          .map_err(|_| anyhow!("player state poisoned"))?;
        if player.is_fullscreen {
          if let Some(session) = &mut lyric_session {
            session.view.wheel(delta, Instant::now());
          }
        }
      }
      Event::Tick => {
        let mut player = player
          .lock()
          .map_err(|_| anyhow!("player state poisoned"))?;
        player.update_on_tick();
        sync_lyric_session(&mut player, &mut lyric_session);
        if let Some(session) = &mut lyric_session {
          let now = Instant::now();
          session.view.tick(now, player.current_time);
          // no real animation surface here; complete slides immediately
          session.view.on_transition_end();
        }
        render_status(&player, lyric_session.as_ref());
      }
    }
  }

  execute!(stdout(), DisableMouseCapture)?;
  terminal::disable_raw_mode()?;
  println!();
  Ok(())
}
