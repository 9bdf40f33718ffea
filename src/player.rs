//! The playback and queue controller.
//!
//! `Player` owns every piece of transport state: the current track, the
//! active list and cursor, the explicit queue, liked tracks, volume and
//! status messages, and the audio sink. The network layer holds it behind
//! `Arc<Mutex<..>>` and writes results back through the `apply_*` methods,
//! each of which guards against stale responses.

use crate::audio::AudioSink;
use crate::model::{
  normalize_lyric_lines, ActiveList, Lyrics, Track, DEFAULT_COVER_URL, DEFAULT_DURATION_SECS,
};
use crate::network::IoEvent;
use anyhow::anyhow;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// "Previous" restarts the current track once it has played past this.
const RESTART_THRESHOLD_SECS: f64 = 3.0;
/// Volume changes are only announced after drifting this far from the last
/// announcement (or at the extremes).
const VOLUME_ANNOUNCE_DELTA: i16 = 10;
const DEFAULT_VOLUME: u8 = 60;
const UNMUTE_FALLBACK_VOLUME: u8 = 50;
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(5);

/// Shuffle permutation with its own cursor, kept apart from the plain index
/// so switching shuffle off resumes order-based advancement in place.
#[derive(Clone, Debug)]
struct ShuffledView {
  tracks: Vec<Track>,
  cursor: usize,
}

/// Position within the active list, behind one seam whether shuffle is on
/// or not. All wrap-around and index bookkeeping lives here.
#[derive(Clone, Debug, Default)]
pub struct TrackCursor {
  index: usize,
  shuffled: Option<ShuffledView>,
}

impl TrackCursor {
  pub fn index(&self) -> usize {
    self.index
  }

  pub fn is_shuffled(&self) -> bool {
    self.shuffled.is_some()
  }

  /// The shuffled permutation, if one is active.
  pub fn shuffled_tracks(&self) -> Option<&[Track]> {
    self.shuffled.as_ref().map(|view| view.tracks.as_slice())
  }

  /// Build the shuffled permutation: the playing track pinned first, the
  /// rest permuted, cursor reset onto the pin.
  pub fn shuffle_on(&mut self, list: &[Track], current: Option<&Track>) {
    let mut rest: Vec<Track> = list.to_vec();
    let mut tracks = Vec::with_capacity(list.len());
    if let Some(current) = current {
      if let Some(pos) = rest.iter().position(|t| t.same_as(current)) {
        rest.remove(pos);
      }
      tracks.push(current.clone());
    }
    rest.shuffle(&mut thread_rng());
    tracks.extend(rest);
    self.shuffled = Some(ShuffledView { tracks, cursor: 0 });
  }

  pub fn shuffle_off(&mut self) {
    self.shuffled = None;
  }

  /// Step forward, wrapping at the end. Returns the track now under the
  /// cursor. The plain index is kept resolved even in shuffle mode.
  pub fn advance(&mut self, list: &[Track]) -> Option<Track> {
    if let Some(view) = &mut self.shuffled {
      if view.tracks.is_empty() {
        return None;
      }
      view.cursor = (view.cursor + 1) % view.tracks.len();
      let track = view.tracks[view.cursor].clone();
      self.index = list.iter().position(|t| t.same_as(&track)).unwrap_or(0);
      return Some(track);
    }
    if list.is_empty() {
      return None;
    }
    self.index = (self.index + 1) % list.len();
    Some(list[self.index].clone())
  }

  /// Step backward, wrapping to the end from index 0.
  pub fn retreat(&mut self, list: &[Track]) -> Option<Track> {
    if let Some(view) = &mut self.shuffled {
      if view.tracks.is_empty() {
        return None;
      }
      let len = view.tracks.len();
      view.cursor = (view.cursor + len - 1) % len;
      let track = view.tracks[view.cursor].clone();
      self.index = list.iter().position(|t| t.same_as(&track)).unwrap_or(0);
      return Some(track);
    }
    if list.is_empty() {
      return None;
    }
    self.index = if self.index == 0 {
      list.len() - 1
    } else {
      self.index - 1
    };
    Some(list[self.index].clone())
  }

  /// Point the cursor at `track` within `list`; unknown tracks resolve to
  /// the head rather than failing.
  pub fn jump_to(&mut self, track: &Track, list: &[Track]) {
    self.index = list.iter().position(|t| t.same_as(track)).unwrap_or(0);
    if let Some(view) = &mut self.shuffled {
      view.cursor = view
        .tracks
        .iter()
        .position(|t| t.same_as(track))
        .unwrap_or(0);
    }
  }

  /// Up to `count` tracks that would play after the current one, in the
  /// order the cursor would visit them.
  pub fn peek_next(&self, list: &[Track], count: usize) -> Vec<Track> {
    let (tracks, at) = match &self.shuffled {
      Some(view) => (view.tracks.as_slice(), view.cursor),
      None => (list, self.index),
    };
    if tracks.len() < 2 {
      return Vec::new();
    }
    let count = count.min(tracks.len() - 1);
    (1..=count)
      .map(|k| tracks[(at + k) % tracks.len()].clone())
      .collect()
  }
}

pub struct Player {
  pub current_track: Option<Track>,
  pub active_list: ActiveList,
  pub cursor: TrackCursor,
  pub is_playing: bool,
  pub is_fullscreen: bool,
  pub current_time: f64,
  pub duration: f64,
  pub volume: u8,
  last_unmuted_volume: u8,
  last_volume_announce: u8,
  pub repeat: bool,
  pub queue: Vec<Track>,
  pub api_tracks: Vec<Track>,
  pub liked_tracks: Vec<Track>,
  pub liked_ids: HashSet<String>,
  pub playlist_tracks: Vec<Track>,
  pub is_loading_tracks: bool,
  pub status_message: Option<String>,
  status_message_expires_at: Option<Instant>,
  pub lyrics_accent: Option<(u8, u8, u8)>,
  /// Transport shortcuts are suppressed while a text field has focus.
  pub input_active: bool,
  pub volume_step: u8,
  io_tx: Option<Sender<IoEvent>>,
  pub sink: Box<dyn AudioSink>,
  pub should_quit: bool,
  last_tick: Option<Instant>,
}

impl Player {
  pub fn new(io_tx: Option<Sender<IoEvent>>, mut sink: Box<dyn AudioSink>) -> Self {
    sink.set_volume(DEFAULT_VOLUME);
    Player {
      current_track: None,
      active_list: ActiveList::default(),
      cursor: TrackCursor::default(),
      is_playing: false,
      is_fullscreen: false,
      current_time: 0.0,
      duration: DEFAULT_DURATION_SECS,
      volume: DEFAULT_VOLUME,
      last_unmuted_volume: DEFAULT_VOLUME,
      last_volume_announce: DEFAULT_VOLUME,
      repeat: false,
      queue: Vec::new(),
      api_tracks: Vec::new(),
      liked_tracks: Vec::new(),
      liked_ids: HashSet::new(),
      playlist_tracks: Vec::new(),
      is_loading_tracks: false,
      status_message: None,
      status_message_expires_at: None,
      lyrics_accent: None,
      input_active: false,
      volume_step: 5,
      io_tx,
      sink,
      should_quit: false,
      last_tick: None,
    }
  }

  /// Hand an IO request to the network thread.
  pub fn dispatch(&mut self, action: IoEvent) {
    if let Some(tx) = &self.io_tx {
      if let Err(e) = tx.send(action) {
        log::error!("network channel closed: {}", e);
        self.notify("Network unavailable");
      }
    }
  }

  pub fn handle_error(&mut self, e: anyhow::Error) {
    log::error!("{:?}", e);
    self.notify(&format!("Error: {}", e));
  }

  /// Show a short-lived status message.
  pub fn notify(&mut self, message: &str) {
    self.status_message = Some(message.to_string());
    self.status_message_expires_at = Some(Instant::now() + STATUS_MESSAGE_TTL);
  }

  pub fn active_tracks(&self) -> &[Track] {
    match self.active_list {
      ActiveList::ApiTracks => &self.api_tracks,
      ActiveList::LikedSongs => &self.liked_tracks,
      ActiveList::Playlist(_) => &self.playlist_tracks,
    }
  }

  pub fn shuffle(&self) -> bool {
    self.cursor.is_shuffled()
  }

  /// Make `track` current and start playing it from zero. List lookup,
  /// lyric normalization and cover/duration defaults happen here; detail
  /// hydration and audio fetching go out asynchronously and only ever
  /// augment what is already known.
  pub fn set_current_track(&mut self, mut track: Track, list_name: Option<&str>) {
    track.lyrics = match track.lyrics.take() {
      Some(Lyrics::Lines(lines)) => {
        let lines = normalize_lyric_lines(lines);
        if lines.is_empty() {
          None
        } else {
          Some(Lyrics::Lines(lines))
        }
      }
      other => other,
    };
    if track.image.trim().is_empty() {
      track.image = DEFAULT_COVER_URL.to_string();
    }
    if track.duration <= 0.0 {
      track.duration = DEFAULT_DURATION_SECS;
    }

    if let Some(name) = list_name {
      track.playlist_title = Some(name.to_string());
      self.active_list = ActiveList::from_name(name);
    }

    let list = self.active_tracks().to_vec();
    self.cursor.jump_to(&track, &list);

    self.duration = track.duration;
    self.current_time = 0.0;
    self.is_playing = true;
    self.sink.detach();

    if let Some(url) = track.audio_url.clone() {
      self.dispatch(IoEvent::FetchAudio(track.id.clone(), url));
    } else if let Some(id) = track.id.clone() {
      self.dispatch(IoEvent::ResolveStreamUrl(id));
    }
    if let Some(id) = track.id.clone() {
      self.dispatch(IoEvent::GetTrackDetail(id));
    }

    self.current_track = Some(track);
  }

  /// Queue head wins over any list; otherwise advance the cursor through
  /// the active list, wrapping at the end.
  pub fn next_track(&mut self) {
    if !self.queue.is_empty() {
      let track = self.queue.remove(0);
      self.set_current_track(track, None);
      return;
    }
    let list = self.active_tracks().to_vec();
    if list.is_empty() {
      return;
    }
    if let Some(track) = self.cursor.advance(&list) {
      let name = self.active_list.name().to_string();
      self.set_current_track(track, Some(&name));
    }
  }

  /// Restart the current track when it is more than a few seconds in (or
  /// when there is nowhere to go back to); otherwise step to the prior
  /// track, wrapping to the end from the head.
  pub fn previous_track(&mut self) {
    if self.current_time > RESTART_THRESHOLD_SECS {
      self.seek(0.0);
      return;
    }
    let list = self.active_tracks().to_vec();
    if list.len() <= 1 {
      self.seek(0.0);
      return;
    }
    if let Some(track) = self.cursor.retreat(&list) {
      let name = self.active_list.name().to_string();
      self.set_current_track(track, Some(&name));
    }
  }

  pub fn toggle_shuffle(&mut self) {
    if self.cursor.is_shuffled() {
      self.cursor.shuffle_off();
    } else {
      let list = self.active_tracks().to_vec();
      let current = self.current_track.clone();
      self.cursor.shuffle_on(&list, current.as_ref());
    }
  }

  pub fn toggle_repeat(&mut self) {
    self.repeat = !self.repeat;
  }

  pub fn toggle_play(&mut self) {
    self.is_playing = !self.is_playing;
    if self.sink.has_source() {
      if self.is_playing {
        self.sink.play();
      } else {
        self.sink.pause();
      }
    }
  }

  pub fn seek(&mut self, time: f64) {
    let clamped = time.clamp(0.0, self.duration.max(0.0));
    self.current_time = clamped;
    if self.sink.has_source() {
      self.sink.seek(clamped);
    }
  }

  pub fn set_volume(&mut self, volume: u8) {
    self.volume = volume.min(100);
    if self.volume > 0 {
      self.last_unmuted_volume = self.volume;
    }
    self.sink.set_volume(self.volume);
  }

  /// Volume up/down with throttled announcements: only when the level has
  /// moved 10 points since the last announcement, or hits an extreme.
  pub fn step_volume(&mut self, delta: i16) {
    let next = (i16::from(self.volume) + delta).clamp(0, 100) as u8;
    if next == self.volume {
      return;
    }
    self.set_volume(next);
    let drift = (i16::from(next) - i16::from(self.last_volume_announce)).abs();
    if drift >= VOLUME_ANNOUNCE_DELTA || next == 0 || next == 100 {
      self.notify(&format!("Volume: {}%", next));
      self.last_volume_announce = next;
    }
  }

  /// Mute to zero, unmute back to the remembered level.
  pub fn toggle_mute(&mut self) {
    if self.volume > 0 {
      self.last_unmuted_volume = self.volume;
      self.volume = 0;
      self.sink.set_volume(0);
      self.notify("Muted");
    } else {
      let level = if self.last_unmuted_volume > 0 {
        self.last_unmuted_volume
      } else {
        UNMUTE_FALLBACK_VOLUME
      };
      self.set_volume(level);
      self.notify("Unmuted");
    }
  }

  fn resolve_track(&self, key: &str) -> Option<Track> {
    let candidates = || {
      self
        .current_track
        .iter()
        .chain(self.liked_tracks.iter())
        .chain(self.api_tracks.iter())
    };
    candidates()
      .find(|t| t.id.as_deref() == Some(key))
      .or_else(|| candidates().find(|t| t.title == key))
      .cloned()
  }

  /// Toggle liked state for the track matching `key` (id first, title as
  /// legacy fallback). Likes are keyed by backend id; a track without one
  /// cannot be liked. The local update is optimistic and not rolled back
  /// on API failure.
  pub fn toggle_like(&mut self, key: &str) {
    let Some(track) = self.resolve_track(key) else {
      self.handle_error(anyhow!("no track matching {:?}", key));
      return;
    };
    let Some(id) = track.id.clone() else {
      self.handle_error(anyhow!("track {:?} has no id, cannot like it", track.title));
      return;
    };
    if self.liked_ids.contains(&id) {
      self.liked_ids.remove(&id);
      self
        .liked_tracks
        .retain(|t| t.id.as_deref() != Some(id.as_str()));
      self.notify("Removed from Liked Songs");
      self.dispatch(IoEvent::UnlikeTrack(id));
    } else {
      self.liked_ids.insert(id.clone());
      self.liked_tracks.push(track);
      self.notify("Added to Liked Songs");
      self.dispatch(IoEvent::LikeTrack(id));
    }
  }

  pub fn is_liked(&self, track: &Track) -> bool {
    track
      .id
      .as_deref()
      .map(|id| self.liked_ids.contains(id))
      .unwrap_or(false)
  }

  // ---- queue ----

  pub fn add_to_queue(&mut self, track: Track) {
    self.queue.push(track);
  }

  pub fn remove_from_queue(&mut self, index: usize) {
    if index < self.queue.len() {
      self.queue.remove(index);
    }
  }

  pub fn clear_queue(&mut self) {
    self.queue.clear();
  }

  /// What plays next: queue head first, then the active list continuing
  /// from the cursor.
  pub fn upcoming(&self, limit: usize) -> Vec<Track> {
    let mut out: Vec<Track> = self.queue.iter().take(limit).cloned().collect();
    if out.len() < limit {
      let list = self.active_tracks();
      out.extend(self.cursor.peek_next(list, limit - out.len()));
    }
    out
  }

  // ---- async write-backs (network thread) ----

  pub fn set_api_tracks(&mut self, tracks: Vec<Track>) {
    self.api_tracks = tracks;
    self.is_loading_tracks = false;
  }

  pub fn set_liked_tracks(&mut self, tracks: Vec<Track>) {
    self.liked_ids = tracks.iter().filter_map(|t| t.id.clone()).collect();
    self.liked_tracks = tracks;
  }

  /// Merge hydrated detail into the current track. Dropped entirely when
  /// the user has moved on to another track; present fields only ever fill
  /// in or refresh, absent ones never erase.
  pub fn apply_track_detail(&mut self, id: &str, patch: Track, is_liked: Option<bool>) {
    let mut new_duration = None;
    let fetch_audio = {
      let Some(current) = self.current_track.as_mut() else {
        return;
      };
      if current.id.as_deref() != Some(id) {
        log::debug!("discarding stale detail for {}", id);
        return;
      }
      if !patch.title.trim().is_empty() {
        current.title = patch.title;
      }
      if !patch.artist.trim().is_empty() {
        current.artist = patch.artist;
      }
      if !patch.genre.trim().is_empty() {
        current.genre = patch.genre;
      }
      if !patch.image.trim().is_empty() {
        current.image = patch.image;
      }
      if patch.duration > 0.0 {
        current.duration = patch.duration;
        new_duration = Some(patch.duration);
      }
      if patch.lyrics.is_some() {
        current.lyrics = patch.lyrics;
      }
      if patch.plays_count.is_some() {
        current.plays_count = patch.plays_count;
      }
      if current.audio_url.is_none() && patch.audio_url.is_some() {
        current.audio_url = patch.audio_url;
        current
          .audio_url
          .clone()
          .map(|url| (current.id.clone(), url))
      } else {
        None
      }
    };
    if let Some(duration) = new_duration {
      self.duration = duration;
    }
    match is_liked {
      Some(true) => {
        self.liked_ids.insert(id.to_string());
      }
      Some(false) => {
        self.liked_ids.remove(id);
      }
      None => {}
    }
    if let Some((track_id, url)) = fetch_audio {
      self.dispatch(IoEvent::FetchAudio(track_id, url));
    }
  }

  /// A resolved stream URL for `id`; ignored when the selection changed.
  pub fn apply_stream_url(&mut self, id: &str, url: String) {
    let Some(current) = self.current_track.as_mut() else {
      return;
    };
    if current.id.as_deref() != Some(id) {
      return;
    }
    current.audio_url = Some(url.clone());
    self.dispatch(IoEvent::FetchAudio(Some(id.to_string()), url));
  }

  /// Separately-fetched lyrics for `id`.
  pub fn apply_lyrics(&mut self, id: &str, lyrics: Lyrics) {
    if let Some(current) = self.current_track.as_mut() {
      if current.id.as_deref() == Some(id) {
        current.lyrics = Some(lyrics);
      }
    }
  }

  /// Fetched audio bytes ready to decode. Attaches at the current position
  /// so a track that started on the simulated clock picks up seamlessly.
  pub fn attach_audio(&mut self, id: Option<&str>, bytes: Vec<u8>) {
    let Some(current) = &self.current_track else {
      return;
    };
    if let Some(id) = id {
      if current.id.as_deref() != Some(id) {
        return;
      }
    }
    let start_at = self.current_time;
    let paused = !self.is_playing;
    self.sink.attach(bytes, start_at, paused);
  }

  pub fn set_accent(&mut self, id: Option<&str>, rgb: (u8, u8, u8)) {
    if let (Some(id), Some(current)) = (id, &self.current_track) {
      if current.id.as_deref() != Some(id) {
        return;
      }
    }
    self.lyrics_accent = Some(rgb);
  }

  // ---- clock ----

  /// Per-tick upkeep: expire the status message, surface sink failures,
  /// and advance the position from whichever clock is live (the sink when
  /// a source is attached, elapsed wall time otherwise).
  pub fn update_on_tick(&mut self) {
    self.tick_at(Instant::now());
  }

  /// Tick cadence is user-configurable and input can delay ticks, so the
  /// simulated clock advances by the measured gap since the previous tick,
  /// never by a fixed per-tick amount.
  pub fn tick_at(&mut self, now: Instant) {
    let elapsed = self
      .last_tick
      .map(|t| now.duration_since(t).as_secs_f64())
      .unwrap_or(0.0);
    self.last_tick = Some(now);

    if let Some(expiry) = self.status_message_expires_at {
      if now >= expiry {
        self.status_message = None;
        self.status_message_expires_at = None;
      }
    }
    if self.sink.take_failed() {
      self.is_playing = false;
      self.notify("Playback error");
    }
    if self.current_track.is_none() {
      return;
    }
    if self.sink.has_source() {
      if let Some(pos) = self.sink.position() {
        self.current_time = pos;
      }
      if self.sink.take_finished() {
        self.handle_track_ended();
      }
    } else if self.is_playing {
      self.current_time += elapsed;
      if self.current_time >= self.duration {
        self.handle_track_ended();
      }
    }
  }

  fn handle_track_ended(&mut self) {
    if self.repeat {
      self.current_time = 0.0;
      if self.sink.has_source() {
        self.sink.seek(0.0);
        self.sink.play();
      }
      self.is_playing = true;
      return;
    }
    if self.queue.is_empty() && self.active_tracks().len() <= 1 {
      self.is_playing = false;
      self.current_time = self.duration;
      return;
    }
    self.next_track();
  }
}
