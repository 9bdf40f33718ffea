use serde::Deserialize;
use std::cmp::Ordering;

/// Duration assumed for tracks whose real length is unknown (3:45).
pub const DEFAULT_DURATION_SECS: f64 = 225.0;

/// Cover shown for tracks that come without artwork.
pub const DEFAULT_COVER_URL: &str =
  "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=400";

/// A single timed lyric line.
#[derive(Clone, Debug, PartialEq)]
pub struct LyricLine {
  pub time: f64,
  pub text: String,
}

impl LyricLine {
  pub fn new(time: f64, text: impl Into<String>) -> Self {
    LyricLine {
      time,
      text: text.into(),
    }
  }
}

/// Normalize raw lyric lines into the only shape the synchronizer consumes:
/// blank lines dropped, non-finite times coerced to zero, sorted ascending.
/// Normalizing an already-normalized list is a no-op.
pub fn normalize_lyric_lines(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
  lines.retain(|line| !line.text.trim().is_empty());
  for line in &mut lines {
    if !line.time.is_finite() {
      line.time = 0.0;
    }
  }
  lines.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
  lines
}

/// Lyric payload attached to a track: either pre-structured timed lines or a
/// raw LRC text blob that still needs parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum Lyrics {
  Lines(Vec<LyricLine>),
  Lrc(String),
}

/// A playable unit. Tracks created ad hoc (mock data, AI-DJ sessions) have no
/// stable `id`; only tracks with an id can be liked or hydrated from the API.
#[derive(Clone, Debug, Default)]
pub struct Track {
  pub id: Option<String>,
  pub title: String,
  pub artist: String,
  pub image: String,
  pub genre: String,
  /// Seconds; `<= 0.0` means unknown.
  pub duration: f64,
  pub lyrics: Option<Lyrics>,
  /// Name of the collection this track was started from, used to decide
  /// which list to advance through.
  pub playlist_title: Option<String>,
  pub audio_url: Option<String>,
  pub plays_count: Option<u64>,
}

impl Track {
  /// Identity check: by id when both sides carry one, by title otherwise
  /// (legacy tracks without backend ids).
  pub fn same_as(&self, other: &Track) -> bool {
    match (&self.id, &other.id) {
      (Some(a), Some(b)) => a == b,
      _ => self.title == other.title,
    }
  }
}

/// Which collection `next_track`/`previous_track` advance through. Replaces
/// name-string matching scattered across call sites with a tagged variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActiveList {
  ApiTracks,
  LikedSongs,
  Playlist(String),
}

impl Default for ActiveList {
  fn default() -> Self {
    ActiveList::ApiTracks
  }
}

pub const API_TRACKS_LIST: &str = "API Tracks";
pub const LIKED_SONGS_LIST: &str = "Liked Songs";

impl ActiveList {
  pub fn from_name(name: &str) -> Self {
    match name {
      API_TRACKS_LIST => ActiveList::ApiTracks,
      LIKED_SONGS_LIST => ActiveList::LikedSongs,
      other => ActiveList::Playlist(other.to_string()),
    }
  }

  pub fn name(&self) -> &str {
    match self {
      ActiveList::ApiTracks => API_TRACKS_LIST,
      ActiveList::LikedSongs => LIKED_SONGS_LIST,
      ActiveList::Playlist(name) => name,
    }
  }
}

/// `m:ss` display form used in the status line.
pub fn format_time(seconds: f64) -> String {
  let total = seconds.max(0.0) as u64;
  format!("{}:{:02}", total / 60, total % 60)
}

// ---- REST payload shapes (as served by the backend) ----

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrack {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub artist_name: Option<String>,
  /// Older payloads carry the artist under this key instead.
  #[serde(default)]
  pub artist: Option<String>,
  #[serde(default)]
  pub album_name: Option<String>,
  #[serde(default)]
  pub genre: Option<String>,
  #[serde(default)]
  pub duration: Option<f64>,
  #[serde(default)]
  pub audio_url: Option<String>,
  #[serde(default)]
  pub audio_path: Option<String>,
  #[serde(default)]
  pub cover_url: Option<String>,
  #[serde(default)]
  pub cover_path: Option<String>,
  #[serde(default)]
  pub lyrics: Option<serde_json::Value>,
  #[serde(default)]
  pub plays_count: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  #[serde(default)]
  pub page: u32,
  #[serde(default)]
  pub limit: u32,
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub total_pages: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TracksResponse {
  #[serde(default)]
  pub tracks: Vec<ApiTrack>,
  #[serde(default)]
  pub pagination: Option<Pagination>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetailResponse {
  pub track: ApiTrack,
  #[serde(default)]
  pub is_liked: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUrlResponse {
  pub url: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub artist: String,
  #[serde(default)]
  pub is_local: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LyricsResponse {
  pub lyrics: serde_json::Value,
  #[serde(default)]
  pub source: Option<String>,
}

/// Filter/sort/paging options for the bulk track listing.
#[derive(Clone, Debug, Default)]
pub struct TrackFilters {
  pub genre: Option<String>,
  pub artist: Option<String>,
  pub search: Option<String>,
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub sort_by: Option<String>,
  pub sort_order: Option<String>,
}

/// Lyrics arrive from the API either as a JSON array of `{time, text}`
/// rows, as `{lines: [...]}`, or as a raw LRC string.
pub fn lyrics_from_json(value: &serde_json::Value) -> Option<Lyrics> {
  if let Some(text) = value.as_str() {
    if text.trim().is_empty() {
      return None;
    }
    return Some(Lyrics::Lrc(text.to_string()));
  }

  let rows = value
    .as_array()
    .or_else(|| value.get("lines").and_then(|v| v.as_array()))?;

  let lines: Vec<LyricLine> = rows
    .iter()
    .filter_map(|row| {
      let time = row.get("time").and_then(|t| t.as_f64())?;
      let text = row.get("text").and_then(|t| t.as_str())?;
      Some(LyricLine::new(time, text))
    })
    .collect();

  if lines.is_empty() {
    None
  } else {
    Some(Lyrics::Lines(normalize_lyric_lines(lines)))
  }
}
