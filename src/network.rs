//! Async IO layer: a thin REST client plus the dispatcher that runs on the
//! network thread and writes results back into the shared `Player`.
//!
//! Failure policy: hydration, lyric, liked-list and cover failures degrade
//! silently (logged only); stream-URL resolution, like/unlike and audio
//! fetch failures surface a status message. Like failures keep the
//! optimistic local state; the next liked-list refresh reconciles.

use crate::lyrics;
use crate::media::resolve_media_url;
use crate::model::{
  lyrics_from_json, ApiTrack, Track, TrackDetailResponse, TrackFilters, TracksResponse,
};
use crate::player::Player;
use anyhow::{anyhow, Context, Result};
use std::sync::{Arc, Mutex};

/// Requests the player hands to the network thread.
#[derive(Debug)]
pub enum IoEvent {
  LoadTracks(TrackFilters),
  LoadLikedTracks,
  GetTrackDetail(String),
  ResolveStreamUrl(String),
  /// Fetch encoded audio from a resolved URL; the id ties the bytes to the
  /// track they were requested for.
  FetchAudio(Option<String>, String),
  GetTrackLyrics(String),
  LikeTrack(String),
  UnlikeTrack(String),
  /// Fetch cover bytes and derive the lyric accent color.
  FetchCover(Option<String>, String),
}

/// REST client for the streaming server.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(base_url: String, token: Option<String>) -> Self {
    ApiClient {
      http: reqwest::Client::new(),
      base_url: base_url.trim_end_matches('/').to_string(),
      token,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn get(&self, path: &str) -> reqwest::RequestBuilder {
    self.authorize(self.http.get(format!("{}{}", self.base_url, path)))
  }

  fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  pub async fn get_tracks(&self, filters: &TrackFilters) -> Result<TracksResponse> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(genre) = &filters.genre {
      query.push(("genre", genre.clone()));
    }
    if let Some(artist) = &filters.artist {
      query.push(("artist", artist.clone()));
    }
    if let Some(search) = &filters.search {
      query.push(("search", search.clone()));
    }
    if let Some(page) = filters.page {
      query.push(("page", page.to_string()));
    }
    if let Some(limit) = filters.limit {
      query.push(("limit", limit.to_string()));
    }
    if let Some(sort_by) = &filters.sort_by {
      query.push(("sortBy", sort_by.clone()));
    }
    if let Some(sort_order) = &filters.sort_order {
      query.push(("sortOrder", sort_order.clone()));
    }
    let response = self
      .get("/api/tracks")
      .query(&query)
      .send()
      .await?
      .error_for_status()?;
    Ok(response.json().await?)
  }

  pub async fn get_track_by_id(&self, id: &str) -> Result<TrackDetailResponse> {
    let response = self
      .get(&format!("/api/tracks/{}", id))
      .send()
      .await?
      .error_for_status()?;
    Ok(response.json().await?)
  }

  pub async fn get_track_stream_url(&self, id: &str) -> Result<crate::model::StreamUrlResponse> {
    let response = self
      .get(&format!("/api/tracks/{}/stream", id))
      .send()
      .await?
      .error_for_status()?;
    Ok(response.json().await?)
  }

  pub async fn get_track_lyrics(&self, id: &str) -> Result<crate::model::LyricsResponse> {
    let response = self
      .get(&format!("/api/tracks/{}/lyrics", id))
      .send()
      .await?
      .error_for_status()?;
    Ok(response.json().await?)
  }

  pub async fn like_track(&self, id: &str) -> Result<()> {
    self
      .authorize(
        self
          .http
          .post(format!("{}/api/tracks/{}/like", self.base_url, id)),
      )
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  pub async fn unlike_track(&self, id: &str) -> Result<()> {
    self
      .authorize(
        self
          .http
          .delete(format!("{}/api/tracks/{}/like", self.base_url, id)),
      )
      .send()
      .await?
      .error_for_status()?;
    Ok(())
  }

  pub async fn get_liked_tracks(&self) -> Result<TracksResponse> {
    let response = self
      .get("/api/users/me/liked-tracks")
      .send()
      .await?
      .error_for_status()?;
    Ok(response.json().await?)
  }

  /// Raw byte fetch for audio and cover art. `url` is already absolute.
  pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
    let response = self
      .authorize(self.http.get(url))
      .send()
      .await?
      .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
  }
}

/// Convert an API payload into the player's track shape, resolving storage
/// paths into servable URLs.
pub fn track_from_api(api: ApiTrack, base_url: &str, list_name: &str) -> Track {
  let image = api
    .cover_url
    .as_deref()
    .or(api.cover_path.as_deref())
    .and_then(|p| resolve_media_url(base_url, p))
    .unwrap_or_default();
  let audio_url = api
    .audio_url
    .as_deref()
    .or(api.audio_path.as_deref())
    .and_then(|p| resolve_media_url(base_url, p));
  let lyrics = api.lyrics.as_ref().and_then(lyrics_from_json);
  Track {
    id: Some(api.id),
    title: api.title,
    artist: api
      .artist_name
      .or(api.artist)
      .unwrap_or_else(|| "Unknown".to_string()),
    image,
    genre: api.genre.unwrap_or_else(|| "Unknown".to_string()),
    duration: api.duration.unwrap_or(0.0),
    lyrics,
    playlist_title: Some(list_name.to_string()),
    audio_url,
    plays_count: api.plays_count,
  }
}

pub struct Network {
  pub client: ApiClient,
  pub player: Arc<Mutex<Player>>,
}

impl Network {
  pub fn new(client: ApiClient, player: &Arc<Mutex<Player>>) -> Self {
    Network {
      client,
      player: Arc::clone(player),
    }
  }

  fn with_player(&self, f: impl FnOnce(&mut Player)) {
    if let Ok(mut player) = self.player.lock() {
      f(&mut player);
    }
  }

  fn handle_error(&self, e: anyhow::Error) {
    self.with_player(|player| player.handle_error(e));
  }

  pub async fn handle_network_event(&mut self, io_event: IoEvent) {
    match io_event {
      IoEvent::LoadTracks(filters) => self.load_tracks(filters).await,
      IoEvent::LoadLikedTracks => self.load_liked_tracks().await,
      IoEvent::GetTrackDetail(id) => self.get_track_detail(id).await,
      IoEvent::ResolveStreamUrl(id) => self.resolve_stream_url(id).await,
      IoEvent::FetchAudio(id, url) => self.fetch_audio(id, url).await,
      IoEvent::GetTrackLyrics(id) => self.get_track_lyrics(id).await,
      IoEvent::LikeTrack(id) => self.like_track(id).await,
      IoEvent::UnlikeTrack(id) => self.unlike_track(id).await,
      IoEvent::FetchCover(id, url) => self.fetch_cover(id, url).await,
    }
  }

  async fn load_tracks(&mut self, filters: TrackFilters) {
    self.with_player(|player| player.is_loading_tracks = true);
    match self.client.get_tracks(&filters).await {
      Ok(response) => {
        let base = self.client.base_url().to_string();
        let tracks = response
          .tracks
          .into_iter()
          .map(|t| track_from_api(t, &base, crate::model::API_TRACKS_LIST))
          .collect();
        self.with_player(|player| player.set_api_tracks(tracks));
      }
      Err(e) => {
        self.with_player(|player| player.is_loading_tracks = false);
        self.handle_error(anyhow!(e).context("failed to load tracks"));
      }
    }
  }

  async fn load_liked_tracks(&mut self) {
    match self.client.get_liked_tracks().await {
      Ok(response) => {
        let base = self.client.base_url().to_string();
        let tracks = response
          .tracks
          .into_iter()
          .map(|t| track_from_api(t, &base, crate::model::LIKED_SONGS_LIST))
          .collect();
        self.with_player(|player| player.set_liked_tracks(tracks));
      }
      Err(e) => {
        // Non-critical seed data; keep whatever is already loaded.
        log::warn!("failed to load liked tracks: {}", e);
      }
    }
  }

  async fn get_track_detail(&mut self, id: String) {
    match self.client.get_track_by_id(&id).await {
      Ok(detail) => {
        let base = self.client.base_url().to_string();
        let is_liked = detail.is_liked;
        let patch = track_from_api(detail.track, &base, crate::model::API_TRACKS_LIST);
        self.with_player(|player| player.apply_track_detail(&id, patch, Some(is_liked)));
      }
      Err(e) => {
        log::warn!("track detail hydration failed for {}: {}", id, e);
      }
    }
  }

  async fn resolve_stream_url(&mut self, id: String) {
    match self.client.get_track_stream_url(&id).await {
      Ok(resolved) => {
        let base = self.client.base_url().to_string();
        match resolve_media_url(&base, &resolved.url) {
          Some(url) => self.with_player(|player| player.apply_stream_url(&id, url)),
          None => self.handle_error(anyhow!("empty stream url for track {}", id)),
        }
      }
      Err(e) => {
        self.handle_error(anyhow!(e).context("could not resolve a stream url"));
      }
    }
  }

  async fn fetch_audio(&mut self, id: Option<String>, url: String) {
    match self.client.fetch_bytes(&url).await {
      Ok(bytes) => {
        self.with_player(|player| player.attach_audio(id.as_deref(), bytes));
      }
      Err(e) => {
        self.handle_error(anyhow!(e).context("audio download failed"));
      }
    }
  }

  async fn get_track_lyrics(&mut self, id: String) {
    match self.client.get_track_lyrics(&id).await {
      Ok(response) => {
        if let Some(parsed) = lyrics_from_json(&response.lyrics) {
          self.with_player(|player| player.apply_lyrics(&id, parsed));
        }
      }
      Err(e) => {
        log::warn!("lyrics fetch failed for {}: {}", id, e);
      }
    }
  }

  async fn like_track(&mut self, id: String) {
    if let Err(e) = self
      .client
      .like_track(&id)
      .await
      .context("like was not saved")
    {
      self.handle_error(e);
    }
  }

  async fn unlike_track(&mut self, id: String) {
    if let Err(e) = self
      .client
      .unlike_track(&id)
      .await
      .context("unlike was not saved")
    {
      self.handle_error(e);
    }
  }

  async fn fetch_cover(&mut self, id: Option<String>, url: String) {
    match self.client.fetch_bytes(&url).await {
      Ok(bytes) => {
        if let Some(rgb) = lyrics::accent_from_cover(&bytes) {
          self.with_player(|player| player.set_accent(id.as_deref(), rgb));
        }
      }
      Err(e) => {
        // Cosmetic only.
        log::debug!("cover fetch failed: {}", e);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn api_track(value: serde_json::Value) -> ApiTrack {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn track_from_api_resolves_storage_paths() {
    let api = api_track(json!({
      "id": "t1",
      "title": "Song",
      "artistName": "Someone",
      "coverPath": "storage/covers/t1.jpg",
      "audioPath": "storage/tracks/t1.mp3",
      "duration": 180.0
    }));
    let track = track_from_api(api, "http://localhost:3001", "API Tracks");
    assert_eq!(track.id.as_deref(), Some("t1"));
    assert_eq!(track.artist, "Someone");
    assert_eq!(
      track.image,
      "http://localhost:3001/api/tracks/file/cover/t1.jpg"
    );
    assert_eq!(
      track.audio_url.as_deref(),
      Some("http://localhost:3001/api/tracks/file/audio/t1.mp3")
    );
    assert_eq!(track.playlist_title.as_deref(), Some("API Tracks"));
  }

  #[test]
  fn track_from_api_prefers_urls_and_falls_back_to_legacy_artist() {
    let api = api_track(json!({
      "id": "t2",
      "title": "Other",
      "artist": "Legacy Name",
      "coverUrl": "https://cdn.example.com/c.jpg",
      "lyrics": [{ "time": 1.0, "text": "hi" }]
    }));
    let track = track_from_api(api, "http://localhost:3001", "API Tracks");
    assert_eq!(track.artist, "Legacy Name");
    assert_eq!(track.image, "https://cdn.example.com/c.jpg");
    assert!(track.lyrics.is_some());
    assert_eq!(track.duration, 0.0);
  }

  #[test]
  fn track_from_api_defaults_missing_fields() {
    let api = api_track(json!({ "id": "t3", "title": "Bare" }));
    let track = track_from_api(api, "http://localhost:3001", "Liked Songs");
    assert_eq!(track.artist, "Unknown");
    assert_eq!(track.genre, "Unknown");
    assert!(track.image.is_empty());
    assert!(track.audio_url.is_none());
  }
}
