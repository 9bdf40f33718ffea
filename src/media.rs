//! Maps stored media paths onto routes the server actually serves.
//!
//! Track rows persist raw storage paths like `storage/covers/foo.jpg`; the
//! files themselves are only reachable through API routes. Absolute URLs
//! (external artwork, CDN audio) pass through untouched.

fn file_name(path: &str) -> &str {
  path.rsplit('/').next().unwrap_or(path)
}

/// Resolve a stored path or URL into something fetchable, or `None` when the
/// input is empty.
pub fn resolve_media_url(base_url: &str, path: &str) -> Option<String> {
  let path = path.trim();
  if path.is_empty() {
    return None;
  }
  if path.starts_with("http://") || path.starts_with("https://") {
    return Some(path.to_string());
  }
  let base = base_url.trim_end_matches('/');
  if path.starts_with("/api/") {
    return Some(format!("{}{}", base, path));
  }
  if let Some(name) = path.strip_prefix("storage/covers/") {
    return Some(format!("{}/api/tracks/file/cover/{}", base, file_name(name)));
  }
  if let Some(name) = path.strip_prefix("storage/tracks/") {
    return Some(format!("{}/api/tracks/file/audio/{}", base, file_name(name)));
  }
  if let Some(name) = path.strip_prefix("storage/artists/") {
    return Some(format!("{}/api/artists/image/{}", base, file_name(name)));
  }
  if let Some(name) = path.strip_prefix("storage/playlist-covers/") {
    return Some(format!(
      "{}/api/playlists/file/cover/{}",
      base,
      file_name(name)
    ));
  }
  if path.starts_with('/') {
    Some(format!("{}{}", base, path))
  } else {
    Some(format!("{}/{}", base, path))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BASE: &str = "http://localhost:3001";

  #[test]
  fn absolute_urls_pass_through() {
    assert_eq!(
      resolve_media_url(BASE, "https://cdn.example.com/a.mp3").as_deref(),
      Some("https://cdn.example.com/a.mp3")
    );
  }

  #[test]
  fn storage_prefixes_map_to_api_routes() {
    assert_eq!(
      resolve_media_url(BASE, "storage/covers/abc.jpg").as_deref(),
      Some("http://localhost:3001/api/tracks/file/cover/abc.jpg")
    );
    assert_eq!(
      resolve_media_url(BASE, "storage/tracks/song.mp3").as_deref(),
      Some("http://localhost:3001/api/tracks/file/audio/song.mp3")
    );
    assert_eq!(
      resolve_media_url(BASE, "storage/artists/face.png").as_deref(),
      Some("http://localhost:3001/api/artists/image/face.png")
    );
    assert_eq!(
      resolve_media_url(BASE, "storage/playlist-covers/mix.jpg").as_deref(),
      Some("http://localhost:3001/api/playlists/file/cover/mix.jpg")
    );
  }

  #[test]
  fn api_paths_get_base_prefixed() {
    assert_eq!(
      resolve_media_url(BASE, "/api/tracks/stream/42").as_deref(),
      Some("http://localhost:3001/api/tracks/stream/42")
    );
  }

  #[test]
  fn nested_storage_paths_keep_only_the_file_name() {
    assert_eq!(
      resolve_media_url(BASE, "storage/covers/2024/01/abc.jpg").as_deref(),
      Some("http://localhost:3001/api/tracks/file/cover/abc.jpg")
    );
  }

  #[test]
  fn empty_path_is_none() {
    assert_eq!(resolve_media_url(BASE, ""), None);
    assert_eq!(resolve_media_url(BASE, "   "), None);
  }

  #[test]
  fn unknown_relative_paths_join_the_base() {
    assert_eq!(
      resolve_media_url(BASE, "/files/x.bin").as_deref(),
      Some("http://localhost:3001/files/x.bin")
    );
    assert_eq!(
      resolve_media_url("http://localhost:3001/", "files/x.bin").as_deref(),
      Some("http://localhost:3001/files/x.bin")
    );
  }
}
