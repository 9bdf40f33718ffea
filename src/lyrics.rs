//! Lyric parsing and playback-synchronized row tracking.
//!
//! Supports plain LRC line tags, multiple time tags per line, inline
//! `<mm:ss.xx>` word tokens for intra-row progress, and header metadata
//! tags with an `[offset:]` shift. The `LyricView` state machine keeps the
//! active row in lockstep with playback, except while the user is browsing
//! or a row transition is in flight.

use crate::model::LyricLine;
use std::time::{Duration, Instant};

/// Row slide animation length.
pub const TRANSITION_MS: u64 = 250;
/// A transition that never reports completion is force-finished after this.
pub const TRANSITION_TIMEOUT_MS: u64 = 450;
/// Manual browsing pins the view for this long before auto-sync resumes.
pub const BROWSE_GRACE_MS: u64 = 3000;
/// Nudge past row starts so boundary times land on the row that begins there.
pub const JUMP_EPSILON: f64 = 0.01;

/// Wheel deltas smaller than this are jitter.
const WHEEL_THRESHOLD: f64 = 8.0;

/// Open end for the final row; LRC gives no duration for it.
const LAST_ROW_END_SECS: f64 = 1_000_000.0;
/// Structured lines carry no end either; assume a reading window.
const STRUCTURED_TAIL_SECS: f64 = 5.0;

/// A timed word group inside a row.
#[derive(Clone, Debug, PartialEq)]
pub struct Seg {
  pub time: f64,
  pub text: String,
}

/// One display row of lyrics.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
  pub start: f64,
  pub end: f64,
  pub text: String,
  pub segments: Vec<Seg>,
}

impl Row {
  pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
    Row {
      start,
      end,
      text: text.into(),
      segments: Vec::new(),
    }
  }

  /// Fraction of this row's characters already sung at `time`, in `0..=1`.
  /// Inline segments give word-level resolution; otherwise the whole row
  /// progresses linearly between `start` and `end`.
  pub fn progress_at(&self, time: f64) -> f64 {
    let total = self.text.chars().count();
    if total == 0 {
      return 0.0;
    }
    if time <= self.start {
      return 0.0;
    }
    if time >= self.end {
      return 1.0;
    }
    if self.segments.is_empty() {
      let span = (self.end - self.start).max(0.001);
      return ((time - self.start) / span).clamp(0.0, 1.0);
    }
    let mut done = 0.0;
    for (j, seg) in self.segments.iter().enumerate() {
      let seg_end = self
        .segments
        .get(j + 1)
        .map(|next| next.time)
        .unwrap_or(self.end);
      let len = seg.text.chars().count() as f64;
      if time >= seg_end {
        done += len;
        continue;
      }
      if time <= seg.time {
        break;
      }
      let frac = ((time - seg.time) / (seg_end - seg.time).max(0.001)).clamp(0.0, 1.0);
      done += len * frac;
      break;
    }
    (done / total as f64).clamp(0.0, 1.0)
  }

  /// The row text with a caret between the sung and unsung parts.
  pub fn display_at(&self, time: f64) -> String {
    let chars: Vec<char> = self.text.chars().collect();
    let done = ((self.progress_at(time) * chars.len() as f64).round() as usize).min(chars.len());
    let sung: String = chars[..done].iter().collect();
    let rest: String = chars[done..].iter().collect();
    format!("{}▸{}", sung, rest)
  }
}

/// Header tags from the LRC preamble.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LrcMetadata {
  pub title: Option<String>,
  pub artist: Option<String>,
  pub album: Option<String>,
  pub by: Option<String>,
  pub offset_ms: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct ParsedLrc {
  pub metadata: LrcMetadata,
  pub rows: Vec<Row>,
}

/// Parse `mm:ss` or `mm:ss.frac` into seconds. A three-digit fraction is
/// milliseconds, shorter ones are hundredths.
fn parse_clock(s: &str) -> Option<f64> {
  let (min, rest) = s.split_once(':')?;
  if min.is_empty() || min.len() > 2 || !min.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let (sec, frac) = match rest.split_once('.') {
    Some((sec, frac)) => (sec, Some(frac)),
    None => (rest, None),
  };
  if sec.len() != 2 || !sec.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let minutes: f64 = min.parse().ok()?;
  let seconds: f64 = sec.parse().ok()?;
  let fraction = match frac {
    Some(f) => {
      if f.is_empty() || f.len() > 3 || !f.bytes().all(|b| b.is_ascii_digit()) {
        return None;
      }
      let value: f64 = f.parse().ok()?;
      value / if f.len() == 3 { 1000.0 } else { 100.0 }
    }
    None => 0.0,
  };
  Some(minutes * 60.0 + seconds + fraction)
}

/// Split inline `<mm:ss.xx>` tokens out of a row body. Returns the plain
/// display text and the timed segments; text before the first token starts
/// at the row's own time.
fn split_segments(rest: &str, start: f64) -> (String, Vec<Seg>) {
  let mut segments = Vec::new();
  let mut plain = String::new();
  let mut tcur = start;
  let mut pos = 0;
  let mut scan = 0;
  while let Some(open_rel) = rest[scan..].find('<') {
    let open = scan + open_rel;
    let close = match rest[open..].find('>') {
      Some(rel) => open + rel,
      None => break,
    };
    match parse_clock(&rest[open + 1..close]) {
      Some(t) => {
        if open > pos {
          let chunk = &rest[pos..open];
          segments.push(Seg {
            time: tcur,
            text: chunk.to_string(),
          });
          plain.push_str(chunk);
        }
        tcur = t;
        pos = close + 1;
        scan = pos;
      }
      None => scan = open + 1,
    }
  }
  if pos < rest.len() {
    let chunk = &rest[pos..];
    segments.push(Seg {
      time: tcur,
      text: chunk.to_string(),
    });
    plain.push_str(chunk);
  }
  (plain.trim().to_string(), segments)
}

fn apply_metadata(metadata: &mut LrcMetadata, key: &str, value: &str) {
  match key.to_ascii_lowercase().as_str() {
    "ti" => metadata.title = Some(value.to_string()),
    "ar" => metadata.artist = Some(value.to_string()),
    "al" => metadata.album = Some(value.to_string()),
    "by" => metadata.by = Some(value.to_string()),
    "offset" => metadata.offset_ms = value.trim().parse().ok(),
    _ => {}
  }
}

/// Parse an LRC text into display rows plus header metadata. Rows are sorted
/// by start time, each row ends where the next begins, the `[offset:]` shift
/// is applied, and lines whose body is empty after token stripping are
/// dropped.
pub fn parse_lrc(text: &str) -> ParsedLrc {
  let mut metadata = LrcMetadata::default();
  let mut rows: Vec<Row> = Vec::new();

  for raw in text.lines() {
    let line = raw.trim();
    if line.is_empty() {
      continue;
    }

    // Leading bracket tags: any mix of time tags, then the body.
    let mut times: Vec<f64> = Vec::new();
    let mut rest = line;
    loop {
      if !rest.starts_with('[') {
        break;
      }
      let close = match rest.find(']') {
        Some(i) => i,
        None => break,
      };
      let inner = &rest[1..close];
      if let Some(t) = parse_clock(inner) {
        times.push(t);
        rest = rest[close + 1..].trim_start();
        continue;
      }
      if times.is_empty() {
        if let Some((key, value)) = inner.split_once(':') {
          if !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphabetic()) {
            apply_metadata(&mut metadata, key, value);
          }
        }
      }
      break;
    }
    if times.is_empty() {
      continue;
    }

    for &start in &times {
      let (plain, segments) = split_segments(rest.trim(), start);
      if plain.is_empty() {
        continue;
      }
      rows.push(Row {
        start,
        end: LAST_ROW_END_SECS,
        text: plain,
        segments,
      });
    }
  }

  rows.sort_by(|a, b| {
    a.start
      .partial_cmp(&b.start)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  if let Some(offset_ms) = metadata.offset_ms {
    let shift = offset_ms as f64 / 1000.0;
    for row in &mut rows {
      row.start += shift;
      for seg in &mut row.segments {
        seg.time += shift;
      }
    }
  }

  for i in 0..rows.len().saturating_sub(1) {
    rows[i].end = rows[i + 1].start;
  }

  ParsedLrc { metadata, rows }
}

/// Build rows from already-structured timed lines. The caller normalizes
/// them first; the last row gets a fixed reading window instead of the open
/// LRC sentinel.
pub fn rows_from_lines(lines: &[LyricLine]) -> Vec<Row> {
  let mut rows: Vec<Row> = lines
    .iter()
    .map(|line| Row::new(line.time, LAST_ROW_END_SECS, line.text.clone()))
    .collect();
  let len = rows.len();
  for i in 0..len.saturating_sub(1) {
    rows[i].end = rows[i + 1].start;
  }
  if let Some(last) = rows.last_mut() {
    last.end = last.start + STRUCTURED_TAIL_SECS;
  }
  rows
}

/// Filler rows shown while a track has no lyrics at all.
pub fn placeholder_rows() -> Vec<Row> {
  vec![
    Row::new(0.0, LAST_ROW_END_SECS, "♪ Музыка играет ♪"),
    Row::new(5.0, LAST_ROW_END_SECS, ""),
    Row::new(10.0, LAST_ROW_END_SECS, "Текст песни появится здесь"),
    Row::new(15.0, LAST_ROW_END_SECS, ""),
    Row::new(20.0, LAST_ROW_END_SECS, "♪ ♪ ♪"),
  ]
}

/// Index of the first element strictly greater than `x`.
fn upper_bound(xs: &[f64], x: f64) -> usize {
  let mut lo = 0;
  let mut hi = xs.len();
  while lo < hi {
    let mid = (lo + hi) / 2;
    if xs[mid] <= x {
      lo = mid + 1;
    } else {
      hi = mid;
    }
  }
  lo
}

/// Rows plus their start times, indexed by playback position.
#[derive(Clone, Debug, Default)]
pub struct LyricTimeline {
  rows: Vec<Row>,
  times: Vec<f64>,
}

impl LyricTimeline {
  pub fn new(rows: Vec<Row>) -> Self {
    let times = rows.iter().map(|r| r.start).collect();
    LyricTimeline { rows, times }
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn row(&self, index: usize) -> Option<&Row> {
    self.rows.get(index)
  }

  pub fn rows(&self) -> &[Row] {
    &self.rows
  }

  /// The row active at playback time `t`: the last row whose start is at or
  /// before `t` (with the boundary nudge), clamped to the first row before
  /// any lyric has started.
  pub fn row_at(&self, t: f64) -> usize {
    let i = upper_bound(&self.times, t + JUMP_EPSILON);
    i.saturating_sub(1)
  }
}

/// An in-flight row change.
#[derive(Clone, Copy, Debug)]
pub struct Transition {
  pub target: usize,
  pub started: Instant,
}

/// Synchronizer state for the fullscreen lyric display. All time-dependent
/// decisions take `now` explicitly so tests can drive the clock.
#[derive(Debug)]
pub struct LyricView {
  pub timeline: LyricTimeline,
  index: usize,
  browsing_until: Option<Instant>,
  transition: Option<Transition>,
}

impl LyricView {
  pub fn new(timeline: LyricTimeline) -> Self {
    LyricView {
      timeline,
      index: 0,
      browsing_until: None,
      transition: None,
    }
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn current_row(&self) -> Option<&Row> {
    self.timeline.row(self.index)
  }

  pub fn is_transitioning(&self) -> bool {
    self.transition.is_some()
  }

  pub fn is_browsing(&self, now: Instant) -> bool {
    matches!(self.browsing_until, Some(until) if now < until)
  }

  /// The current row plus up to three upcoming ones.
  pub fn visible(&self) -> &[Row] {
    let rows = self.timeline.rows();
    let hi = (self.index + 4).min(rows.len());
    let lo = self.index.min(hi);
    &rows[lo..hi]
  }

  fn begin_transition(&mut self, target: usize, now: Instant) {
    self.transition = Some(Transition {
      target,
      started: now,
    });
  }

  /// Normal completion path, called when the slide animation finishes.
  pub fn on_transition_end(&mut self) {
    if let Some(t) = self.transition.take() {
      self.index = t.target;
    }
  }

  /// Advance the synchronizer. Overdue transitions are force-completed so a
  /// lost completion signal cannot wedge the view; otherwise auto-sync is
  /// suppressed while browsing or while a transition is still running.
  pub fn tick(&mut self, now: Instant, time: f64) {
    if let Some(t) = self.transition {
      if now.duration_since(t.started) >= Duration::from_millis(TRANSITION_TIMEOUT_MS) {
        self.index = t.target;
        self.transition = None;
      }
    }
    if self.timeline.is_empty() || self.transition.is_some() {
      return;
    }
    if let Some(until) = self.browsing_until {
      if now < until {
        return;
      }
      self.browsing_until = None;
    }
    let i = self.timeline.row_at(time);
    if i != self.index {
      self.begin_transition(i, now);
    }
  }

  /// Move one row up or down manually and pin the view for the grace
  /// window. Ignored while a transition is in flight.
  pub fn browse(&mut self, dir: i32, now: Instant) {
    if self.timeline.is_empty() || self.transition.is_some() {
      return;
    }
    let last = self.timeline.len() - 1;
    let next = (self.index as i64 + dir as i64).clamp(0, last as i64) as usize;
    if next != self.index {
      self.browsing_until = Some(now + Duration::from_millis(BROWSE_GRACE_MS));
      self.begin_transition(next, now);
    }
  }

  pub fn wheel(&mut self, delta: f64, now: Instant) {
    if delta.abs() < WHEEL_THRESHOLD {
      return;
    }
    self.browse(if delta > 0.0 { 1 } else { -1 }, now);
  }

  /// Commit to a row: clears the browse pin and returns the playback time
  /// to seek to (just past the row start so it resolves to this row).
  pub fn jump_to(&mut self, index: usize, now: Instant) -> Option<f64> {
    if self.timeline.is_empty() {
      return None;
    }
    let i = index.min(self.timeline.len() - 1);
    self.browsing_until = None;
    let target = self.timeline.row(i)?.start + JUMP_EPSILON;
    if i != self.index && self.transition.is_none() {
      self.begin_transition(i, now);
    }
    Some(target)
  }
}

/// Average cover color for the accent theme: downscale to 48x48, mean the
/// RGB channels.
pub fn accent_from_cover(bytes: &[u8]) -> Option<(u8, u8, u8)> {
  let img = image::load_from_memory(bytes).ok()?;
  let small = img.thumbnail_exact(48, 48).to_rgb8();
  let mut sums = [0u64; 3];
  let mut n = 0u64;
  for pixel in small.pixels() {
    sums[0] += u64::from(pixel[0]);
    sums[1] += u64::from(pixel[1]);
    sums[2] += u64::from(pixel[2]);
    n += 1;
  }
  if n == 0 {
    return None;
  }
  Some(((sums[0] / n) as u8, (sums[1] / n) as u8, (sums[2] / n) as u8))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn timeline(starts: &[f64]) -> LyricTimeline {
    let rows = starts
      .iter()
      .enumerate()
      .map(|(i, &s)| Row::new(s, LAST_ROW_END_SECS, format!("row {}", i)))
      .collect();
    LyricTimeline::new(rows)
  }

  fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
  }

  #[test]
  fn parses_line_tags_and_fractions() {
    let parsed = parse_lrc("[00:12.34]first\n[01:02.345]second\n[00:05]early\n");
    let rows = &parsed.rows;
    assert_eq!(rows.len(), 3);
    assert!((rows[0].start - 5.0).abs() < 1e-9);
    assert_eq!(rows[0].text, "early");
    assert!((rows[1].start - 12.34).abs() < 1e-9);
    assert!((rows[2].start - 62.345).abs() < 1e-9);
    // each row ends where the next begins, last stays open
    assert!((rows[0].end - 12.34).abs() < 1e-9);
    assert!((rows[1].end - 62.345).abs() < 1e-9);
    assert!(rows[2].end > 1e5);
  }

  #[test]
  fn multiple_time_tags_repeat_the_line() {
    let parsed = parse_lrc("[00:10.00][00:30.00]chorus\n");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.rows[0].text, "chorus");
    assert_eq!(parsed.rows[1].text, "chorus");
    assert!((parsed.rows[0].start - 10.0).abs() < 1e-9);
    assert!((parsed.rows[1].start - 30.0).abs() < 1e-9);
  }

  #[test]
  fn inline_tokens_become_segments() {
    let parsed = parse_lrc("[00:10.00]Hello <00:11.00>there <00:12.50>friend\n");
    let row = &parsed.rows[0];
    assert_eq!(row.text, "Hello there friend");
    assert_eq!(row.segments.len(), 3);
    assert!((row.segments[0].time - 10.0).abs() < 1e-9);
    assert_eq!(row.segments[0].text, "Hello ");
    assert!((row.segments[1].time - 11.0).abs() < 1e-9);
    assert!((row.segments[2].time - 12.5).abs() < 1e-9);
    assert_eq!(row.segments[2].text, "friend");
  }

  #[test]
  fn metadata_and_offset_are_applied() {
    let parsed = parse_lrc(
      "[ti:Some Song]\n[ar:Somebody]\n[offset:500]\n[00:10.00]line one\n[00:20.00]line two\n",
    );
    assert_eq!(parsed.metadata.title.as_deref(), Some("Some Song"));
    assert_eq!(parsed.metadata.artist.as_deref(), Some("Somebody"));
    assert_eq!(parsed.metadata.offset_ms, Some(500));
    assert!((parsed.rows[0].start - 10.5).abs() < 1e-9);
    assert!((parsed.rows[1].start - 20.5).abs() < 1e-9);
  }

  #[test]
  fn blank_bodies_and_garbage_are_dropped() {
    let parsed = parse_lrc("[00:10.00]   \nnot a lyric line\n[99]broken\n[00:20.00]kept\n");
    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows[0].text, "kept");
  }

  #[test]
  fn structured_lines_get_a_reading_tail() {
    let lines = vec![
      LyricLine::new(0.0, "a"),
      LyricLine::new(4.0, "b"),
      LyricLine::new(9.0, "c"),
    ];
    let rows = rows_from_lines(&lines);
    assert!((rows[0].end - 4.0).abs() < 1e-9);
    assert!((rows[1].end - 9.0).abs() < 1e-9);
    assert!((rows[2].end - 14.0).abs() < 1e-9);
  }

  #[test]
  fn row_lookup_is_deterministic_at_boundaries() {
    let tl = timeline(&[0.0, 5.0, 10.0, 20.0]);
    assert_eq!(tl.row_at(12.0), 2);
    assert_eq!(tl.row_at(20.001), 3);
    assert_eq!(tl.row_at(0.0), 0);
    assert_eq!(tl.row_at(4.999), 0);
    assert_eq!(tl.row_at(5.0), 1);
    // before the first row ever starts
    let late = timeline(&[3.0, 6.0]);
    assert_eq!(late.row_at(1.0), 0);
  }

  #[test]
  fn tick_follows_playback_through_transitions() {
    let mut view = LyricView::new(timeline(&[0.0, 5.0, 10.0]));
    let t0 = Instant::now();
    view.tick(t0, 6.0);
    assert!(view.is_transitioning());
    assert_eq!(view.index(), 0);
    view.on_transition_end();
    assert_eq!(view.index(), 1);
    assert!(!view.is_transitioning());
  }

  #[test]
  fn overdue_transition_is_force_completed() {
    let mut view = LyricView::new(timeline(&[0.0, 5.0, 10.0]));
    let t0 = Instant::now();
    view.tick(t0, 6.0);
    assert!(view.is_transitioning());
    // completion signal never arrives; well before the deadline nothing moves
    view.tick(t0 + ms(TRANSITION_TIMEOUT_MS - 100), 6.0);
    assert_eq!(view.index(), 0);
    view.tick(t0 + ms(TRANSITION_TIMEOUT_MS), 6.0);
    assert_eq!(view.index(), 1);
    assert!(!view.is_transitioning());
  }

  #[test]
  fn browsing_pins_the_view_until_the_grace_expires() {
    let mut view = LyricView::new(timeline(&[0.0, 5.0, 10.0, 15.0]));
    let t0 = Instant::now();
    view.browse(1, t0);
    view.on_transition_end();
    assert_eq!(view.index(), 1);
    assert!(view.is_browsing(t0 + ms(100)));

    // playback says row 3, but the pin holds
    view.tick(t0 + ms(1000), 16.0);
    assert_eq!(view.index(), 1);
    assert!(!view.is_transitioning());

    // grace expired: auto-sync resumes
    view.tick(t0 + ms(BROWSE_GRACE_MS), 16.0);
    assert!(view.is_transitioning());
    view.on_transition_end();
    assert_eq!(view.index(), 3);
  }

  #[test]
  fn browse_is_single_flight_and_clamped() {
    let mut view = LyricView::new(timeline(&[0.0, 5.0]));
    let t0 = Instant::now();
    view.browse(-1, t0);
    assert!(!view.is_transitioning()); // already at the first row
    view.browse(1, t0);
    assert!(view.is_transitioning());
    view.browse(1, t0); // ignored while in flight
    view.on_transition_end();
    assert_eq!(view.index(), 1);
    view.browse(1, t0); // clamped at the last row
    assert!(!view.is_transitioning());
  }

  #[test]
  fn wheel_threshold_filters_jitter() {
    let mut view = LyricView::new(timeline(&[0.0, 5.0]));
    let t0 = Instant::now();
    view.wheel(4.0, t0);
    assert!(!view.is_transitioning());
    view.wheel(9.0, t0);
    assert!(view.is_transitioning());
  }

  #[test]
  fn jump_returns_a_nudged_seek_target_and_clears_the_pin() {
    let mut view = LyricView::new(timeline(&[0.0, 5.0, 10.0]));
    let t0 = Instant::now();
    view.browse(1, t0);
    view.on_transition_end();
    assert!(view.is_browsing(t0 + ms(1)));

    let target = view.jump_to(2, t0 + ms(10));
    assert_eq!(target, Some(10.0 + JUMP_EPSILON));
    assert!(!view.is_browsing(t0 + ms(20)));
    view.on_transition_end();
    assert_eq!(view.index(), 2);

    // out-of-range indices clamp to the last row
    assert_eq!(view.jump_to(99, t0 + ms(30)), Some(10.0 + JUMP_EPSILON));
  }

  #[test]
  fn visible_window_is_current_plus_three() {
    let view = LyricView::new(timeline(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]));
    let texts: Vec<&str> = view.visible().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["row 0", "row 1", "row 2", "row 3"]);

    let mut near_end = LyricView::new(timeline(&[0.0, 1.0, 2.0]));
    let t0 = Instant::now();
    near_end.tick(t0, 2.5);
    near_end.on_transition_end();
    assert_eq!(near_end.visible().len(), 1);
  }

  #[test]
  fn segment_progress_accumulates_by_word() {
    let row = Row {
      start: 10.0,
      end: 14.0,
      text: "ab cd".into(),
      segments: vec![
        Seg {
          time: 10.0,
          text: "ab ".into(),
        },
        Seg {
          time: 12.0,
          text: "cd".into(),
        },
      ],
    };
    assert_eq!(row.progress_at(9.0), 0.0);
    assert!((row.progress_at(12.0) - 0.6).abs() < 1e-9); // "ab " done
    assert!((row.progress_at(13.0) - 0.8).abs() < 1e-9); // half of "cd"
    assert_eq!(row.progress_at(14.0), 1.0);
  }

  #[test]
  fn plain_rows_progress_linearly() {
    let row = Row::new(0.0, 10.0, "hello");
    assert!((row.progress_at(5.0) - 0.5).abs() < 1e-9);
  }

  #[test]
  fn display_splits_sung_from_unsung() {
    let row = Row::new(0.0, 10.0, "hello world");
    assert_eq!(row.display_at(0.0), "▸hello world");
    assert_eq!(row.display_at(5.0), "hello ▸world");
    assert_eq!(row.display_at(10.0), "hello world▸");
  }

  #[test]
  fn placeholder_has_filler_rows() {
    let rows = placeholder_rows();
    assert_eq!(rows.len(), 5);
    assert!((rows[2].start - 10.0).abs() < 1e-9);
  }
}
