//! Audio output behind a trait seam.
//!
//! `rodio`'s output stream is tied to the thread that opened it, so the
//! real sink lives on a dedicated audio thread and the rest of the app
//! talks to it through an `AudioHandle` (commands over a channel, position
//! and lifecycle flags over atomics). `NullSink` stands in when no audio
//! device is wanted, leaving the controller on its simulated clock.

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// The playback controller's view of an audio backend.
pub trait AudioSink: Send {
  /// Load encoded bytes and position at `start_at` seconds, paused or not.
  fn attach(&mut self, bytes: Vec<u8>, start_at: f64, paused: bool);
  fn detach(&mut self);
  /// Whether a decoded source is currently loaded; when false the
  /// controller advances time itself.
  fn has_source(&self) -> bool;
  fn play(&mut self);
  fn pause(&mut self);
  fn seek(&mut self, secs: f64);
  /// Volume in percent, 0..=100.
  fn set_volume(&mut self, percent: u8);
  /// Playback position in seconds, `None` without a source.
  fn position(&self) -> Option<f64>;
  /// True once when the current source played to its end.
  fn take_finished(&mut self) -> bool;
  /// True once when the last attach or decode failed.
  fn take_failed(&mut self) -> bool;
}

/// Backend that never produces sound. Keeps `has_source` false so playback
/// time comes from the simulated tick.
#[derive(Default)]
pub struct NullSink;

impl AudioSink for NullSink {
  fn attach(&mut self, _bytes: Vec<u8>, _start_at: f64, _paused: bool) {}
  fn detach(&mut self) {}
  fn has_source(&self) -> bool {
    false
  }
  fn play(&mut self) {}
  fn pause(&mut self) {}
  fn seek(&mut self, _secs: f64) {}
  fn set_volume(&mut self, _percent: u8) {}
  fn position(&self) -> Option<f64> {
    None
  }
  fn take_finished(&mut self) -> bool {
    false
  }
  fn take_failed(&mut self) -> bool {
    false
  }
}

enum AudioCmd {
  Attach {
    bytes: Vec<u8>,
    start_at: f64,
    paused: bool,
  },
  Detach,
  Play,
  Pause,
  Seek(f64),
  SetVolume(u8),
}

#[derive(Default)]
struct SharedAudioState {
  position_ms: AtomicU64,
  has_source: AtomicBool,
  finished: AtomicBool,
  failed: AtomicBool,
}

/// Channel front-end for the audio thread. Dropping it hangs up the
/// channel, which shuts the thread down.
pub struct AudioHandle {
  tx: Sender<AudioCmd>,
  shared: Arc<SharedAudioState>,
}

impl AudioHandle {
  fn send(&self, cmd: AudioCmd) {
    // A dead audio thread degrades to the simulated clock.
    let _ = self.tx.send(cmd);
  }
}

impl AudioSink for AudioHandle {
  fn attach(&mut self, bytes: Vec<u8>, start_at: f64, paused: bool) {
    self.send(AudioCmd::Attach {
      bytes,
      start_at,
      paused,
    });
  }

  fn detach(&mut self) {
    self.send(AudioCmd::Detach);
  }

  fn has_source(&self) -> bool {
    self.shared.has_source.load(Ordering::Relaxed)
  }

  fn play(&mut self) {
    self.send(AudioCmd::Play);
  }

  fn pause(&mut self) {
    self.send(AudioCmd::Pause);
  }

  fn seek(&mut self, secs: f64) {
    self.send(AudioCmd::Seek(secs));
  }

  fn set_volume(&mut self, percent: u8) {
    self.send(AudioCmd::SetVolume(percent));
  }

  fn position(&self) -> Option<f64> {
    if !self.has_source() {
      return None;
    }
    Some(self.shared.position_ms.load(Ordering::Relaxed) as f64 / 1000.0)
  }

  fn take_finished(&mut self) -> bool {
    self.shared.finished.swap(false, Ordering::Relaxed)
  }

  fn take_failed(&mut self) -> bool {
    self.shared.failed.swap(false, Ordering::Relaxed)
  }
}

/// Start the audio thread and hand back its controller-side handle.
pub fn spawn_audio_thread() -> AudioHandle {
  let (tx, rx) = std::sync::mpsc::channel();
  let shared = Arc::new(SharedAudioState::default());
  let thread_shared = Arc::clone(&shared);
  thread::spawn(move || run_audio_loop(rx, thread_shared));
  AudioHandle { tx, shared }
}

fn to_duration(secs: f64) -> Duration {
  Duration::from_secs_f64(secs.max(0.0))
}

/// Decode `bytes` skipped to `start_at` into a fresh paused sink.
/// `skip_duration` is the seeking primitive; even zero is fine.
fn build_sink(
  stream: &OutputStream,
  bytes: Vec<u8>,
  start_at: Duration,
  volume: f32,
) -> anyhow::Result<Sink> {
  let source = Decoder::new(Cursor::new(bytes))?.skip_duration(start_at);
  let sink = Sink::connect_new(stream.mixer());
  sink.set_volume(volume);
  sink.append(source);
  sink.pause();
  Ok(sink)
}

fn run_audio_loop(rx: Receiver<AudioCmd>, shared: Arc<SharedAudioState>) {
  let mut stream = match OutputStreamBuilder::open_default_stream() {
    Ok(stream) => stream,
    Err(e) => {
      log::error!("no audio output device: {}", e);
      return;
    }
  };
  // rodio logs to stderr when the stream is dropped; noisy for a
  // terminal app.
  stream.log_on_drop(false);

  let mut bytes: Option<Vec<u8>> = None;
  let mut sink: Option<Sink> = None;
  let mut offset = Duration::ZERO;
  let mut paused = true;
  let mut volume = 1.0f32;

  loop {
    match rx.recv_timeout(Duration::from_millis(50)) {
      Ok(AudioCmd::Attach {
        bytes: encoded,
        start_at,
        paused: start_paused,
      }) => {
        if let Some(old) = sink.take() {
          old.stop();
        }
        shared.finished.store(false, Ordering::Relaxed);
        let at = to_duration(start_at);
        match build_sink(&stream, encoded.clone(), at, volume) {
          Ok(new_sink) => {
            if !start_paused {
              new_sink.play();
            }
            paused = start_paused;
            offset = at;
            shared
              .position_ms
              .store(at.as_millis() as u64, Ordering::Relaxed);
            shared.has_source.store(true, Ordering::Relaxed);
            sink = Some(new_sink);
            bytes = Some(encoded);
          }
          Err(e) => {
            log::warn!("failed to decode audio source: {}", e);
            bytes = None;
            shared.has_source.store(false, Ordering::Relaxed);
            shared.failed.store(true, Ordering::Relaxed);
          }
        }
      }
      Ok(AudioCmd::Detach) => {
        if let Some(old) = sink.take() {
          old.stop();
        }
        bytes = None;
        paused = true;
        offset = Duration::ZERO;
        shared.has_source.store(false, Ordering::Relaxed);
        shared.position_ms.store(0, Ordering::Relaxed);
      }
      Ok(AudioCmd::Play) => {
        if let Some(s) = &sink {
          s.play();
          paused = false;
        }
      }
      Ok(AudioCmd::Pause) => {
        if let Some(s) = &sink {
          s.pause();
          paused = true;
        }
      }
      Ok(AudioCmd::Seek(secs)) => {
        // Scrubbing rebuilds the sink and skips into the source.
        if let (Some(old), Some(encoded)) = (sink.take(), bytes.clone()) {
          old.stop();
          let at = to_duration(secs);
          match build_sink(&stream, encoded, at, volume) {
            Ok(new_sink) => {
              if !paused {
                new_sink.play();
              }
              offset = at;
              shared
                .position_ms
                .store(at.as_millis() as u64, Ordering::Relaxed);
              sink = Some(new_sink);
            }
            Err(e) => {
              log::warn!("failed to rebuild audio source for seek: {}", e);
              bytes = None;
              shared.has_source.store(false, Ordering::Relaxed);
              shared.failed.store(true, Ordering::Relaxed);
            }
          }
        }
      }
      Ok(AudioCmd::SetVolume(percent)) => {
        volume = f32::from(percent.min(100)) / 100.0;
        if let Some(s) = &sink {
          s.set_volume(volume);
        }
      }
      Err(RecvTimeoutError::Timeout) => {
        if let Some(s) = &sink {
          let pos = offset + s.get_pos();
          shared
            .position_ms
            .store(pos.as_millis() as u64, Ordering::Relaxed);
          if !paused && s.empty() {
            shared.finished.store(true, Ordering::Relaxed);
            shared.has_source.store(false, Ordering::Relaxed);
            sink = None;
            bytes = None;
            paused = true;
          }
        }
      }
      Err(RecvTimeoutError::Disconnected) => {
        if let Some(s) = &sink {
          s.stop();
        }
        break;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn null_sink_never_reports_a_source() {
    let mut sink = NullSink;
    sink.attach(vec![1, 2, 3], 0.0, false);
    assert!(!sink.has_source());
    assert_eq!(sink.position(), None);
    assert!(!sink.take_finished());
    assert!(!sink.take_failed());
  }

  #[test]
  fn lifecycle_flags_read_once() {
    let shared = SharedAudioState::default();
    shared.finished.store(true, Ordering::Relaxed);
    assert!(shared.finished.swap(false, Ordering::Relaxed));
    assert!(!shared.finished.swap(false, Ordering::Relaxed));
  }
}
