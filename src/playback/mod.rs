//! Frame-by-frame playback of image channels.
//!
//! Playback walks frame indices `0..count`; for every index it decodes the
//! frame of each channel and hands it to a [`DisplaySink`], then polls the
//! sink for a key. The quit key, a closed sink or a cancelled
//! [`CancelToken`] end playback at the next round boundary. The sink is
//! always closed before [`Playback::run`] returns.
//!
//! ```text
//! Idle --step--> Playing { index } --step--> ... --> Terminated(reason)
//! ```

mod decode;
mod sink;
#[cfg(feature = "window")]
mod window;

pub use decode::*;
pub use sink::*;
#[cfg(feature = "window")]
pub use window::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::container::Container;
use crate::inspect::Channel;
use crate::util::{path, Result};

/// Key code that stops playback (`'q'`).
pub const QUIT_KEY: u32 = 113;

/// Default wait for a key after each round.
pub const DEFAULT_KEY_WAIT: Duration = Duration::from_millis(30);

/// Shared stop request, checked between rounds.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Timing and key settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// How long to wait for a key after each round; also paces playback.
    pub key_wait: Duration,
    /// Key code that ends playback.
    pub quit_key: u32,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            key_wait: DEFAULT_KEY_WAIT,
            quit_key: QUIT_KEY,
        }
    }
}

/// Why playback ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every frame index was played.
    Completed,
    /// The quit key was pressed.
    QuitKey,
    /// The cancel token was triggered.
    Cancelled,
    /// The display sink was closed.
    SinkClosed,
}

/// Playback state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    /// `index` is the next frame index to play.
    Playing { index: usize },
    Terminated(StopReason),
}

/// Summary of a finished playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    /// Rounds played (one round shows index `i` of every channel).
    pub rounds: usize,
    pub frames_rendered: usize,
    pub decode_failures: usize,
    pub stop: StopReason,
}

/// Playback of a set of channels from one container.
pub struct Playback<'a, C: ?Sized, D, S> {
    container: &'a C,
    channels: Vec<String>,
    frame_count: usize,
    decoder: D,
    sink: S,
    options: PlaybackOptions,
    cancel: CancelToken,
    state: PlaybackState,
    rounds: usize,
    frames_rendered: usize,
    decode_failures: usize,
}

impl<'a, C, D, S> Playback<'a, C, D, S>
where
    C: Container + ?Sized,
    D: FrameDecoder,
    S: DisplaySink,
{
    /// Prepare playback of the given channel groups.
    ///
    /// The frame count is the smallest child count among the channels, so
    /// every played index exists in every channel.
    pub fn new<I, N>(container: &'a C, channels: I, decoder: D, sink: S) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let channels: Vec<String> = channels
            .into_iter()
            .map(|c| path::as_group(c.as_ref()))
            .collect();

        let mut frame_count = None;
        for channel in &channels {
            let n = container.children(channel)?.len();
            frame_count = Some(frame_count.map_or(n, |m: usize| m.min(n)));
        }

        Ok(Self {
            container,
            channels,
            frame_count: frame_count.unwrap_or(0),
            decoder,
            sink,
            options: PlaybackOptions::default(),
            cancel: CancelToken::new(),
            state: PlaybackState::Idle,
            rounds: 0,
            frames_rendered: 0,
            decode_failures: 0,
        })
    }

    /// Prepare playback of classified channels.
    pub fn from_channels(container: &'a C, channels: &[Channel], decoder: D, sink: S) -> Result<Self> {
        Self::new(container, channels.iter().map(|c| c.name.as_str()), decoder, sink)
    }

    pub fn with_options(mut self, options: PlaybackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Number of frame indices that will be played.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[inline]
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Current counters; `stop` is only meaningful once terminated.
    pub fn report(&self) -> PlaybackReport {
        PlaybackReport {
            rounds: self.rounds,
            frames_rendered: self.frames_rendered,
            decode_failures: self.decode_failures,
            stop: match self.state {
                PlaybackState::Terminated(reason) => reason,
                _ => StopReason::Cancelled,
            },
        }
    }

    /// Advance by one round and return the new state.
    pub fn step(&mut self) -> Result<PlaybackState> {
        let index = match self.state {
            PlaybackState::Terminated(_) => return Ok(self.state),
            PlaybackState::Idle => {
                info!(
                    channels = self.channels.len(),
                    frames = self.frame_count,
                    "playback started"
                );
                0
            }
            PlaybackState::Playing { index } => index,
        };

        if self.cancel.is_cancelled() {
            return Ok(self.terminate(StopReason::Cancelled));
        }
        if !self.sink.is_open() {
            return Ok(self.terminate(StopReason::SinkClosed));
        }
        if index >= self.frame_count {
            return Ok(self.terminate(StopReason::Completed));
        }

        self.state = PlaybackState::Playing { index };
        for c in 0..self.channels.len() {
            self.display_frame(c, index)?;
        }
        self.rounds += 1;

        if self.sink.poll_key(self.options.key_wait)? == Some(self.options.quit_key) {
            debug!(index, "quit key pressed");
            self.cancel.cancel();
            return Ok(self.terminate(StopReason::QuitKey));
        }

        self.state = PlaybackState::Playing { index: index + 1 };
        Ok(self.state)
    }

    /// Play until terminated, then close the sink.
    pub fn run(mut self) -> Result<PlaybackReport> {
        let played = loop {
            match self.step() {
                Ok(PlaybackState::Terminated(_)) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };
        let closed = self.sink.close();
        played?;
        closed?;

        let report = self.report();
        info!(
            rounds = report.rounds,
            frames = report.frames_rendered,
            decode_failures = report.decode_failures,
            stop = ?report.stop,
            "playback finished"
        );
        Ok(report)
    }

    /// Decode and show frame `index` of channel number `channel`.
    ///
    /// Payloads that do not decode are logged and skipped.
    fn display_frame(&mut self, channel: usize, index: usize) -> Result<()> {
        let name = &self.channels[channel];
        let frame_path = path::join(name, &index.to_string());
        let buffer = self.container.read(&frame_path)?;
        let bytes = buffer.byteswapped();

        match self.decoder.decode(&bytes) {
            Ok(image) => {
                self.sink.show(name, index, &image)?;
                self.frames_rendered += 1;
            }
            Err(e) => {
                warn!(frame = %frame_path, error = %e, "skipping undecodable frame");
                self.decode_failures += 1;
            }
        }
        Ok(())
    }

    fn terminate(&mut self, reason: StopReason) -> PlaybackState {
        self.state = PlaybackState::Terminated(reason);
        self.state
    }
}

/// Play `channels` with default options until done or interrupted.
pub fn playback_images<C, D, S>(
    container: &C,
    channels: &[Channel],
    decoder: D,
    sink: S,
    options: PlaybackOptions,
    cancel: CancelToken,
) -> Result<PlaybackReport>
where
    C: Container + ?Sized,
    D: FrameDecoder,
    S: DisplaySink,
{
    Playback::from_channels(container, channels, decoder, sink)?
        .with_options(options)
        .with_cancel(cancel)
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{MemoryArchive, RawBuffer};
    use crate::util::Error;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(shade: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(2, 2, Rgb([shade, shade, shade]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn archive_with(channel: &str, frames: usize) -> MemoryArchive {
        let mut a = MemoryArchive::new();
        for i in 0..frames {
            a.insert_dataset(&format!("{channel}/{i}"), RawBuffer::from_slice(&png(i as u8)))
                .unwrap();
        }
        a
    }

    /// Records shown frames and replays scripted key codes.
    #[derive(Default)]
    struct Recorder {
        shown: Vec<(String, usize, u8)>,
        keys: Vec<Option<u32>>,
        polls: usize,
        closed: bool,
    }

    impl DisplaySink for Recorder {
        fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()> {
            self.shown.push((channel.to_string(), index, frame.get_pixel(0, 0).0[0]));
            Ok(())
        }

        fn poll_key(&mut self, _timeout: Duration) -> Result<Option<u32>> {
            let key = self.keys.get(self.polls).copied().flatten();
            self.polls += 1;
            Ok(key)
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn test_plays_every_frame_then_completes() {
        let a = archive_with("cam", 3);
        let mut rec = Recorder::default();
        let report = Playback::new(&a, ["cam"], ImageDecoder, &mut rec)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.stop, StopReason::Completed);
        assert_eq!(report.rounds, 3);
        assert_eq!(report.frames_rendered, 3);
        assert_eq!(
            rec.shown,
            vec![("cam/".into(), 0, 0), ("cam/".into(), 1, 1), ("cam/".into(), 2, 2)]
        );
        assert_eq!(rec.polls, 3);
        assert!(rec.closed);
    }

    #[test]
    fn test_quit_key_stops_after_round() {
        let a = archive_with("cam", 5);
        let mut rec = Recorder {
            keys: vec![None, Some(QUIT_KEY)],
            ..Recorder::default()
        };
        let cancel = CancelToken::new();
        let report = Playback::new(&a, ["cam"], ImageDecoder, &mut rec)
            .unwrap()
            .with_cancel(cancel.clone())
            .run()
            .unwrap();

        assert_eq!(report.stop, StopReason::QuitKey);
        assert_eq!(report.rounds, 2);
        assert_eq!(rec.shown.len(), 2);
        assert!(cancel.is_cancelled());
        assert!(rec.closed);
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let a = archive_with("cam", 2);
        let mut rec = Recorder {
            keys: vec![Some(27), Some(112)],
            ..Recorder::default()
        };
        let report = Playback::new(&a, ["cam"], ImageDecoder, &mut rec)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.stop, StopReason::Completed);
    }

    #[test]
    fn test_cancelled_before_start() {
        let a = archive_with("cam", 2);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rec = Recorder::default();
        let report = Playback::new(&a, ["cam"], ImageDecoder, &mut rec)
            .unwrap()
            .with_cancel(cancel)
            .run()
            .unwrap();
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(rec.shown.is_empty());
        assert!(rec.closed);
    }

    #[test]
    fn test_empty_channel_list_completes() {
        let a = MemoryArchive::new();
        let mut rec = Recorder::default();
        let mut playback = Playback::new(&a, Vec::<String>::new(), ImageDecoder, &mut rec).unwrap();
        assert_eq!(playback.frame_count(), 0);
        assert_eq!(playback.state(), PlaybackState::Idle);
        assert_eq!(
            playback.step().unwrap(),
            PlaybackState::Terminated(StopReason::Completed)
        );
        // Terminated is absorbing
        assert_eq!(
            playback.step().unwrap(),
            PlaybackState::Terminated(StopReason::Completed)
        );
    }

    #[test]
    fn test_frame_count_is_shortest_channel() {
        let mut a = archive_with("left", 4);
        for i in 0..2 {
            a.insert_dataset(&format!("right/{i}"), RawBuffer::from_slice(&png(9)))
                .unwrap();
        }
        let mut rec = Recorder::default();
        let playback = Playback::new(&a, ["left", "right/"], ImageDecoder, &mut rec).unwrap();
        assert_eq!(playback.frame_count(), 2);
        let report = playback.run().unwrap();
        assert_eq!(report.frames_rendered, 4);
        assert_eq!(rec.shown[1], ("right/".into(), 0, 9));
    }

    #[test]
    fn test_undecodable_frames_are_skipped() {
        let mut a = archive_with("cam", 2);
        a.insert_dataset("cam/1", RawBuffer::from_slice(b"garbage".as_slice()))
            .unwrap();
        let mut rec = Recorder::default();
        let report = Playback::new(&a, ["cam"], ImageDecoder, &mut rec)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.frames_rendered, 1);
        assert_eq!(report.decode_failures, 1);
        assert_eq!(report.stop, StopReason::Completed);
    }

    #[test]
    fn test_payload_is_byteswapped_before_decoding() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("cam/0", RawBuffer::from_slice(&[0x0102_0304u32]))
            .unwrap();
        let seen = std::cell::RefCell::new(Vec::new());
        let decoder = |bytes: &[u8]| -> Result<RgbImage> {
            seen.borrow_mut().push(bytes.to_vec());
            Ok(RgbImage::new(1, 1))
        };
        let mut rec = Recorder::default();
        Playback::new(&a, ["cam"], decoder, &mut rec).unwrap().run().unwrap();
        assert_eq!(seen.into_inner(), vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_missing_frame_is_fatal_and_closes_sink() {
        let mut a = MemoryArchive::new();
        a.insert_dataset("cam/1", RawBuffer::from_slice(&png(1))).unwrap();
        let mut rec = Recorder::default();
        let result = Playback::new(&a, ["cam"], ImageDecoder, &mut rec).unwrap().run();
        assert!(matches!(result, Err(Error::NodeNotFound(p)) if p == "cam/0"));
        assert!(rec.closed);
    }

    #[test]
    fn test_closed_sink_stops_playback() {
        struct Closed;
        impl DisplaySink for Closed {
            fn show(&mut self, _: &str, _: usize, _: &RgbImage) -> Result<()> {
                Ok(())
            }
            fn poll_key(&mut self, _: Duration) -> Result<Option<u32>> {
                Ok(None)
            }
            fn is_open(&self) -> bool {
                false
            }
        }
        let a = archive_with("cam", 2);
        let report = Playback::new(&a, ["cam"], ImageDecoder, Closed).unwrap().run().unwrap();
        assert_eq!(report.stop, StopReason::SinkClosed);
        assert_eq!(report.rounds, 0);
    }
}
