//! Display sinks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::util::{path, Error, Result};

/// Where decoded frames go, and where key presses come from.
pub trait DisplaySink {
    /// Render frame `index` of `channel`.
    fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()>;

    /// Wait up to `timeout` for a key press and return its code.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<u32>>;

    /// False once the user closed the output.
    fn is_open(&self) -> bool {
        true
    }

    /// Release the output. Called once when playback stops.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()> {
        (**self).show(channel, index, frame)
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<u32>> {
        (**self).poll_key(timeout)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()> {
        (**self).show(channel, index, frame)
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<u32>> {
        (**self).poll_key(timeout)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Writes every frame as a PNG file.
///
/// Files are named `<channel>_<index>.png` with separators in the channel
/// path replaced by underscores and the index zero-padded to six digits.
pub struct FrameDumpSink {
    dir: PathBuf,
    pace: bool,
    written: usize,
}

impl FrameDumpSink {
    /// Create the output directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            pace: true,
            written: 0,
        })
    }

    /// Whether `poll_key` sleeps for its timeout.
    pub fn with_pacing(mut self, pace: bool) -> Self {
        self.pace = pace;
        self
    }

    /// File that frame `index` of `channel` is written to.
    pub fn frame_path(&self, channel: &str, index: usize) -> PathBuf {
        let slug = path::components(channel).collect::<Vec<_>>().join("_");
        self.dir.join(format!("{slug}_{index:06}.png"))
    }

    /// Number of frames written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl DisplaySink for FrameDumpSink {
    fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()> {
        let out = self.frame_path(channel, index);
        frame
            .save_with_format(&out, ImageFormat::Png)
            .map_err(|e| Error::Display(format!("{}: {}", out.display(), e)))?;
        debug!(file = %out.display(), "frame written");
        self.written += 1;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<u32>> {
        if self.pace {
            std::thread::sleep(timeout);
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        info!(dir = %self.dir.display(), frames = self.written, "frame dump finished");
        Ok(())
    }
}

/// Logs frame sizes without rendering anything.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    shown: usize,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl DisplaySink for HeadlessSink {
    fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()> {
        info!(
            channel = %channel,
            index,
            width = frame.width(),
            height = frame.height(),
            "frame"
        );
        self.shown += 1;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<u32>> {
        std::thread::sleep(timeout);
        Ok(None)
    }
}
