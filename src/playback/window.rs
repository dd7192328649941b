//! On-screen display via a `minifb` window.

use std::time::{Duration, Instant};

use image::RgbImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::debug;

use super::sink::DisplaySink;
use crate::util::{Error, Result};

/// Key code reported for `Escape`.
pub const ESCAPE_KEY: u32 = 27;

/// Granularity of the event pump while waiting for keys.
const PUMP_INTERVAL: Duration = Duration::from_millis(5);

/// Convert HWC RGB buffer to packed 0RGB u32 for minifb.
fn rgb_to_argb(frame: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(frame.pixels().map(|p| {
        let [r, g, b] = p.0;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }));
}

/// Map a window key to the character code callers compare against.
fn key_code(key: Key) -> Option<u32> {
    match key {
        Key::Escape => Some(ESCAPE_KEY),
        Key::Space => Some(' ' as u32),
        // Letters are named `A`..`Z`, digits `Key0`..`Key9`
        k => {
            let name = format!("{:?}", k);
            match name.as_bytes() {
                [c] if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase() as u32),
                [b'K', b'e', b'y', d] if d.is_ascii_digit() => Some(*d as u32),
                _ => None,
            }
        }
    }
}

/// Single window showing the latest frame of any channel.
///
/// The window is created with the size of the first frame it shows.
pub struct WindowSink {
    title: String,
    window: Option<Window>,
    pixels: Vec<u32>,
    closed: bool,
}

impl WindowSink {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: None,
            pixels: Vec::new(),
            closed: false,
        }
    }
}

impl DisplaySink for WindowSink {
    fn show(&mut self, channel: &str, index: usize, frame: &RgbImage) -> Result<()> {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        if self.window.is_none() {
            let window = Window::new(
                &self.title,
                w,
                h,
                WindowOptions {
                    resize: true,
                    ..WindowOptions::default()
                },
            )
            .map_err(|e| Error::Display(e.to_string()))?;
            debug!(width = w, height = h, "window opened");
            self.window = Some(window);
        }

        rgb_to_argb(frame, &mut self.pixels);
        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };
        window.set_title(&format!("{} - {} [{}]", self.title, channel, index));
        window
            .update_with_buffer(&self.pixels, w, h)
            .map_err(|e| Error::Display(e.to_string()))
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<u32>> {
        let Some(window) = self.window.as_mut() else {
            std::thread::sleep(timeout);
            return Ok(None);
        };

        let deadline = Instant::now() + timeout;
        loop {
            window.update();
            if !window.is_open() {
                self.closed = true;
                return Ok(None);
            }
            if let Some(code) = window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .find_map(key_code)
            {
                return Ok(Some(code));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(PUMP_INTERVAL.min(deadline - now));
        }
    }

    fn is_open(&self) -> bool {
        !self.closed && self.window.as_ref().map_or(true, Window::is_open)
    }

    fn close(&mut self) -> Result<()> {
        self.window = None;
        self.closed = true;
        Ok(())
    }
}
