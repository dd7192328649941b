//! Inspector configuration.
//!
//! Settings are read from `<config_dir>/perception-log/config.json`. Missing
//! or unreadable files fall back to defaults; every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "hdf5")]
use crate::container::HDF5_EXTENSIONS;
use crate::inspect::{ChannelRules, DEFAULT_CHANNEL_THRESHOLD};
use crate::playback::{PlaybackOptions, DEFAULT_KEY_WAIT, QUIT_KEY};
use crate::util::{Error, Result};

/// Directory name under the platform config dir.
const APP_DIR: &str = "perception-log";
const CONFIG_FILE: &str = "config.json";

/// Settings for locating, inspecting and replaying logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    // Location
    pub log_dir: PathBuf,
    pub log_file: Option<String>,
    pub extensions: Vec<String>,

    // Channels
    pub channel_threshold: usize,
    pub float_markers: Vec<String>,
    pub byte_markers: Vec<String>,

    // Playback
    pub key_wait_ms: u64,
    pub quit_key: u32,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        let rules = ChannelRules::default();
        Self {
            log_dir: dirs::home_dir()
                .unwrap_or_default()
                .join(".ihmc")
                .join("logs")
                .join("perception"),
            log_file: None,
            extensions: default_extensions(),
            channel_threshold: DEFAULT_CHANNEL_THRESHOLD,
            float_markers: rules.float_markers,
            byte_markers: rules.byte_markers,
            key_wait_ms: DEFAULT_KEY_WAIT.as_millis() as u64,
            quit_key: QUIT_KEY,
        }
    }
}

/// Log extensions listed by default: the Ogawa layout, plus HDF5 when
/// that reader is built in.
fn default_extensions() -> Vec<String> {
    #[allow(unused_mut)]
    let mut extensions = vec!["plog".to_string()];
    #[cfg(feature = "hdf5")]
    extensions.extend(HDF5_EXTENSIONS.iter().map(|e| e.to_string()));
    extensions
}

impl InspectorConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, or defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(p) if p.exists() => Self::load_from(&p).unwrap_or_else(|e| {
                warn!(path = %p.display(), error = %e, "ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load from an explicit file. Errors are reported, not defaulted.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let config: Self = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Write to an explicit file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Channel classification rules.
    pub fn channel_rules(&self) -> ChannelRules {
        ChannelRules {
            threshold: self.channel_threshold,
            float_markers: self.float_markers.clone(),
            byte_markers: self.byte_markers.clone(),
        }
    }

    /// Playback timing and quit key.
    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions {
            key_wait: Duration::from_millis(self.key_wait_ms),
            quit_key: self.quit_key,
        }
    }

    /// Pick the log to open: an explicit path wins, then
    /// `log_dir/log_file`.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = explicit {
            return Ok(p.to_path_buf());
        }
        match &self.log_file {
            Some(name) => Ok(self.log_dir.join(name)),
            None => Err(Error::Config(
                "no log file given and no default log_file configured".into(),
            )),
        }
    }

    /// Log files in `log_dir` with a configured extension, sorted by name.
    pub fn list_logs(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.log_dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(self.log_dir.clone())
            } else {
                Error::Io(e)
            }
        })?;

        let mut logs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| self.extensions.iter().any(|x| x == ext));
            if matches && path.is_file() {
                logs.push(path);
            }
        }
        logs.sort();
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = InspectorConfig::default();
        assert_eq!(c.channel_threshold, 10);
        assert_eq!(c.quit_key, 113);
        assert_eq!(c.playback_options().key_wait, Duration::from_millis(30));
        assert!(c.log_dir.ends_with(".ihmc/logs/perception"));
        assert_eq!(c.channel_rules(), ChannelRules::default());
        assert_eq!(c.extensions[0], "plog");
        assert_eq!(c.extensions.iter().any(|e| e == "hdf5"), cfg!(feature = "hdf5"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let c: InspectorConfig =
            serde_json::from_str(r#"{"channel_threshold": 3, "log_file": "a.plog"}"#).unwrap();
        assert_eq!(c.channel_threshold, 3);
        assert_eq!(c.quit_key, QUIT_KEY);
        assert_eq!(c.resolve(None).unwrap(), c.log_dir.join("a.plog"));
    }

    #[test]
    fn test_resolve() {
        let c = InspectorConfig::default();
        assert!(matches!(c.resolve(None), Err(Error::Config(_))));
        assert_eq!(
            c.resolve(Some(Path::new("/tmp/x.plog"))).unwrap(),
            PathBuf::from("/tmp/x.plog")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut c = InspectorConfig::default();
        c.key_wait_ms = 5;
        c.save_to(&path).unwrap();
        assert_eq!(InspectorConfig::load_from(&path).unwrap(), c);
        assert!(matches!(
            InspectorConfig::load_from(&dir.path().join("missing.json")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_list_logs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.plog", "a.plog", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.plog")).unwrap();

        let c = InspectorConfig {
            log_dir: dir.path().to_path_buf(),
            ..InspectorConfig::default()
        };
        let names: Vec<String> = c
            .list_logs()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.plog", "b.plog"]);
    }
}
