//! Mixer Data Types
//!
//! Raw entries as the server reports them, the records handed to scripts,
//! and the typed form of a volume/mute request.

use serde::{Deserialize, Serialize};

/// Property-list key holding the application-supplied stream name
pub const PROP_APPLICATION_NAME: &str = "application.name";

/// Property-list key holding the owning process id
pub const PROP_PROCESS_ID: &str = "application.process.id";

/// Property-list key holding the owning executable name
pub const PROP_PROCESS_BINARY: &str = "application.process.binary";

/// Which kind of object a volume or mute request addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An output device
    Sink,
    /// A playback stream
    SinkInput,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Sink => "sink",
            Target::SinkInput => "sink input",
        }
    }
}

/// Server-wide information
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerInfo {
    /// Name of the default sink, if the server has one
    pub default_sink: Option<String>,
}

/// A sink as reported by the server
#[derive(Debug, Clone, PartialEq)]
pub struct SinkEntry {
    pub index: u32,
    pub name: String,
    /// Average channel volume in decibels
    pub volume_db: f64,
    pub mute: bool,
}

/// A sink input as reported by the server
#[derive(Debug, Clone, PartialEq)]
pub struct SinkInputEntry {
    pub index: u32,
    /// Index of the sink this stream plays to
    pub sink: u32,
    /// Raw stream name (may be missing)
    pub name: Option<String>,
    /// Average channel volume in decibels
    pub volume_db: f64,
    pub mute: bool,
    /// `application.name` property
    pub application_name: Option<String>,
    /// `application.process.id` property, unparsed
    pub process_id: Option<String>,
    /// `application.process.binary` property
    pub process_binary: Option<String>,
}

/// Output device record handed to scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    pub index: u32,
    /// Linear volume, 0-100 (above 100 when boosted)
    pub volume: u32,
    pub mute: bool,
    pub name: String,
    /// Whether this is the server's default sink
    #[serde(rename = "default")]
    pub is_default: bool,
}

/// Playback stream record handed to scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkInput {
    pub index: u32,
    /// Linear volume, 0-100 (above 100 when boosted)
    pub volume: u32,
    /// Index of the owning sink
    pub sink: u32,
    pub mute: bool,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

/// A volume/mute change for one sink or sink input
///
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeRequest {
    #[serde(default)]
    pub mute: Option<bool>,
    /// Linear volume; clamped to 0-100 before conversion
    #[serde(default)]
    pub volume: Option<f64>,
}

impl VolumeRequest {
    pub fn mute(mute: bool) -> Self {
        Self {
            mute: Some(mute),
            volume: None,
        }
    }

    pub fn volume(volume: f64) -> Self {
        Self {
            mute: None,
            volume: Some(volume),
        }
    }

    /// Whether the request changes nothing
    pub fn is_empty(&self) -> bool {
        self.mute.is_none() && self.volume.is_none()
    }
}

/// One callback delivery of a list request
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem<T> {
    /// A data-carrying entry
    Item(T),
    /// The end-of-list marker; carries no data
    End,
    /// The server reported an error instead of an entry
    Error,
}

/// Accumulates the entries of a list request
///
/// Only [`ListItem::Item`] deliveries produce an entry.
#[derive(Debug)]
pub struct ListCollector<T> {
    items: Vec<T>,
    finished: bool,
    failed: bool,
}

impl<T> Default for ListCollector<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            finished: false,
            failed: false,
        }
    }
}

impl<T> ListCollector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one delivery
    pub fn accept(&mut self, item: ListItem<T>) {
        match item {
            ListItem::Item(value) => self.items.push(value),
            ListItem::End => self.finished = true,
            ListItem::Error => {
                self.failed = true;
                self.finished = true;
            }
        }
    }

    /// Whether the end marker (or an error) has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the list was cut short by a server error
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_skips_end_marker() {
        let mut collector = ListCollector::new();
        collector.accept(ListItem::Item(1));
        collector.accept(ListItem::Item(2));
        assert!(!collector.is_finished());
        collector.accept(ListItem::End);
        assert!(collector.is_finished());
        assert!(!collector.failed());
        assert_eq!(collector.into_items(), vec![1, 2]);
    }

    #[test]
    fn test_collector_empty_list() {
        let mut collector: ListCollector<u32> = ListCollector::new();
        collector.accept(ListItem::End);
        assert!(collector.into_items().is_empty());
    }

    #[test]
    fn test_collector_error_keeps_prefix() {
        let mut collector = ListCollector::new();
        collector.accept(ListItem::Item("a"));
        collector.accept(ListItem::Error);
        assert!(collector.failed());
        assert!(collector.is_finished());
        assert_eq!(collector.into_items(), vec!["a"]);
    }

    #[test]
    fn test_volume_request_is_empty() {
        assert!(VolumeRequest::default().is_empty());
        assert!(!VolumeRequest::mute(true).is_empty());
        assert!(!VolumeRequest::volume(20.0).is_empty());
    }

    #[test]
    fn test_sink_serializes_default_field() {
        let sink = Sink {
            index: 0,
            volume: 50,
            mute: false,
            name: "alsa_output.pci".to_string(),
            is_default: true,
        };
        let json = serde_json::to_string(&sink).unwrap();
        assert!(json.contains("\"default\":true"));
        assert!(!json.contains("is_default"));
    }

    #[test]
    fn test_sink_input_omits_missing_process_fields() {
        let input = SinkInput {
            index: 7,
            volume: 100,
            sink: 0,
            mute: false,
            name: "Firefox".to_string(),
            pid: None,
            binary: None,
        };
        let json = serde_json::to_string(&input).unwrap();
        assert!(!json.contains("pid"));
        assert!(!json.contains("binary"));

        let with_pid = SinkInput {
            pid: Some(1234),
            binary: Some("firefox".to_string()),
            ..input
        };
        let json = serde_json::to_string(&with_pid).unwrap();
        assert!(json.contains("\"pid\":1234"));
        assert!(json.contains("\"binary\":\"firefox\""));
    }

    #[test]
    fn test_volume_request_from_partial_json() {
        let request: VolumeRequest = serde_json::from_str(r#"{"mute":true}"#).unwrap();
        assert_eq!(request, VolumeRequest::mute(true));
    }
}
