//! Core types for ytdlp-sync
//!
//! Wire shapes mirror the remote service's JSON exactly; the only
//! normalization done here is status decoding. The service reports process
//! status both as an integer code and (in some payloads) as a lowercase
//! string, so [`JobStatus`] decodes both into one canonical enum at the
//! boundary. Nothing downstream ever branches on raw wire values.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a remote job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Queued on the server, not started yet
    Pending,
    /// Actively downloading
    Downloading,
    /// Finished successfully
    Completed,
    /// Failed with an error
    Errored,
    /// Capturing a livestream
    Livestream,
}

impl JobStatus {
    /// Convert integer status code to JobStatus enum
    pub fn from_i64(status: i64) -> Self {
        match status {
            0 => JobStatus::Pending,
            1 => JobStatus::Downloading,
            2 => JobStatus::Completed,
            3 => JobStatus::Errored,
            4 => JobStatus::Livestream,
            _ => JobStatus::Errored, // Default to Errored for unknown status
        }
    }

    /// Convert JobStatus enum to integer status code
    pub fn to_i64(&self) -> i64 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Downloading => 1,
            JobStatus::Completed => 2,
            JobStatus::Errored => 3,
            JobStatus::Livestream => 4,
        }
    }

    /// Decode the lowercase string encoding some payloads carry
    pub fn from_wire_str(status: &str) -> Self {
        match status {
            "pending" => JobStatus::Pending,
            "downloading" => JobStatus::Downloading,
            "completed" => JobStatus::Completed,
            "errored" => JobStatus::Errored,
            "livestream" => JobStatus::Livestream,
            _ => JobStatus::Errored, // Unknown strings surface visibly
        }
    }

    /// Whether this is a terminal state (Completed or Errored)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Errored)
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The server's own encoding is the integer code
        serializer.serialize_i64(self.to_i64())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl de::Visitor<'_> for StatusVisitor {
            type Value = JobStatus;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an integer status code or a lowercase status string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<JobStatus, E> {
                Ok(JobStatus::from_i64(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<JobStatus, E> {
                Ok(JobStatus::from_i64(i64::try_from(v).unwrap_or(i64::MAX)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<JobStatus, E> {
                Ok(JobStatus::from_wire_str(v))
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// Progress portion of a job record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobProgress {
    /// Canonical job status (wire field mixes integer and string encodings)
    pub process_status: JobStatus,

    /// Progress percentage as reported by the downloader (e.g. "42.4%")
    #[serde(default)]
    pub percentage: String,

    /// Current speed in bytes per second
    #[serde(default)]
    pub speed: f64,

    /// Estimated seconds to completion
    #[serde(default)]
    pub eta: f64,

    /// Error detail, present only for errored jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Media metadata attached to a job by the server
///
/// Field coverage follows the server's `omitempty` markers: everything past
/// title and URL may be absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Canonical page URL of the media
    #[serde(default, rename = "webpage_url")]
    pub url: String,

    /// Media title
    #[serde(default)]
    pub title: String,

    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: String,

    /// Resolution label (e.g. "1920x1080")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// Video codec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,

    /// Audio codec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,

    /// Container extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    /// Approximate file size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize_approx: Option<i64>,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// When the job was created on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Output portion of a job record
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobOutput {
    /// Path the file was saved to, once known
    #[serde(default, rename = "savedFilePath")]
    pub saved_file_path: String,
}

/// A server-tracked unit of work: one download or livestream capture
///
/// Records are created when the service first reports them (push snapshot or
/// poll) and disappear from snapshots once cleared server-side. A snapshot is
/// always the authoritative complete set; holders of stale records must
/// replace, never merge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique id, stable for the job's lifetime
    pub id: String,

    /// Live progress
    pub progress: JobProgress,

    /// Media metadata
    #[serde(default)]
    pub info: MediaInfo,

    /// Output location
    #[serde(default)]
    pub output: JobOutput,

    /// CLI parameters the job was started with
    #[serde(default)]
    pub params: Vec<String>,
}

impl JobRecord {
    /// Display title: the media title, falling back to the job id when the
    /// server has not resolved metadata yet
    pub fn title(&self) -> &str {
        if self.info.title.is_empty() {
            &self.id
        } else {
            &self.info.title
        }
    }

    /// Shorthand for the canonical status
    pub fn status(&self) -> JobStatus {
        self.progress.process_status
    }
}

/// One downloadable format reported by `Service.Formats`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MediaFormat {
    /// Format identifier understood by the downloader
    #[serde(default)]
    pub format_id: String,

    /// Human-readable note (e.g. "1080p")
    #[serde(default)]
    pub format_note: String,

    /// Frames per second
    #[serde(default)]
    pub fps: f64,

    /// Resolution label
    #[serde(default)]
    pub resolution: String,

    /// Video codec
    #[serde(default)]
    pub vcodec: String,

    /// Audio codec
    #[serde(default)]
    pub acodec: String,

    /// Approximate file size in bytes
    #[serde(default)]
    pub filesize_approx: i64,

    /// Audio language
    #[serde(default)]
    pub language: String,
}

/// Decoded result of `Service.Formats`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// All available formats
    #[serde(default)]
    pub formats: Vec<MediaFormat>,

    /// Extractor result kind (e.g. "video", "playlist")
    #[serde(default, rename = "_type")]
    pub kind: String,

    /// Best format as chosen by the downloader
    #[serde(default)]
    pub best: MediaFormat,

    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: String,

    /// Media title
    #[serde(default)]
    pub title: String,

    /// Nested entries for playlist results
    #[serde(default)]
    pub entries: Vec<MediaMetadata>,
}

/// Status of a monitored livestream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveStreamStatus {
    /// Waiting for the stream to go live
    Waiting,
    /// Capture in progress
    InProgress,
    /// Capture finished
    Completed,
    /// Capture failed
    Errored,
}

impl LiveStreamStatus {
    /// Convert integer status code to LiveStreamStatus enum
    pub fn from_i64(status: i64) -> Self {
        match status {
            0 => LiveStreamStatus::Waiting,
            1 => LiveStreamStatus::InProgress,
            2 => LiveStreamStatus::Completed,
            3 => LiveStreamStatus::Errored,
            _ => LiveStreamStatus::Errored,
        }
    }

    /// Convert LiveStreamStatus enum to integer status code
    pub fn to_i64(&self) -> i64 {
        match self {
            LiveStreamStatus::Waiting => 0,
            LiveStreamStatus::InProgress => 1,
            LiveStreamStatus::Completed => 2,
            LiveStreamStatus::Errored => 3,
        }
    }
}

impl Serialize for LiveStreamStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_i64())
    }
}

impl<'de> Deserialize<'de> for LiveStreamStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        Ok(LiveStreamStatus::from_i64(code))
    }
}

/// Per-stream entry in a livestream progress report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LiveStreamEntry {
    /// Current capture status
    pub status: LiveStreamStatus,

    /// Time to wait before the stream goes live
    #[serde(default, rename = "waitTime")]
    pub wait_time: String,

    /// Scheduled live date
    #[serde(default, rename = "liveDate")]
    pub live_date: String,
}

/// Result of `Service.ProgressLivestream`: monitored stream URL to entry
pub type LiveStreamProgress = HashMap<String, LiveStreamEntry>;

/// One archived (completed and stored) download
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Archive entry id
    pub id: String,

    /// Media title
    #[serde(default)]
    pub title: String,

    /// Path of the stored file
    #[serde(default)]
    pub path: String,

    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: String,

    /// Source URL the media was downloaded from
    #[serde(default)]
    pub source: String,

    /// Full metadata as a JSON string
    #[serde(default)]
    pub metadata: String,

    /// When the entry was archived
    pub created_at: DateTime<Utc>,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Container format (e.g. "mp4")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Uploader / channel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

/// One video in a subscribed channel's dump
///
/// Everything past id and title follows the extractor's `omitempty`
/// posture and may be absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelVideo {
    /// Video id
    #[serde(default)]
    pub id: String,

    /// Video title
    #[serde(default)]
    pub title: String,

    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Thumbnail URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Canonical page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,

    /// Uploader / channel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,

    /// Upload date in `YYYYMMDD` form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,

    /// View count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,

    /// Whether the entry is currently live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
}

/// Extractor dump of a subscribed channel or playlist
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelDump {
    /// Channel or playlist id
    #[serde(default)]
    pub id: String,

    /// Channel or playlist title
    #[serde(default)]
    pub title: String,

    /// Uploader / channel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,

    /// Channel description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Canonical channel URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,

    /// Listed videos, newest first
    #[serde(default)]
    pub entries: Vec<ChannelVideo>,
}

/// One channel or playlist subscription
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription id
    #[serde(rename = "Id")]
    pub id: String,

    /// Subscribed channel or playlist URL
    #[serde(rename = "URL")]
    pub url: String,

    /// Extra CLI parameters applied to every download of this subscription
    #[serde(default, rename = "Params")]
    pub params: String,

    /// Cron expression controlling the check schedule
    #[serde(default, rename = "CronExpr")]
    pub cron_expr: String,
}

/// One page of a cursor-paginated collection
///
/// `first` is the row id of the first item on this page; `next` is the
/// cursor to request for the following page, with `0` meaning no further
/// page. The protocol carries no total count and no previous cursor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    /// Row id of the first item on this page
    pub first: i64,

    /// Cursor for the following page (0 = none)
    pub next: i64,

    /// Page contents
    pub data: Vec<T>,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // --- JobStatus wire encoding ---

    #[test]
    fn status_round_trips_through_i64_for_all_variants() {
        let cases = [
            (JobStatus::Pending, 0),
            (JobStatus::Downloading, 1),
            (JobStatus::Completed, 2),
            (JobStatus::Errored, 3),
            (JobStatus::Livestream, 4),
        ];

        for (variant, expected_int) in cases {
            assert_eq!(
                variant.to_i64(),
                expected_int,
                "{variant:?} should encode to {expected_int}"
            );
            assert_eq!(
                JobStatus::from_i64(expected_int),
                variant,
                "{expected_int} should decode to {variant:?}"
            );
        }
    }

    #[test]
    fn status_from_unknown_integer_defaults_to_errored() {
        assert_eq!(
            JobStatus::from_i64(99),
            JobStatus::Errored,
            "unknown status 99 must fall back to Errored so bad wire data surfaces visibly"
        );
        assert_eq!(
            JobStatus::from_i64(-1),
            JobStatus::Errored,
            "negative status must fall back to Errored, not silently become Pending"
        );
    }

    #[test]
    fn status_deserializes_from_integer_and_string_encodings() {
        let from_int: JobStatus = serde_json::from_str("2").unwrap();
        assert_eq!(from_int, JobStatus::Completed);

        let from_str: JobStatus = serde_json::from_str(r#""completed""#).unwrap();
        assert_eq!(
            from_str, JobStatus::Completed,
            "string and integer encodings of the same status must decode identically"
        );

        let livestream: JobStatus = serde_json::from_str(r#""livestream""#).unwrap();
        assert_eq!(livestream, JobStatus::Livestream);
    }

    #[test]
    fn status_from_unknown_string_defaults_to_errored() {
        let status: JobStatus = serde_json::from_str(r#""exploded""#).unwrap();
        assert_eq!(status, JobStatus::Errored);
    }

    #[test]
    fn status_serializes_as_integer() {
        let json = serde_json::to_string(&JobStatus::Livestream).unwrap();
        assert_eq!(json, "4", "the server's canonical encoding is the integer code");
    }

    #[test]
    fn terminal_states_are_completed_and_errored_only() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Errored.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Downloading.is_terminal());
        assert!(!JobStatus::Livestream.is_terminal());
    }

    // --- JobRecord decoding ---

    #[test]
    fn job_record_decodes_from_server_shaped_json() {
        let json = r#"{
            "id": "abc123",
            "progress": {
                "process_status": 1,
                "percentage": "42.4%",
                "speed": 1048576.0,
                "eta": 33.0
            },
            "info": {
                "webpage_url": "https://media.example/watch?v=1",
                "title": "A Video",
                "thumbnail": "https://media.example/thumb.jpg"
            },
            "output": { "savedFilePath": "" },
            "params": ["-f", "best"]
        }"#;

        let record: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.status(), JobStatus::Downloading);
        assert_eq!(record.progress.percentage, "42.4%");
        assert_eq!(record.info.title, "A Video");
        assert_eq!(record.params, vec!["-f", "best"]);
        assert!(
            record.progress.error.is_none(),
            "healthy jobs carry no error field"
        );
    }

    #[test]
    fn job_record_tolerates_missing_optional_sections() {
        // Older server builds omit info/output/params entirely
        let json = r#"{"id": "x", "progress": {"process_status": 0}}"#;
        let record: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status(), JobStatus::Pending);
        assert!(record.info.title.is_empty());
        assert!(record.output.saved_file_path.is_empty());
        assert!(record.params.is_empty());
    }

    #[test]
    fn job_title_falls_back_to_id_when_metadata_unresolved() {
        let json = r#"{"id": "fallback-id", "progress": {"process_status": 0}}"#;
        let record: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.title(),
            "fallback-id",
            "a job without resolved metadata is addressed by its id"
        );
    }

    // --- LiveStreamStatus ---

    #[test]
    fn livestream_status_decodes_integer_codes() {
        let entry: LiveStreamEntry = serde_json::from_str(
            r#"{"status": 1, "waitTime": "0s", "liveDate": "2026-01-01"}"#,
        )
        .unwrap();
        assert_eq!(entry.status, LiveStreamStatus::InProgress);
        assert_eq!(entry.wait_time, "0s");
    }

    #[test]
    fn livestream_status_from_unknown_integer_defaults_to_errored() {
        assert_eq!(LiveStreamStatus::from_i64(42), LiveStreamStatus::Errored);
    }

    // --- Page ---

    #[test]
    fn page_decodes_cursor_fields() {
        let page: Page<Subscription> = serde_json::from_str(
            r#"{"first": 10, "next": 20, "data": [{"Id": "s1", "URL": "https://media.example/c"}]}"#,
        )
        .unwrap();
        assert_eq!(page.first, 10);
        assert_eq!(page.next, 20);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "s1");
    }
}
