use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Processing state reported by the Stream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum VideoStatus {
    Created,
    Uploaded,
    Processing,
    Transcoding,
    Finished,
    Error,
    UploadFailed,
    Unknown(i64),
}

impl VideoStatus {
    /// Terminal failure states
    pub fn is_failed(&self) -> bool {
        matches!(self, VideoStatus::Error | VideoStatus::UploadFailed)
    }
}

impl From<i64> for VideoStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => VideoStatus::Created,
            1 => VideoStatus::Uploaded,
            2 => VideoStatus::Processing,
            3 => VideoStatus::Transcoding,
            4 => VideoStatus::Finished,
            5 => VideoStatus::Error,
            6 => VideoStatus::UploadFailed,
            other => VideoStatus::Unknown(other),
        }
    }
}

impl From<VideoStatus> for i64 {
    fn from(status: VideoStatus) -> Self {
        match status {
            VideoStatus::Created => 0,
            VideoStatus::Uploaded => 1,
            VideoStatus::Processing => 2,
            VideoStatus::Transcoding => 3,
            VideoStatus::Finished => 4,
            VideoStatus::Error => 5,
            VideoStatus::UploadFailed => 6,
            VideoStatus::Unknown(code) => code,
        }
    }
}

/// Remote video record
///
/// Only `id` (the provider GUID) is persisted locally. Everything the provider
/// returns beyond the typed fields is kept verbatim in `metadata`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(rename = "guid", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VideoStatus>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_stream_video() {
        let record: VideoRecord = serde_json::from_value(json!({
            "videoLibraryId": 4711,
            "guid": "5b1d9f3a-0c1e-4b9b-9a59-7c0e4e2f1a10",
            "title": "Unnamed video",
            "status": 4,
            "length": 12,
            "storageSize": 1048576
        }))
        .unwrap();

        assert_eq!(record.id, "5b1d9f3a-0c1e-4b9b-9a59-7c0e4e2f1a10");
        assert_eq!(record.title.as_deref(), Some("Unnamed video"));
        assert_eq!(record.status, Some(VideoStatus::Finished));
        assert_eq!(record.metadata.get("length"), Some(&json!(12)));
        assert_eq!(record.metadata.get("videoLibraryId"), Some(&json!(4711)));
    }

    #[test]
    fn test_deserialize_upload_acknowledgement() {
        // The upload endpoint answers with a status envelope, not a video.
        let record: VideoRecord = serde_json::from_value(json!({
            "success": true,
            "message": "OK",
            "statusCode": 200
        }))
        .unwrap();

        assert!(record.id.is_empty());
        assert!(record.status.is_none());
        assert_eq!(record.metadata.get("success"), Some(&json!(true)));
    }

    #[test]
    fn test_unknown_status_code_preserved() {
        let record: VideoRecord =
            serde_json::from_value(json!({ "guid": "abc", "status": 42 })).unwrap();
        assert_eq!(record.status, Some(VideoStatus::Unknown(42)));
        assert_eq!(serde_json::to_value(&record).unwrap()["status"], json!(42));
    }

    #[test]
    fn test_failed_states() {
        assert!(VideoStatus::Error.is_failed());
        assert!(VideoStatus::UploadFailed.is_failed());
        assert!(!VideoStatus::Transcoding.is_failed());
    }
}
