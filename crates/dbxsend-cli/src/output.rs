//! JSON summary of one run

use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// What was uploaded, where, and how to fetch it
#[derive(Clone, Debug, Serialize)]
pub struct UploadResult {
    /// Download-only link
    pub url: Option<String>,
    pub password: Option<String>,
    #[serde(serialize_with = "seconds_precision")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Bytes transmitted (the zip when zipping)
    pub size: u64,
    /// Absolute local source
    pub source: PathBuf,
    /// Path as stored, after any auto-rename
    #[serde(rename = "dropbox_path")]
    pub destination: String,
}

impl UploadResult {
    /// Pretty JSON with four-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the JSON summary to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn seconds_precision<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_field_names() {
        let result = UploadResult {
            url: Some("https://www.dropbox.com/scl/fi/x/18-AK.zip?rlkey=k&dl=1".to_string()),
            password: Some("0a1b2c3d4e5f".to_string()),
            expiration_date: Some(Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 15).unwrap()),
            size: 7212,
            source: PathBuf::from("/data/18-AK"),
            destination: "/zips/18-AK.zip".to_string(),
        };

        let json = result.to_json().unwrap();
        assert!(json.contains("\n    \"url\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dropbox_path"], "/zips/18-AK.zip");
        assert_eq!(value["expiration_date"], "2024-06-15T09:30:15Z");
        assert_eq!(value["size"], 7212);
        assert_eq!(value["source"], "/data/18-AK");
    }

    #[test]
    fn test_plain_upload_nulls() {
        let result = UploadResult {
            url: None,
            password: None,
            expiration_date: None,
            size: 3,
            source: PathBuf::from("/tmp/a.txt"),
            destination: "/a.txt".to_string(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        result.write_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["url"].is_null());
        assert!(value["expiration_date"].is_null());
    }
}
