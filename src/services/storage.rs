//! Public object storage URLs

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBucket {
    ProfilePictures,
    EventPhotos,
    CertificateBackgrounds,
}

impl StorageBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBucket::ProfilePictures => "profile-pictures",
            StorageBucket::EventPhotos => "event-photos",
            StorageBucket::CertificateBackgrounds => "certificate-backgrounds",
        }
    }
}

impl fmt::Display for StorageBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct StorageUrls {
    base_url: String,
}

impl StorageUrls {
    pub fn new(storage_url: &str) -> Self {
        Self {
            base_url: storage_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<storage>/storage/v1/object/public/<bucket>/<path>`
    pub fn public_url(&self, bucket: StorageBucket, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            path.trim_start_matches('/')
        )
    }
}
