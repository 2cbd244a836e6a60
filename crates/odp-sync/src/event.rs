//! Storage event payload
//!
//! The sync stage is triggered by an object-store write notification. The
//! payload follows the S3 event shape: a `Records` array where each entry
//! names the bucket and the object key that was written.

use odp_common::Result;
use serde::Deserialize;

/// One staged object named by a storage event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

impl StorageEvent {
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// The staged objects this event names, in payload order.
    pub fn object_refs(&self) -> Vec<ObjectRef> {
        self.records
            .iter()
            .map(|r| ObjectRef {
                bucket: r.s3.bucket.name.clone(),
                key: r.s3.object.key.clone(),
            })
            .collect()
    }
}
