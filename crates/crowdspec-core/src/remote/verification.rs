//! Taskdata and groundtruth key cross-check
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use super::{GroundtruthDocument, RemoteDocuments};
use crate::{Error, Result};
use crowdspec_schemas::{RequestType, TaskData};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

/// Keys of a taskdata document as groundtruth documents key them
///
/// Drag-and-drop groundtruth is keyed by `task_key`; every other job type by
/// `datapoint_uri`, falling back to `task_key` for entries without one.
pub fn taskdata_keys(entries: &[TaskData], request_type: Option<RequestType>) -> BTreeSet<String> {
    entries
        .iter()
        .map(|entry| match (&entry.datapoint_uri, request_type) {
            (_, Some(RequestType::ImageDragDrop)) | (None, _) => entry.task_key.to_string(),
            (Some(uri), _) => uri.to_string(),
        })
        .collect()
}

pub fn groundtruth_keys(entries: &GroundtruthDocument) -> BTreeSet<String> {
    entries.iter().map(|(key, _)| key.to_string()).collect()
}

pub(crate) fn check_keys(
    request_type: Option<RequestType>,
    taskdata_uri: &Url,
    groundtruth_uri: &Url,
    documents: &RemoteDocuments,
) -> Result<()> {
    let taskdata = taskdata_keys(documents.taskdata.as_deref().unwrap_or_default(), request_type);
    let groundtruth = documents.groundtruth.as_ref().map(groundtruth_keys).unwrap_or_default();

    if taskdata == groundtruth {
        debug!(keys = taskdata.len(), "taskdata and groundtruth keys match");
        return Ok(());
    }

    let missing_groundtruth: Vec<String> = taskdata.difference(&groundtruth).cloned().collect();
    let missing_taskdata: Vec<String> = groundtruth.difference(&taskdata).cloned().collect();
    warn!(
        missing_groundtruth = missing_groundtruth.len(),
        missing_taskdata = missing_taskdata.len(),
        "taskdata and groundtruth keys differ"
    );
    Err(Error::KeyMismatch {
        taskdata_uri: taskdata_uri.to_string(),
        groundtruth_uri: groundtruth_uri.to_string(),
        missing_groundtruth,
        missing_taskdata,
    })
}
