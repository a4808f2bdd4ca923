//! Validated record types
//!
//! Every record is built from untrusted JSON by its validator and is
//! immutable afterwards. Records serialize back to the same JSON layout, so
//! a validated record can be re-validated from its own output.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod groundtruth;
pub mod job;
pub mod manifest;
pub mod presence;
pub mod preprocess;
pub mod restricted_audience;
pub mod taskdata;
pub mod via;

pub use config::{InternalConfig, MitlValue, Scalar, Webhook};
pub use groundtruth::{
    GroundtruthEntry, GroundtruthKey, GroundtruthSchema, GroundtruthValidator, KeyKind, Placement, ShapedEntity, Span,
};
pub use job::{AnswerSet, ExampleExtraFields, JobMode, LocaleMap, QuestionExample, RequestConfig, RequestType, ShapeType};
pub use manifest::{Manifest, ManifestValidator, NestedManifest, NestedManifestValidator};
pub use presence::Presence;
pub use preprocess::{Pipeline, Preprocess, PreprocessValidator};
pub use restricted_audience::{AudienceScore, Restriction, RestrictedAudience, RestrictedAudienceValidator};
pub use taskdata::{DatapointText, Entity, Metadata, MetadataValue, TaskData, TaskDataValidator};
pub use via::{ClassAttribute, Datapoint, Region, ViaDataManifest, ViaDataManifestValidator};
