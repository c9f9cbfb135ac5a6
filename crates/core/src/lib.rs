//! Face detection, encoding and identity clustering.
//!
//! Detection turns image assets into [`DetectionRecord`]s persisted as a
//! single encoding artifact; clustering partitions those records into
//! identities and samples representative face crops for each one.
//!
//! [`DetectionRecord`]: detection::domain::detection_record::DetectionRecord

pub mod catalog;
pub mod clustering;
pub mod detection;
pub mod encoding;
pub mod imaging;
pub mod jobs;
pub mod pipeline;
pub mod shared;
