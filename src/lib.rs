//! HUMORA core: multimodal emotion recognition by decision-level fusion.
//!
//! Independent text, audio and face classifiers each produce a
//! `(label, confidence)` observation; this crate combines them into one
//! consensus emotion via weighted scoring, rate-limits how often the
//! continuously sampled face stream may persist a result, and keeps a
//! timestamped history of consensus emotions with session analytics on top.
//!
//! The classifiers themselves and the capture/rendering front end live
//! outside this crate, behind the `FaceClassifier` / `VideoSource` traits
//! and plain `Observation` values.

pub mod analytics;
pub mod db;
pub mod fusion;
pub mod models;
pub mod pipeline;
pub mod sampling;
pub mod session;
pub mod settings;

pub use analytics::{summarize, EmotionSummary, TimelinePoint};
pub use db::Database;
pub use fusion::{fuse, FusionResult, FusionWeights};
pub use models::{EmotionRecord, Observation};
pub use pipeline::EmotionPipeline;
pub use sampling::{FaceClassifier, Frame, SamplingController, VideoSource};
pub use session::SessionContext;
pub use settings::{PipelineSettings, SettingsStore};
