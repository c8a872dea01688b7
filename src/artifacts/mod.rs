// Artifacts module - persisted scaler, encoder and classifiers
//
// - source: where artifact bytes come from (filesystem by default)
// - store: validated ArtifactSet behind a single-flight cache
// - report: side-channel accuracy record, loaded independently of the models

mod report;
mod source;
mod store;

pub use report::AccuracyReport;
pub use source::{ArtifactKind, ArtifactSource, FsArtifactSource};
pub use store::{ArtifactSet, ArtifactStore};
