pub mod annotator;
pub mod cleanup;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod platform;
pub mod plugin;

pub use annotator::{AnnotateOptions, AnnotationReport, AnnotationWriter, DateRepr, InsertOutcome};
pub use error::PipelineError;
pub use extractor::{Extractor, ExtractorEngine};
pub use metadata::{select_best_thumbnail, Thumbnail, VideoInfo};
pub use platform::Platform;
pub use plugin::{Plugin, Trigger};
