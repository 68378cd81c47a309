//! GitHub Actions rendering for flowgen.
//!
//! Turns materialized workflows into workflow YAML, substituting step
//! placeholders, and writes the result into the output directory.

pub mod emitter;
pub mod error;
pub mod output;
pub mod schema;
pub mod template;

pub use emitter::{GENERATED_HEADER, WorkflowEmitter};
pub use error::{RenderError, RenderResult};
pub use output::{RenderedFile, load_static_file, write_atomically};
pub use template::TemplateContext;
