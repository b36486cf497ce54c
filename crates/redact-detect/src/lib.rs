//! Pattern matching, conflict resolution and text rewriting

pub mod detector;
pub mod patterns;
pub mod resolver;
pub mod rewriter;

pub use detector::{CONTEXT_WINDOW, Detector, extract_context, replacement_for};
pub use patterns::{
    BUILTIN_CONFIDENCE, PatternSet, PatternSpec, TypeFilter, replacement_label, type_priority,
};
pub use resolver::{is_non_overlapping, resolve};
pub use rewriter::rewrite;
