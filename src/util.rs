// ============================================================
// Utility Helpers
// ============================================================
// Small, dependency-light helpers shared by the pipeline:
//
//   count_parameters  — total scalar parameters of a Burn module
//   extract_filename  — "/data/lichess_2013.pgn" → "lichess_2013"
//   timed             — run a closure, log wall time + process id
//   extract_tag       — first top-level <tag>…</tag> text in a fragment (roxmltree)
//
// board_to_sequence lives with the Board type in domain::board.

use std::time::Instant;

use burn::{module::Module, tensor::backend::Backend};

use crate::error::{PipelineError, Result};

/// Number of scalar parameters in `module`. Every parameter of a
/// Burn module is trainable, so this is also the trainable count.
pub fn count_parameters<B: Backend, M: Module<B>>(module: &M) -> usize {
    module.num_params()
}

/// Last `/`-separated segment of a path with its final four
/// characters (a dot plus a three-letter extension) removed.
pub fn extract_filename(filepath: &str) -> String {
    let name = filepath.rsplit('/').next().unwrap_or(filepath);
    let keep = name.chars().count().saturating_sub(4);
    name.chars().take(keep).collect()
}

/// Run `f`, logging how long it took and which process ran it.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    tracing::info!(
        "Function {} running on process {} took {:.4}s.",
        label,
        std::process::id(),
        start.elapsed().as_secs_f64()
    );
    result
}

/// Text of the first `<tag>` child of a synthetic root wrapped around
/// `input`. Nested elements of the same name are not searched, and the
/// text is what precedes the element's first child. A self-closing
/// `<tag/>` yields an empty string.
pub fn extract_tag(input: &str, tag: &str) -> Result<String> {
    let wrapped = format!("<root>{input}</root>");
    let doc = roxmltree::Document::parse(&wrapped)
        .map_err(|e| PipelineError::MalformedXml(e.to_string()))?;

    doc.root_element()
        .children()
        .find(|node| node.is_element() && node.has_tag_name(tag))
        .map(|node| node.text().unwrap_or_default().to_string())
        .ok_or_else(|| PipelineError::MissingTag(tag.to_string()))
}
