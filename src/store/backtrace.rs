//! Call-site backtraces for slow nested calls.

use std::backtrace::Backtrace;

/// Key under which a parsed backtrace is stored in `MetricKey::extra`
pub const BACKTRACE_EXTRA_KEY: &str = "backtrace";

/// Capture the current call stack as `function (at file:line)` strings
///
/// Frames belonging to the capture machinery and to this crate's store are
/// skipped, so the first frame is the instrumented call site.
pub fn capture_backtrace(max_frames: usize) -> Vec<String> {
    let rendered = Backtrace::force_capture().to_string();
    parse_backtrace(&rendered, max_frames)
}

/// Parse the `Display` form of a `std::backtrace::Backtrace`
///
/// The rendered form is a sequence of numbered symbol lines (`  3: name`),
/// each optionally followed by an `at path:line:col` line.
pub fn parse_backtrace(rendered: &str, max_frames: usize) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in rendered.lines() {
        let line = line.trim();

        if let Some(symbol) = symbol_of(line) {
            if let Some(frame) = current.take() {
                frames.push(frame);
            }
            current = Some(symbol.to_string());
        } else if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = current.as_mut() {
                frame.push_str(" (at ");
                frame.push_str(location);
                frame.push(')');
            }
        }
    }
    if let Some(frame) = current {
        frames.push(frame);
    }

    frames
        .into_iter()
        .filter(|frame| !is_internal(frame))
        .take(max_frames)
        .collect()
}

/// Symbol part of a `N: symbol` line
fn symbol_of(line: &str) -> Option<&str> {
    let (index, symbol) = line.split_once(": ")?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(symbol.trim())
}

fn is_internal(frame: &str) -> bool {
    frame.starts_with("std::backtrace") || frame.starts_with(STORE_PATH)
}

const STORE_PATH: &str = concat!(env!("CARGO_CRATE_NAME"), "::store::");
