//! Call frames and the handles that identify them.

use std::time::{Duration, Instant};

/// Opaque token returned by `record` and handed back to `stop_recording`
///
/// Compared by frame id, so a handle from an earlier transaction or from a
/// skipped frame never matches the current stack top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle {
    pub(crate) id: u64,
}

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One in-flight instrumented call
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub(crate) id: u64,
    pub metric_name: String,
    pub start_time: Instant,

    /// Inclusive time of children that have already closed
    pub children_time: Duration,
}

impl CallFrame {
    pub(crate) fn new(id: u64, metric_name: String, start_time: Instant) -> Self {
        Self {
            id,
            metric_name,
            start_time,
            children_time: Duration::ZERO,
        }
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle { id: self.id }
    }

    pub(crate) fn matches(&self, handle: FrameHandle) -> bool {
        self.id == handle.id
    }
}

/// Whether closing a frame may complete the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameKind {
    /// An ordinary nested call
    #[default]
    Nested,

    /// The transaction's entry point (a controller action, a job, ...)
    EntryPoint,
}

impl FrameKind {
    /// Conventional classification for agents that name entry points
    /// `Controller/...`
    pub fn classify(metric_name: &str) -> Self {
        if metric_name.starts_with("Controller/") {
            FrameKind::EntryPoint
        } else {
            FrameKind::Nested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(FrameKind::classify("Controller/Home#index"), FrameKind::EntryPoint);
        assert_eq!(FrameKind::classify("ActiveRecord/find"), FrameKind::Nested);
        assert_eq!(FrameKind::classify("MyController/x"), FrameKind::Nested);
    }

    #[test]
    fn test_handle_matches_only_its_frame() {
        let now = Instant::now();
        let a = CallFrame::new(1, "A".to_string(), now);
        let b = CallFrame::new(2, "A".to_string(), now);

        assert!(a.matches(a.handle()));
        assert!(!a.matches(b.handle()));
    }
}
