//! Call-stack tracking within a single transaction.

pub mod context;
pub mod frame;

pub use context::TransactionContext;
pub use frame::{CallFrame, FrameHandle, FrameKind};
