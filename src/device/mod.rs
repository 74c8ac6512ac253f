//! Execution contexts and memory buffers consumed by the batch executor.

mod buffer;
mod context;

pub use buffer::{DeviceVec, FieldSlice, FieldSliceMut, Location};
pub use context::ExecutionContext;
