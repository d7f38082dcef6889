/// Pure per-hour dispatch rules.
pub mod dispatch;
pub mod engine;
pub mod matcher;
pub mod result;
pub mod types;

pub use engine::simulate;
pub use result::DispatchResult;
pub use types::{DispatchWindows, HourStep, HourWindow, PriceWindow, StorageConfig};
