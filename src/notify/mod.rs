mod batcher;

pub use batcher::{overflow_heading, NotificationBatcher};
