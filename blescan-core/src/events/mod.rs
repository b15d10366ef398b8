//! Events delivered to scan session subscribers

mod sink;
pub mod types;

pub use sink::{ChannelSink, EventSink, SubscriptionId};
pub use types::ScanEvent;
