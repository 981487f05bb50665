//! Data bus shared with presentation layers

pub mod notify;
pub mod store;

pub use notify::{NotificationLog, NotificationSink};
pub use store::{StateStore, SubscriptionId};
