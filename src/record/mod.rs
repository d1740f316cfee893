pub mod normalizer;
pub mod notification;
pub mod trace;

pub use normalizer::{normalize, NormalizedRecord};
pub use notification::{Notification, NotificationBuilder};
pub use trace::capture_stack;
