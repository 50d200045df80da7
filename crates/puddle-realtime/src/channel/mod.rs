//! Topic membership.

pub mod channel;
pub mod registry;
pub mod subscription;
pub mod types;

pub use registry::TopicRegistry;
pub use types::Topic;
