//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod customization;
pub mod submission;
pub mod user;

// Re-exports for convenience
pub use customization::{
    Biology, ClosetItem, CustomPet, Customization, Equipped, ObjectAsset, ObjectInfo,
};
pub use submission::Submission;
pub use user::User;
