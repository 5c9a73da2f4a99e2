//! 服务层模块
//!
//! 包含核心业务逻辑

pub mod customization;
pub mod status;
pub mod submitter;
pub mod user;
