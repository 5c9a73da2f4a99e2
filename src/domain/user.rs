//! 用户领域模型

use serde::Serialize;

/// Neopets 用户及其宠物列表
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct User {
    /// 规范化后的用户名（去空白、小写）
    pub name: String,
    /// 宠物名，保持来源中的顺序
    pub pet_names: Vec<String>,
}

impl User {
    /// 创建用户，自动规范化用户名
    pub fn new(name: &str, pet_names: Vec<String>) -> Self {
        Self {
            name: normalize_user_name(name),
            pet_names,
        }
    }
}

/// 规范化用户名
pub fn normalize_user_name(name: &str) -> String {
    name.trim().to_lowercase()
}
