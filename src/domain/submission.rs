//! 转发到 Impress 的提交记录

use super::customization::Customization;

/// 未知提交者的标记值
pub const UNKNOWN_SUBMITTER: i64 = -1;

/// 待转发的装扮数据
///
/// 只存在于提交队列中，worker 取出后即被消费
#[derive(Clone, Debug)]
pub struct Submission {
    pub customization: Customization,
    /// Impress 用户 ID，非正数表示未知
    pub impress_user_id: i64,
}

impl Submission {
    pub fn new(customization: Customization, impress_user_id: i64) -> Self {
        Self {
            customization,
            impress_user_id,
        }
    }

    /// 匿名提交
    pub fn anonymous(customization: Customization) -> Self {
        Self::new(customization, UNKNOWN_SUBMITTER)
    }

    /// 从请求参数解析提交者，解析失败视为未知
    pub fn parse_user_id(raw: Option<&str>) -> i64 {
        raw.and_then(|v| v.trim().parse().ok())
            .unwrap_or(UNKNOWN_SUBMITTER)
    }

    /// 仅正数 ID 会随表单上报
    pub fn known_user_id(&self) -> Option<i64> {
        (self.impress_user_id > 0).then_some(self.impress_user_id)
    }
}
