//! Dress to Impress HTTP Client
//!
//! 把规范化后的装扮数据转发给 Impress 的 `/pets/submit.json`

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::domain::Submission;

/// 转发错误
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to serialize viewer data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("impress request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("impress returned HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Impress 接受后的响应
#[derive(Debug)]
pub struct SubmitOutcome {
    pub status: StatusCode,
    pub body: String,
}

/// Impress 客户端
#[derive(Clone, Debug)]
pub struct ImpressClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl ImpressClient {
    /// 创建客户端
    ///
    /// # Arguments
    /// * `host` - Impress 地址，如 `https://impress.openneo.net`
    /// * `timeout` - 单次提交的超时时间
    pub fn new(client: Client, host: impl Into<String>, timeout: Duration) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            client,
            host,
            timeout,
        }
    }

    pub fn submit_url(&self) -> String {
        format!("{}/pets/submit.json", self.host)
    }

    /// 提交一条装扮数据
    ///
    /// 非 2xx 响应返回 `SubmitError::Rejected`
    pub async fn submit(&self, submission: &Submission) -> Result<SubmitOutcome, SubmitError> {
        let form = submission_form(submission)?;

        let response = self
            .client
            .post(self.submit_url())
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(SubmitOutcome { status, body })
        } else {
            Err(SubmitError::Rejected { status, body })
        }
    }
}

/// 构建提交表单：`viewer_data`，以及已知时的 `user_id`
fn submission_form(submission: &Submission) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    let viewer_data = serde_json::to_string(&submission.customization)?;
    let mut form = vec![("viewer_data", viewer_data)];
    if let Some(user_id) = submission.known_user_id() {
        form.push(("user_id", user_id.to_string()));
    }
    Ok(form)
}
