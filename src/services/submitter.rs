//! 装扮数据转发队列
//!
//! 请求处理方把数据放入有界队列后立即返回，单个后台 worker 按 FIFO 顺序
//! 转发给 Impress。
//!
//! 工作流程：
//! 1. handler 调用 `SubmissionQueue::enqueue`，队列满时等待（背压）
//! 2. worker 取出一条，POST 到 `/pets/submit.json`
//! 3. 记录结果，失败的条目直接丢弃，继续处理下一条

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::Submission;
use crate::infra::ImpressClient;

/// worker 已退出，队列不再接收数据
#[derive(Debug, Error)]
#[error("submission queue is closed")]
pub struct QueueClosed;

/// 提交队列的生产端
#[derive(Clone, Debug)]
pub struct SubmissionQueue {
    sender: mpsc::Sender<Submission>,
}

impl SubmissionQueue {
    /// 创建容量为 `capacity` 的队列，返回生产端和消费端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Submission>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// 放入队列
    ///
    /// 队列未满时立即返回；队列满时等待 worker 腾出空间
    pub async fn enqueue(&self, submission: Submission) -> Result<(), QueueClosed> {
        self.sender.send(submission).await.map_err(|_| QueueClosed)
    }
}

/// 启动转发 worker
pub fn spawn(
    impress: ImpressClient,
    receiver: mpsc::Receiver<Submission>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_worker(impress, receiver, shutdown))
}

/// worker 主循环
///
/// 所有生产端被释放或收到 shutdown 时退出；单条转发失败不会中断循环
pub async fn run_worker(
    impress: ImpressClient,
    mut receiver: mpsc::Receiver<Submission>,
    shutdown: CancellationToken,
) {
    info!(submit_url = %impress.submit_url(), "Starting impress submitter");

    loop {
        let submission = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Impress submitter shutting down");
                break;
            }
            next = receiver.recv() => match next {
                Some(submission) => submission,
                None => {
                    info!("Submission queue closed, impress submitter exiting");
                    break;
                }
            },
        };

        relay(&impress, &submission).await;
    }
}

/// 转发一条数据并记录结果
async fn relay(impress: &ImpressClient, submission: &Submission) {
    let pet = &submission.customization.custom_pet.name;
    debug!(pet = %pet, user_id = submission.impress_user_id, "Relaying submission");

    match impress.submit(submission).await {
        Ok(outcome) => {
            info!(
                pet = %pet,
                status = %outcome.status,
                body = %outcome.body,
                "Impress responded"
            );
        }
        Err(e) => {
            warn!(pet = %pet, error = %e, "Impress submission failed");
        }
    }
}
