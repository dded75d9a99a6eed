use core::fmt;

/// `TaskResult` 统一表示跨核任务的执行结果。
///
/// # 契约说明（What）
/// - `Ok(T)`：任务成功完成并返回值。
/// - `Err(TaskError)`：任务被拒绝、执行器终止或任务自身崩溃。
pub type TaskResult<T = ()> = Result<T, TaskError>;

/// `TaskError` 枚举跨核任务失败的原因。
///
/// # 设计背景（Why）
/// - 吸收 Tokio `JoinError` 与 Seastar `broken_promise` 的分类经验，
///   将“提交失败”与“执行失败”区分开，便于调用方决定是否重试。
///
/// # 风险提示（Trade-offs）
/// - `Panicked` 不携带 panic payload；若宿主需要堆栈信息，应在执行器
///   实现层捕获后另行上报。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// 目标分片拒绝接收任务（队列满、分片不存在）。
    Rejected,
    /// 执行器已终止，任务不会被运行。
    Terminated,
    /// 任务在目标分片上执行时崩溃。
    Panicked,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Rejected => write!(f, "task rejected by target shard"),
            TaskError::Terminated => write!(f, "executor terminated"),
            TaskError::Panicked => write!(f, "task panicked"),
        }
    }
}
