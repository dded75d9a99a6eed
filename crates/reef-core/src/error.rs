use crate::Error;
use alloc::{borrow::Cow, boxed::Box};
use core::fmt;

/// `CoreError` 提供稳定的错误码与根因链路，是数据面错误分层的最底层。
///
/// # 设计背景（Why）
/// - 缓冲、切片与跨核释放在不同层次产生的故障需要合流为统一的错误码，
///   以便日志、指标与告警系统执行精确的自动化治理。
/// - 框架需兼容 `no_std + alloc` 场景，因此不直接依赖 `std::error::Error`，
///   而是复用 crate 内部定义的轻量 [`Error`] 抽象。
///
/// # 逻辑解析（How）
/// - `code` 始终为 `'static` 字符串，承载稳定语义；`message` 面向排障人员；
///   `cause` 可选挂载底层原因并通过 `source()` 暴露完整链路。
///
/// # 契约说明（What）
/// - **前置条件**：调用方必须使用 [`codes`] 模块或遵循 `<域>.<语义>` 约定的
///   自定义码值。
/// - **后置条件**：除非显式调用 `with_cause`，错误不会包含额外上下文。
///
/// # 设计取舍与风险（Trade-offs）
/// - `message` 采用 `Cow<'static, str>`，静态文案零分配，动态拼接时才落堆。
#[derive(Debug)]
pub struct CoreError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

/// `ErrorCause` 封装底层原因，保持 `Send + Sync` 以方便跨线程传递。
pub type ErrorCause = Box<dyn Error + Send + Sync + 'static>;

impl CoreError {
    /// 使用稳定错误码与消息构造核心错误。
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 附带底层原因并返回新的核心错误。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取人类可读描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn Error + 'static))
    }
}

/// 数据面稳定错误码集合。
///
/// # 设计背景（Why）
/// - 包缓冲子系统的错误面收敛且有限：越界属于调用方编程错误，状态错误属于
///   生命周期误用，分片侧失败来自执行器。标准化码值让上层可以按码分流处置，
///   而无需解析消息文本。
///
/// # 契约说明（What）
/// - 命名遵循 `<域>.<语义>` 约定；码值一经发布即保持稳定，新增语义只追加。
pub mod codes {
    /// 切片、线性化或裁剪请求超出现有字节范围。
    pub const BUFFER_BOUNDS: &str = "buffer.bounds";
    /// 操作与缓冲当前生命周期状态不符（例如对空包取头部窗口）。
    pub const BUFFER_STATE: &str = "buffer.state";
    /// 目标分片拒绝任务提交（队列满或分片不存在）。
    pub const SHARD_REJECTED: &str = "shard.rejected";
    /// 目标分片执行器已经终止。
    pub const SHARD_TERMINATED: &str = "shard.terminated";
    /// 数据汇已关闭，无法继续写入。
    pub const SINK_CLOSED: &str = "sink.closed";
}
