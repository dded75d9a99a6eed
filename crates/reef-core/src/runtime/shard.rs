use super::task::TaskResult;
use crate::future::BoxFuture;
use alloc::boxed::Box;
use core::fmt;

/// `CoreId` 标识一个逻辑分片（per-CPU shard）。
///
/// # 设计背景（Why）
/// - 内存分配器是核本地的：一块缓冲必须回到分配它的核上释放，否则会破坏
///   该核空闲链表或至少丧失本地复用能力。稳定的分片标识是跨核协作的前提。
///
/// # 契约说明（What）
/// - 编号空间由宿主运行时定义，通常为 `0..nr_shards` 的稠密区间；
///   本 crate 只要求其可比较、可复制、可打印。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CoreId(u32);

impl CoreId {
    /// 以原始编号构造分片标识。
    pub const fn new(id: u32) -> Self {
        CoreId(id)
    }

    /// 返回原始编号，用于日志字段或数组下标。
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard-{}", self.0)
    }
}

/// `CrossCoreExecutor` 定义跨核任务提交契约（`submit_to`）。
///
/// # 设计背景（Why）
/// - 分片模型禁止共享可变状态，跨核协作的唯一通道是把一个拥有所有权的闭包
///   发送到目标核的任务队列。缓冲的跨核释放（归还核本地分配器）完全依赖
///   该原语。
///
/// # 逻辑解析（How）
/// - `submit_to` 将闭包入队到目标分片并立即返回完成句柄；句柄在闭包运行后
///   解析为 [`TaskResult`]。
/// - `current_core` 供调用方做“已在目标核”时的内联快路径，允许返回 `None`
///   表示实现不追踪当前核。
///
/// # 契约说明（What）
/// - **前置条件**：`task` 必须满足 `Send + 'static`，其捕获的资源所有权随
///   提交转移给执行器。
/// - **后置条件**：任务的入队与执行不得依赖返回的完成句柄是否被轮询——
///   调用方可以即弃句柄（fire-and-forget），任务仍必须运行。
/// - 同一分片上的任务按提交顺序执行；跨分片之间无顺序保证。
///
/// # 风险提示（Trade-offs）
/// - 对象安全接口要求闭包装箱；对延迟极端敏感的路径可在宿主侧提供特化
///   入口，本契约保持最小。
pub trait CrossCoreExecutor: Send + Sync + 'static {
    /// 将任务提交到目标分片的队列。
    fn submit_to(
        &self,
        target: CoreId,
        task: Box<dyn FnOnce() + Send + 'static>,
    ) -> BoxFuture<'static, TaskResult>;

    /// 返回调用线程当前所在的分片，若实现不追踪则为 `None`。
    fn current_core(&self) -> Option<CoreId> {
        None
    }
}

/// `InlineExecutor` 是单分片场景的参考实现：所有任务就地同步执行。
///
/// # 设计背景（Why）
/// - 单核部署与单元测试不需要真实的跨核队列；就地执行既满足契约的
///   “句柄即弃任务仍运行”要求，又避免引入线程基础设施。
///
/// # 契约说明（What）
/// - `submit_to` 忽略目标分片编号，闭包在调用线程立即运行；
/// - `current_core` 恒等于构造时声明的分片，因此内联快路径总是可用。
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor {
    core: CoreId,
}

impl InlineExecutor {
    /// 以声明的分片编号构造内联执行器。
    pub const fn new(core: CoreId) -> Self {
        InlineExecutor { core }
    }
}

impl CrossCoreExecutor for InlineExecutor {
    fn submit_to(
        &self,
        _target: CoreId,
        task: Box<dyn FnOnce() + Send + 'static>,
    ) -> BoxFuture<'static, TaskResult> {
        task();
        Box::pin(core::future::ready(Ok(())))
    }

    fn current_core(&self) -> Option<CoreId> {
        Some(self.core)
    }
}
