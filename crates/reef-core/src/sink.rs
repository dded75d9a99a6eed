use crate::error::CoreError;
use alloc::boxed::Box;
use async_trait::async_trait;

/// `DataSink` 是数据面的异步消费端契约。
///
/// # 设计背景（Why）
/// - 发送路径的终点（设备队列、环回、测试收集器）形态各异，上层流水线
///   只关心两个动作：交付一个条目、收尾。以最小接口隔离实现差异，
///   重试与背压策略留在上层传输层。
///
/// # 逻辑解析（How）
/// - `put` 在底层 I/O 接纳条目后解析——语义是“写入已受理”，不承诺持久化；
/// - `close` 冲刷并终结数据汇，此后不得再调用 `put`。
///
/// # 契约说明（What）
/// - **前置条件**：`Item` 的所有权随 `put` 转移给数据汇；调用方不得在
///   `close` 之后继续写入。
/// - **后置条件**：`put` 解析即表示调用方可以安全复用或丢弃其余资源；
///   失败通过 `CoreError` 的错误通道传播，本契约不解释其内容。
///
/// # 风险提示（Trade-offs）
/// - 接口刻意不提供部分失败语义；需要细粒度确认的场景应在实现层扩展，
///   而非放宽本契约。
#[async_trait]
pub trait DataSink: Send {
    /// 数据汇消费的条目类型。
    type Item: Send;

    /// 异步交付一个条目，解析即表示写入已受理。
    async fn put(&mut self, item: Self::Item) -> Result<(), CoreError>;

    /// 冲刷并终结数据汇。
    async fn close(&mut self) -> Result<(), CoreError>;
}
