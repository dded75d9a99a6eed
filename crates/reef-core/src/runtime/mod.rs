//! 分片运行时契约模块。
//!
//! # 模块架构（Why）
//! - 运行时采用“每核一个逻辑线程、协作式调度”的模型：一个分片内的操作
//!   不会被并发打断，跨分片协作只能通过显式任务提交完成。
//! - 本模块仅定义数据面消费的最小接口（分片标识、任务结果、跨核提交），
//!   调度器本体由宿主运行时提供。
//!
//! # 设计总览（How）
//! - [`task`] 定义任务失败的标准分类 [`TaskError`] 与结果别名 [`TaskResult`]。
//! - [`shard`] 定义分片标识 [`CoreId`] 与跨核提交契约 [`CrossCoreExecutor`]，
//!   并提供单分片参考实现 [`InlineExecutor`]。

pub mod shard;
pub mod task;

pub use shard::{CoreId, CrossCoreExecutor, InlineExecutor};
pub use task::{TaskError, TaskResult};
