#![cfg_attr(not(feature = "std"), no_std)]
#![doc = "reef-core: 按核分片（per-CPU shard）异步网络运行时的核心契约。"]
#![doc = ""]
#![doc = "本 crate 只定义数据面各组件之间的最小公共接口：稳定错误域、对象安全的"]
#![doc = "Future 别名、跨核任务提交契约与异步数据汇契约。调度器与协议栈的具体实现"]
#![doc = "位于各自的实现 crate，按契约注入。"]

extern crate alloc;

pub mod error;
pub mod future;
pub mod runtime;
pub mod sink;

pub use error::{CoreError, ErrorCause, codes};
pub use future::{BoxFuture, LocalBoxFuture};
pub use runtime::{CoreId, CrossCoreExecutor, InlineExecutor, TaskError, TaskResult};
pub use sink::DataSink;

use alloc::boxed::Box;
use core::fmt;

/// `reef-core` 中所有错误必须实现的 `no_std` 基础 Trait。
///
/// # 设计背景（Why）
/// - `std::error::Error` 在 `no_std` 环境中不可用，而运行时需要一个对象安全、
///   与平台无关的错误抽象来串联底层错误链。
///
/// # 逻辑解析（How）
/// - 约束实现者提供 `Debug` 与 `Display`，便于日志与可观测性收集。
/// - `source` 递归返回链路上的上游错误，语义与 `std::error::Error::source` 对齐，
///   兼容既有生态的错误处理约定。
///
/// # 契约说明（What）
/// - **前置条件**：实现类型必须满足 `'static` 生命周期（若需包装进 [`ErrorCause`]）。
/// - **后置条件**：`source` 返回的引用生命周期受限于 `self`，防止悬垂引用。
pub trait Error: fmt::Debug + fmt::Display {
    /// 返回当前错误的上游来源。
    fn source(&self) -> Option<&(dyn Error + 'static)>;
}

impl<E> Error for Box<E>
where
    E: Error + ?Sized,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        (**self).source()
    }
}
