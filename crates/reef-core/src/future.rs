use alloc::boxed::Box;
use core::{future::Future, pin::Pin};

/// `BoxFuture` 是 `reef-core` 在 `no_std + alloc` 下使用的通用 Future 包装。
///
/// # 设计背景（Why）
/// - 跨核任务提交与数据汇等契约都需要对象安全的异步返回值；统一别名可避免
///   各实现 crate 自行引入包装类型造成接口漂移。
///
/// # 契约说明（What）
/// - 约束 Future 为 `Send + 'a`，可安全跨线程移动。
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `LocalBoxFuture` 封装 `!Send` Future。
///
/// # 设计背景（Why）
/// - 单线程分片内部的任务无需跨线程迁移，放宽 `Send` 约束可以容纳持有
///   核内独占资源的 Future。
///
/// # 契约说明（What）
/// - 仅要求 `'a` 生命周期约束，运行在调用方指定的分片上下文内。
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
