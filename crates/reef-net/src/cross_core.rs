use crate::deleter::{Deleter, make_deleter};
use alloc::{boxed::Box, sync::Arc};
use reef_core::{CoreId, CrossCoreExecutor};

/// `CrossCpuReleaser` 把释放义务改写为“回到归属分片再执行”。
///
/// # 设计背景（Why）
/// - 缓冲通常来自核本地的内存池：在异核上触发释放要么破坏该池的空闲
///   链表，要么至少让内存失去本地复用机会。正确做法不是对释放加锁同步，
///   而是把释放动作整体搬运回分配它的核。
///
/// # 逻辑解析（How）
/// - [`rebind`](CrossCpuReleaser::rebind) 接收一条义务 `d`，返回新义务 `d'`：
///   `d'` 触发时通过 [`CrossCoreExecutor::submit_to`] 把 `d` 的析构投递到
///   归属分片，随即返回——投递产生的完成句柄被即弃（fire-and-forget），
///   触发方从不等待。
/// - 若执行器报告当前已在归属分片，则就地释放，省一次队列往返；两条
///   路径对外语义一致，正确性不依赖走哪条。
///
/// # 契约说明（What）
/// - **所有权**：`d` 与可选的完成回调都移入投递的闭包，存活期覆盖整个
///   异步投递过程。
/// - **顺序**：在目标分片上，先析构迁入的义务，再调用完成回调——回调
///   观察到的必然是已经释放完毕的状态。
#[derive(Clone)]
pub struct CrossCpuReleaser {
    executor: Arc<dyn CrossCoreExecutor>,
    origin: CoreId,
}

impl CrossCpuReleaser {
    /// 绑定执行器与归属分片。
    pub fn new(executor: Arc<dyn CrossCoreExecutor>, origin: CoreId) -> Self {
        CrossCpuReleaser { executor, origin }
    }

    /// 归属分片标识。
    pub fn origin(&self) -> CoreId {
        self.origin
    }

    /// 改写义务：触发时把 `deleter` 的析构搬运到归属分片。
    pub fn rebind(&self, deleter: Deleter) -> Deleter {
        self.relocate(deleter, None)
    }

    /// 改写义务并注册完成回调；回调在搬运后的释放完成之后运行。
    pub fn rebind_with_completion(
        &self,
        deleter: Deleter,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Deleter {
        self.relocate(deleter, Some(Box::new(on_done)))
    }

    fn relocate(&self, deleter: Deleter, on_done: Option<Box<dyn FnOnce() + Send>>) -> Deleter {
        let executor = Arc::clone(&self.executor);
        let origin = self.origin;
        make_deleter(move || {
            if executor.current_core() == Some(origin) {
                // 已在归属分片：免去队列往返，仍然保持“先释放、后回调”。
                drop(deleter);
                if let Some(on_done) = on_done {
                    on_done();
                }
                return;
            }
            let task: Box<dyn FnOnce() + Send> = Box::new(move || {
                // 义务必须从闭包捕获中析构于目标分片；随后才轮到完成回调，
                // 使其不可能观察到释放到一半的资源。
                drop(deleter);
                if let Some(on_done) = on_done {
                    on_done();
                }
            });
            // 完成句柄即弃：包的析构路径不等待搬运后的释放完成。
            let _completion = executor.submit_to(origin, task);
            tracing::trace!(origin = origin.as_u32(), "release relocated to owning shard");
        })
    }
}

impl core::fmt::Debug for CrossCpuReleaser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CrossCpuReleaser")
            .field("origin", &self.origin)
            .finish()
    }
}
