//! `cross_core_contract` 集成测试：验证释放义务的跨核搬运语义。
//!
//! # 测试总览（Why）
//! - 核本地分配器要求释放回到归属分片；用可手动排空的桩执行器观察
//!   “析构只入队、排空才释放”的时序；
//! - 完成回调必须严格晚于搬运后的释放，事件序列逐条核对。

use reef_core::{CoreId, CrossCoreExecutor, TaskResult};
use reef_net::{CrossCpuReleaser, Fragment, Packet, make_deleter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 桩执行器：把任务按目标分片入队，由测试显式排空。
///
/// `submit_to` 返回的完成句柄立即解析——契约规定任务的执行不依赖句柄
/// 是否被轮询，本桩以“入队即受理”模拟该语义。
struct StubExecutor {
    current: CoreId,
    queues: Mutex<HashMap<u32, Vec<Box<dyn FnOnce() + Send>>>>,
}

impl StubExecutor {
    fn new(current: CoreId) -> Arc<Self> {
        Arc::new(StubExecutor {
            current,
            queues: Mutex::new(HashMap::new()),
        })
    }

    /// 目标分片队列中的待执行任务数。
    fn pending(&self, core: CoreId) -> usize {
        self.queues
            .lock()
            .expect("queues mutex")
            .get(&core.as_u32())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// 排空目标分片队列（模拟该分片的事件循环运行一轮），返回执行的任务数。
    fn drain(&self, core: CoreId) -> usize {
        let tasks = self
            .queues
            .lock()
            .expect("queues mutex")
            .remove(&core.as_u32())
            .unwrap_or_default();
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl CrossCoreExecutor for StubExecutor {
    fn submit_to(
        &self,
        target: CoreId,
        task: Box<dyn FnOnce() + Send + 'static>,
    ) -> reef_core::BoxFuture<'static, TaskResult> {
        self.queues
            .lock()
            .expect("queues mutex")
            .entry(target.as_u32())
            .or_default()
            .push(task);
        Box::pin(std::future::ready(Ok(())))
    }

    fn current_core(&self) -> Option<CoreId> {
        Some(self.current)
    }
}

/// 以计数义务构造“分配在别的分片上”的包。
fn counted_packet(bytes: &[u8]) -> (Packet, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&counter);
    let mut storage: Box<[u8]> = Box::from(bytes);
    let frag = Fragment::from_raw_parts(storage.as_mut_ptr(), storage.len()).expect("非空存储");
    let deleter = make_deleter(move || {
        probe.fetch_add(1, Ordering::SeqCst);
        drop(storage);
    });
    // SAFETY: storage 由义务闭包独占持有，触发前始终有效。
    let packet = unsafe { Packet::from_raw_parts(frag, deleter) };
    (packet, counter)
}

/// 异核析构只把释放入队到归属分片，排空队列后才真正释放。
#[test]
fn release_is_deferred_to_origin_queue() {
    let origin = CoreId::new(1);
    let executor = StubExecutor::new(CoreId::new(0));
    let releaser = CrossCpuReleaser::new(executor.clone(), origin);

    let (packet, counter) = counted_packet(b"core-local");
    let rebound = packet.free_on_cpu(&releaser);
    assert_eq!(rebound.to_vec(), b"core-local", "改写义务不得触碰字节");

    drop(rebound);
    assert_eq!(counter.load(Ordering::SeqCst), 0, "析构只应入队，不得就地释放");
    assert_eq!(executor.pending(origin), 1);

    assert_eq!(executor.drain(origin), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 完成回调严格晚于搬运后的释放。
#[test]
fn completion_callback_runs_after_release() {
    let origin = CoreId::new(2);
    let executor = StubExecutor::new(CoreId::new(0));
    let releaser = CrossCpuReleaser::new(executor.clone(), origin);

    let events: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let release_log = Arc::clone(&events);
    let deleter = make_deleter(move || {
        release_log.lock().expect("events mutex").push("release");
    });
    let frag_bytes: &'static [u8] = b"x";
    let frag = Fragment::from_raw_parts(frag_bytes.as_ptr() as *mut u8, frag_bytes.len())
        .expect("静态存储");
    // SAFETY: 静态字节在整个进程期间有效，且本测试不经任何路径写入该片段。
    let packet = unsafe { Packet::from_raw_parts(frag, deleter) };

    let done_log = Arc::clone(&events);
    let rebound = packet.free_on_cpu_notify(&releaser, move || {
        done_log.lock().expect("events mutex").push("done");
    });
    drop(rebound);
    assert!(events.lock().expect("events mutex").is_empty());

    executor.drain(origin);
    assert_eq!(
        events.lock().expect("events mutex").as_slice(),
        ["release", "done"],
        "回调不得先于释放观察到资源"
    );
}

/// 已在归属分片时允许内联释放；对外语义与入队路径一致。
#[test]
fn inline_fast_path_on_owning_shard() {
    let origin = CoreId::new(3);
    let executor = StubExecutor::new(origin);
    let releaser = CrossCpuReleaser::new(executor.clone(), origin);

    let (packet, counter) = counted_packet(b"already home");
    let rebound = packet.free_on_cpu(&releaser);
    drop(rebound);
    assert_eq!(counter.load(Ordering::SeqCst), 1, "本核释放无需队列往返");
    assert_eq!(executor.pending(origin), 0);
}

/// 共享视图 + 跨核改写叠加：搬运的是共享句柄，最后一个句柄在归属分片
/// 析构时才触发真正的释放。
#[test]
fn shared_views_compose_with_relocation() {
    let origin = CoreId::new(1);
    let executor = StubExecutor::new(CoreId::new(0));
    let releaser = CrossCpuReleaser::new(executor.clone(), origin);

    let (mut packet, counter) = counted_packet(b"shared");
    let view = packet.share();
    let rebound = packet.free_on_cpu(&releaser);

    drop(view);
    assert_eq!(counter.load(Ordering::SeqCst), 0, "改写后的句柄仍然存活");
    drop(rebound);
    assert_eq!(counter.load(Ordering::SeqCst), 0, "析构只应入队");
    assert_eq!(executor.pending(origin), 1);
    executor.drain(origin);
    assert_eq!(counter.load(Ordering::SeqCst), 1, "最后一个共享句柄在归属分片析构");
}
