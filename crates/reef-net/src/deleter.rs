use alloc::{boxed::Box, sync::Arc};
use bytes::BytesMut;
use core::{fmt, mem};
use spin::Mutex;

/// `Deleter` 是 move-only 的释放义务：恰好一次地归还它所覆盖的后备存储。
///
/// # 设计背景（Why）
/// - 零拷贝缓冲的全部内存安全都押在“释放恰好一次、且可被推迟到任意
///   执行上下文”上。把释放建模为拥有所有权的值，使移动语义天然提供
///   “已移出即空操作”的保证，无需任何运行时触发标记。
/// - 复制被禁止：两个持有方各自声称拥有同一释放动作必然导致二次释放。
///   确需多视图共享时，必须通过 [`Deleter::share`] 显式升级为引用计数
///   所有权，而非隐式别名。
///
/// # 逻辑解析（How）
/// - 内部为 `Option<Release>`：`None` 即空义务；[`Deleter::release`] 通过
///   `Option::take` 取出动作执行，重复调用自动成为空操作；`Drop` 委托
///   `release`。
/// - [`Release`] 是封闭的标签变体：裸存储、`bytes` 缓冲与共享单元的释放
///   动作就是自身的析构，仅任意自定义动作需要调用装箱闭包。
///
/// # 契约说明（What）
/// - **前置条件**：释放动作不得 panic——它可能运行在 `Drop` 路径或目标
///   分片的任务队列上。
/// - **后置条件**：`release`/`Drop` 之后义务为空；组合（[`Deleter::chain`]）
///   触发时两侧各恰好执行一次，顺序不作承诺。
///
/// # 风险提示（Trade-offs）
/// - 组合以嵌套而非扁平链表表示，深度组合会形成递归析构；包缓冲场景的
///   组合深度与片段数同阶，实践中可忽略。
pub struct Deleter {
    action: Option<Release>,
}

/// 释放动作的封闭变体集合。
///
/// 反复出现的释放形态是有限的，封闭枚举让每种形态的所有权流向可被穷尽
/// 检查；只有无界的自定义动作退化为装箱闭包。
enum Release {
    /// 独立堆分配：析构即归还。
    Storage(Box<[u8]>),
    /// `bytes` 可写缓冲：析构即归还（或归还给其引用计数池）。
    Buffer(BytesMut),
    /// 任意自定义释放动作。
    Action(Box<dyn FnOnce() + Send>),
    /// 两条义务的组合：双方各恰好触发一次。
    Pair(Box<(Deleter, Deleter)>),
    /// 引用计数共享单元：最后一个句柄析构时触发内层义务。
    Shared(Arc<SharedRelease>),
}

impl Release {
    fn run(self) {
        // 除自定义动作外，各变体的释放动作就是自身的析构。
        if let Release::Action(action) = self {
            action();
        }
    }
}

/// 共享释放单元：把一条义务升格为可被多个句柄共同持有。
///
/// `spin::Mutex` 在此仅为满足 `Arc` 要求的 `Sync` 约束；内层义务从不被
/// 并发访问，它只在最后一个句柄释放时经由 `Drop` 触发一次。
struct SharedRelease {
    slot: Mutex<Deleter>,
}

impl Drop for SharedRelease {
    fn drop(&mut self) {
        self.slot.lock().release();
    }
}

impl Deleter {
    /// 构造空义务（组合运算的单位元）。
    pub const fn empty() -> Self {
        Deleter { action: None }
    }

    /// 接管一块独立堆分配，析构时归还。
    pub fn from_storage(storage: Box<[u8]>) -> Self {
        Deleter {
            action: Some(Release::Storage(storage)),
        }
    }

    /// 接管一块 `bytes` 可写缓冲，析构时归还。
    pub fn from_buffer(buffer: BytesMut) -> Self {
        Deleter {
            action: Some(Release::Buffer(buffer)),
        }
    }

    /// 是否仍持有未触发的释放义务。
    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }

    /// 立即触发释放义务；对空义务或已触发的义务是空操作。
    pub fn release(&mut self) {
        if let Some(release) = self.action.take() {
            release.run();
        }
    }

    /// 组合两条义务：返回的义务触发时双方各恰好执行一次。
    ///
    /// # 契约说明（What）
    /// - 空义务是单位元：任一侧为空时直接返回另一侧，不引入包装层。
    /// - 组合不读取、不移动任何被覆盖的字节，仅合并所有权。
    pub fn chain(mut self, mut other: Deleter) -> Deleter {
        match (self.action.take(), other.action.take()) {
            (None, None) => Deleter::empty(),
            (Some(action), None) | (None, Some(action)) => Deleter {
                action: Some(action),
            },
            (Some(a), Some(b)) => Deleter {
                action: Some(Release::Pair(Box::new((
                    Deleter { action: Some(a) },
                    Deleter { action: Some(b) },
                )))),
            },
        }
    }

    /// 把义务升格为引用计数共享，并返回一个新句柄。
    ///
    /// # 设计背景（Why）
    /// - 零拷贝切片让多个包引用同一后备存储，释放必须推迟到最后一个
    ///   视图消亡。共享是显式的升级动作，而非 `Clone`——隐式复制义务
    ///   等价于宣告二次释放合法。
    ///
    /// # 契约说明（What）
    /// - 调用后 `self` 与返回值持有同一共享单元；内层义务在两者（以及
    ///   后续更多句柄）全部析构后恰好触发一次。
    /// - 对空义务共享得到空义务。
    pub fn share(&mut self) -> Deleter {
        let shared = match self.action.take() {
            None => return Deleter::empty(),
            Some(Release::Shared(shared)) => shared,
            Some(action) => Arc::new(SharedRelease {
                slot: Mutex::new(Deleter {
                    action: Some(action),
                }),
            }),
        };
        self.action = Some(Release::Shared(Arc::clone(&shared)));
        Deleter {
            action: Some(Release::Shared(shared)),
        }
    }

    /// 取出当前义务，原地留下空义务。
    pub(crate) fn take(&mut self) -> Deleter {
        mem::take(self)
    }
}

impl Default for Deleter {
    fn default() -> Self {
        Deleter::empty()
    }
}

impl Drop for Deleter {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Deleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.action {
            None => "empty",
            Some(Release::Storage(_)) => "storage",
            Some(Release::Buffer(_)) => "buffer",
            Some(Release::Action(_)) => "action",
            Some(Release::Pair(_)) => "pair",
            Some(Release::Shared(_)) => "shared",
        };
        f.debug_tuple("Deleter").field(&kind).finish()
    }
}

/// 把任意零参释放动作包装为 [`Deleter`]。
///
/// # 契约说明（What）
/// - `action` 在义务触发时恰好执行一次；义务被移动后由新持有方触发。
/// - `action` 不得 panic，它可能运行在析构路径或其它分片的任务队列上。
pub fn make_deleter(action: impl FnOnce() + Send + 'static) -> Deleter {
    Deleter {
        action: Some(Release::Action(Box::new(action))),
    }
}
