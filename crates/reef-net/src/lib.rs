#![cfg_attr(not(feature = "std"), no_std)]
#![doc = r#"
# reef-net

## 设计动机（Why）
- **定位**：本 crate 实现分片异步运行时数据面的包缓冲子系统——散聚
  （scatter/gather）缓冲 [`Packet`]、非占有内存视图 [`Fragment`] 与可组合的
  释放义务链 [`Deleter`]。
- **核心难点**：在不复制数据的前提下，让缓冲经过任意次切片、拼接与跨异步
  边界的移交后，底层存储仍然只被释放一次，且释放发生在分配它的核上
  （分配器是核本地的，异核释放会破坏其空闲链表）。
- **设计理念**：所有权类型系统替代运行时簿记——释放义务是 move-only 值，
  “已移出即空操作”由移动语义保证，组合即把一个义务嵌入另一个义务的析构。

## 核心契约（What）
- [`Packet`] 始终满足 `len() == Σ fragment.size`，其全部字节由唯一一条
  [`Deleter`] 链保活；共享视图通过显式的引用计数升级（[`Deleter::share`]）
  获得所有权，绝不做无主别名。
- [`CrossCpuReleaser`] 把释放动作改写为向归属分片投递任务（消费
  [`reef_core::CrossCoreExecutor`]），投递即返回，不阻塞触发方。
- [`VectorDataSink`] 是 [`reef_core::DataSink`] 的内存收集实现，按到达顺序
  保序存储，供测试与环回场景使用。

## 实现策略（How）
- 片段序列采用预留 [`Packet::DEFAULT_NR_FRAGS`] 容量的动态数组；包体经
  `Box` 间接持有，使指向内联暂存区的片段指针在包移动后依然有效。
- 释放动作收敛为封闭的标签变体（裸存储、bytes 缓冲、任意闭包、组合对、
  共享单元），仅对无界的自定义动作使用装箱闭包。

## 风险与考量（Trade-offs）
- 包内可变访问（头部预写、线性化）只写入本包独占的内存（内联暂存或新分配），
  共享后备存储永远只读，避免跨视图别名写入。
- 内联小片段数组的进一步特化（避免片段数组堆分配）留待压测数据支撑后引入。
"#]

extern crate alloc;

pub mod cross_core;
pub mod deleter;
pub mod fragment;
pub mod packet;
pub mod sink;

pub use cross_core::CrossCpuReleaser;
pub use deleter::{Deleter, make_deleter};
pub use fragment::Fragment;
pub use packet::Packet;
pub use sink::{ErasedPacketSink, PacketStore, VectorDataSink};
