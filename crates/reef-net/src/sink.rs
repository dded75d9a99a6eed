use crate::packet::Packet;
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use async_trait::async_trait;
use reef_core::{CoreError, DataSink};
use spin::Mutex;

/// 以包为条目的对象安全数据汇别名。
///
/// 传输层通过 `Box<ErasedPacketSink>` 注入具体实现，无需了解其类型。
pub type ErasedPacketSink = dyn DataSink<Item = Packet>;

/// `VectorDataSink` 与创建方共享的存储序列。
pub type PacketStore = Arc<Mutex<Vec<Packet>>>;

/// `VectorDataSink` 把收到的包按到达顺序追加到共享序列中。
///
/// # 设计背景（Why）
/// - 测试与环回场景需要一个不经过任何设备、立即解析的数据汇参考实现，
///   用于校验上游流水线交付的包序与内容。
///
/// # 契约说明（What）
/// - `put` 保序追加并立即解析；包的所有权（连同其释放义务）转移给存储
///   序列，由创建方决定何时消费或丢弃。
/// - `close` 是立即解析的空操作，不改变已存储的序列。
pub struct VectorDataSink {
    store: PacketStore,
}

impl VectorDataSink {
    /// 绑定到调用方持有的存储序列。
    pub fn new(store: PacketStore) -> Self {
        VectorDataSink { store }
    }

    /// 创建数据汇并返回与之共享的存储序列。
    pub fn with_store() -> (Self, PacketStore) {
        let store: PacketStore = Arc::new(Mutex::new(Vec::new()));
        (VectorDataSink::new(Arc::clone(&store)), store)
    }
}

#[async_trait]
impl DataSink for VectorDataSink {
    type Item = Packet;

    async fn put(&mut self, packet: Packet) -> Result<(), CoreError> {
        self.store.lock().push(packet);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), CoreError> {
        Ok(())
    }
}
