//! `sink_contract` 集成测试：验证数据汇的保序交付与收尾语义。

use futures::executor::block_on;
use reef_core::DataSink;
use reef_net::{Packet, VectorDataSink};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 依次交付的包按到达顺序存储。
#[test]
fn put_preserves_arrival_order() {
    let (mut sink, store) = VectorDataSink::with_store();
    block_on(async {
        sink.put(Packet::from_slice(b"p1")).await.expect("交付 p1");
        sink.put(Packet::from_slice(b"p2")).await.expect("交付 p2");
        sink.put(Packet::from_slice(b"p3")).await.expect("交付 p3");
    });
    let stored = store.lock();
    let contents: Vec<Vec<u8>> = stored.iter().map(Packet::to_vec).collect();
    assert_eq!(contents, [b"p1".to_vec(), b"p2".to_vec(), b"p3".to_vec()]);
}

/// `close` 立即解析且不改变已存储的序列。
#[test]
fn close_resolves_without_altering_store() {
    let (mut sink, store) = VectorDataSink::with_store();
    block_on(async {
        sink.put(Packet::from_slice(b"only")).await.expect("交付");
        sink.close().await.expect("收尾");
    });
    let stored = store.lock();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].to_vec(), b"only");
}

/// 包进入数据汇后其义务随包转移；清空存储才触发释放。
#[test]
fn sink_holds_release_obligation_with_packet() {
    let counter = Arc::new(AtomicUsize::new(0));
    let probe = Arc::clone(&counter);
    let mut storage: Box<[u8]> = Box::from(&b"owned"[..]);
    let frag = reef_net::Fragment::from_raw_parts(storage.as_mut_ptr(), storage.len())
        .expect("非空存储");
    let deleter = reef_net::make_deleter(move || {
        probe.fetch_add(1, Ordering::SeqCst);
        drop(storage);
    });
    // SAFETY: storage 由义务闭包独占持有，触发前始终有效。
    let packet = unsafe { Packet::from_raw_parts(frag, deleter) };

    let (mut sink, store) = VectorDataSink::with_store();
    block_on(sink.put(packet)).expect("交付");
    assert_eq!(counter.load(Ordering::SeqCst), 0, "包仍在存储序列中");
    store.lock().clear();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 经对象安全别名注入的数据汇行为一致。
#[test]
fn erased_sink_is_usable_through_trait_object() {
    let (sink, store) = VectorDataSink::with_store();
    let mut erased: Box<reef_net::ErasedPacketSink> = Box::new(sink);
    block_on(async {
        erased.put(Packet::from_slice(b"dyn")).await.expect("交付");
        erased.close().await.expect("收尾");
    });
    assert_eq!(store.lock()[0].to_vec(), b"dyn");
}
