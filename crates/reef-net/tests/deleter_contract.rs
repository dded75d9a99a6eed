//! `deleter_contract` 集成测试：聚焦释放义务的一次性、组合与共享语义。
//!
//! # 测试总览（Why）
//! - 释放恰好一次是整个零拷贝子系统的安全底座；本套测试以计数探针主动
//!   制造二次释放的机会，验证结构上不可达。
//! - 覆盖组合的单位元性质与共享单元的“最后一个句柄触发”规则。

use reef_net::{Deleter, make_deleter};
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 构造一条触发时把计数器加一的义务。
fn counting_deleter(counter: &Arc<AtomicUsize>) -> Deleter {
    let counter = Arc::clone(counter);
    make_deleter(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// 析构触发释放动作，且恰好一次。
#[test]
fn drop_triggers_release_exactly_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let deleter = counting_deleter(&counter);
    assert!(deleter.is_armed());
    drop(deleter);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 显式触发后再次触发与析构均为空操作。
#[test]
fn repeated_release_is_noop() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut deleter = counting_deleter(&counter);
    deleter.release();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    deleter.release();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    drop(deleter);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 义务被移出后，原持有方析构不得再触发任何动作。
#[test]
fn moved_from_deleter_stays_silent() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut original = counting_deleter(&counter);
    let moved = mem::take(&mut original);
    assert!(!original.is_armed());
    drop(original);
    assert_eq!(counter.load(Ordering::SeqCst), 0, "移出后的义务不得触发");
    drop(moved);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 组合触发时两侧各恰好一次，与组合方向无关。
#[test]
fn chain_fires_both_sides_exactly_once() {
    for swap in [false, true] {
        let left = Arc::new(AtomicUsize::new(0));
        let right = Arc::new(AtomicUsize::new(0));
        let a = counting_deleter(&left);
        let b = counting_deleter(&right);
        let combined = if swap { b.chain(a) } else { a.chain(b) };
        drop(combined);
        assert_eq!(left.load(Ordering::SeqCst), 1);
        assert_eq!(right.load(Ordering::SeqCst), 1);
    }
}

/// 空义务是组合的单位元：不引入包装层也不改变触发次数。
#[test]
fn chain_with_empty_is_identity() {
    let counter = Arc::new(AtomicUsize::new(0));
    let combined = counting_deleter(&counter).chain(Deleter::empty());
    drop(combined);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let counter = Arc::new(AtomicUsize::new(0));
    let combined = Deleter::empty().chain(counting_deleter(&counter));
    drop(combined);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let mut both_empty = Deleter::empty().chain(Deleter::empty());
    assert!(!both_empty.is_armed());
    both_empty.release();
}

/// 共享后，义务推迟到最后一个句柄析构时触发。
#[test]
fn share_defers_release_until_last_handle() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut original = counting_deleter(&counter);
    let view = original.share();
    drop(original);
    assert_eq!(counter.load(Ordering::SeqCst), 0, "仍有句柄存活时不得释放");
    drop(view);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 对已共享的义务再次共享复用同一单元，不会拆出第二次释放。
#[test]
fn share_of_shared_reuses_cell() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut original = counting_deleter(&counter);
    let first = original.share();
    let mut second = original.share();
    let third = second.share();
    drop(first);
    drop(second);
    drop(original);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    drop(third);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// 共享空义务得到空义务。
#[test]
fn share_of_empty_is_empty() {
    let mut empty = Deleter::empty();
    let view = empty.share();
    assert!(!view.is_armed());
    assert!(!empty.is_armed());
}
