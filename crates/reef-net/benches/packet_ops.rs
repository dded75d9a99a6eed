use criterion::{Criterion, black_box};
use reef_net::Packet;
use std::{env, time::Duration};

/// 包热路径基准：构造、头部预写与零拷贝共享。
///
/// # 设计背景（Why）
/// - 发送路径上每个包都会经历“包装负载 -> 预写协议头 -> 共享给下游”的
///   组合；该序列的常数开销直接决定数据面的每包成本。
fn bench_packet_pipeline(c: &mut Criterion) {
    let payload = vec![0xa5u8; 1024];
    c.bench_function("packet_prepend_share", |b| {
        b.iter(|| {
            let mut packet = Packet::from_slice(&payload);
            packet.prepend_header(14).fill(0);
            let view = packet.share_range(0, 64).unwrap();
            black_box(view.len())
        });
    });
}

/// 线性化基准：三片段折叠为一个连续片段。
fn bench_linearize(c: &mut Criterion) {
    let payload = vec![0x3cu8; 768];
    c.bench_function("packet_linearize", |b| {
        b.iter(|| {
            let mut packet = Packet::from_slices(&[
                &payload[..256],
                &payload[256..512],
                &payload[512..],
            ]);
            packet.linearize(0, 600).unwrap();
            black_box(packet.nr_frags())
        });
    });
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_packet_pipeline(&mut criterion);
    bench_linearize(&mut criterion);
    criterion.final_summary();
}
