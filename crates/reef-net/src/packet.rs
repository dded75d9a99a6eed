use crate::cross_core::CrossCpuReleaser;
use crate::deleter::Deleter;
use crate::fragment::Fragment;
use alloc::{boxed::Box, vec, vec::Vec};
use bytes::BytesMut;
use core::{cmp, fmt, mem, ptr::NonNull, slice};
use reef_core::{CoreError, codes};

const INTERNAL_DATA_SIZE: usize = 128;
const DEFAULT_NR_FRAGS: usize = 4;

/// 包体：片段序列、总长、释放义务与内联暂存区。
///
/// 经 `Box` 间接持有——片段可以指向内联暂存区，包在栈上移动时暂存区地址
/// 必须保持稳定。
struct PacketInner {
    /// 全部片段字节数之和；与片段序列同步维护。
    len: usize,
    /// 内联暂存区中、首片段起点之前的空闲字节数。
    headroom: usize,
    /// 首片段是否指向内联暂存区；为真时 `frags[0].base == data + headroom`。
    using_internal: bool,
    frags: Vec<Fragment>,
    /// 覆盖所有片段后备存储的唯一释放义务（内联暂存区除外，它随包体消亡）。
    deleter: Deleter,
    /// 头部预写的内联暂存区，自尾向头消费。
    data: [u8; INTERNAL_DATA_SIZE],
}

/// `Packet` 是数据面的散聚缓冲：有序片段序列加一条释放义务。
///
/// # 设计背景（Why）
/// - 网络路径上的缓冲会被反复切片、拼装、注入头部，并跨异步边界乃至跨核
///   移交。复制字节是不可接受的开销，因此包只携带视图（[`Fragment`]），
///   由唯一的 [`Deleter`] 链为全部字节保活。
/// - 这是一条 C 级性能与内存安全兼得的窄路：共享必须伴随所有权共享
///   （[`Deleter::share`]），可变写入只落在本包独占的内存上。
///
/// # 逻辑解析（How）
/// - 片段序列是预留 [`Packet::DEFAULT_NR_FRAGS`] 容量的动态数组；
/// - 小头部优先写入内联暂存区（[`Packet::INTERNAL_DATA_SIZE`] 字节，自尾
///   向头分配），避免为每个协议头单开分配；
/// - 共享或线性化之前，指向暂存区的片段会先被复制出去
///   （`unuse_internal_data`）——共享视图的生命周期可以超过本包，而暂存区
///   不能。
///
/// # 契约说明（What）
/// - **不变量**：`len() == Σ fragment.size`；不存在零长度片段；包可无虞
///   移动，移动转移全部片段与义务，来源包成为空包。
/// - **失败语义**：越界请求返回 [`codes::BUFFER_BOUNDS`] 错误且不产生任何
///   可观察的结构变化；分配失败遵循全局分配器的 abort 约定。
///
/// # 风险提示（Trade-offs）
/// - `Send` 由手工实现：裸指针片段抑制了自动推导，而所有指针都指向义务链
///   或包体自身拥有的内存，随包整体移交是安全的。包不是 `Sync`。
pub struct Packet {
    inner: Box<PacketInner>,
}

// SAFETY: 片段指针仅指向 deleter 链持有的分配或包体自身的内联暂存区，
// 二者都随 Packet 一起移交所有权；不存在跨线程共享的内部可变状态。
unsafe impl Send for Packet {}

impl Packet {
    /// 片段序列的预留容量；超过后退化为普通的堆上增长。
    pub const DEFAULT_NR_FRAGS: usize = DEFAULT_NR_FRAGS;
    /// 内联暂存区大小：小头部预写不触发堆分配的上限。
    pub const INTERNAL_DATA_SIZE: usize = INTERNAL_DATA_SIZE;

    /// 构造空包。
    pub fn new() -> Self {
        Packet {
            inner: Box::new(PacketInner {
                len: 0,
                headroom: INTERNAL_DATA_SIZE,
                using_internal: false,
                frags: Vec::with_capacity(DEFAULT_NR_FRAGS),
                deleter: Deleter::empty(),
                data: [0; INTERNAL_DATA_SIZE],
            }),
        }
    }

    fn assemble(frag: Fragment, deleter: Deleter) -> Self {
        let mut packet = Packet::new();
        if frag.size() == 0 {
            // 空片段不入列，但义务仍随包存续。
            packet.inner.deleter = deleter;
            return packet;
        }
        packet.inner.len = frag.size();
        packet.inner.frags.push(frag);
        packet.inner.deleter = deleter;
        packet
    }

    /// 复制调用方字节构造单片段包；用于来源字节转瞬即逝的场合。
    pub fn from_slice(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Packet::new();
        }
        let mut storage: Box<[u8]> = Box::from(bytes);
        let base = NonNull::from(&mut storage[0]);
        let frag = Fragment::new(base, storage.len());
        Packet::assemble(frag, Deleter::from_storage(storage))
    }

    /// 逐段复制构造多片段包，每段一个独立分配与片段。
    pub fn from_slices(parts: &[&[u8]]) -> Self {
        let mut packet = Packet::new();
        for part in parts {
            packet.append(Packet::from_slice(part));
        }
        packet
    }

    /// 零拷贝接管一块独立堆分配。
    pub fn from_storage(mut storage: Box<[u8]>) -> Self {
        if storage.is_empty() {
            return Packet::new();
        }
        let base = NonNull::from(&mut storage[0]);
        let frag = Fragment::new(base, storage.len());
        Packet::assemble(frag, Deleter::from_storage(storage))
    }

    /// 零拷贝接管一块 `bytes` 可写缓冲。
    pub fn from_buffer(mut buffer: BytesMut) -> Self {
        if buffer.is_empty() {
            return Packet::new();
        }
        let base = NonNull::from(&mut buffer[0]);
        let frag = Fragment::new(base, buffer.len());
        Packet::assemble(frag, Deleter::from_buffer(buffer))
    }

    /// 零拷贝包装调用方自管的内存，由调用方提供释放义务。
    ///
    /// # Safety
    /// 调用方必须保证 `frag` 覆盖的区间在 `deleter` 触发前始终有效，且该
    /// 区间在包的存活期内没有其它路径进行可变访问。
    pub unsafe fn from_raw_parts(frag: Fragment, deleter: Deleter) -> Self {
        Packet::assemble(frag, deleter)
    }

    /// 包内字节总数。
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// 是否为空包。
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// 当前片段数。
    pub fn nr_frags(&self) -> usize {
        self.inner.frags.len()
    }

    /// 按序遍历各片段的只读视图。
    pub fn fragments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        // SAFETY: 片段由本包的义务链或内联暂存区保活，只读借用经 &self 约束。
        self.inner.frags.iter().map(|frag| unsafe { frag.as_slice() })
    }

    /// 第 `index` 个片段的只读视图。
    pub fn fragment(&self, index: usize) -> Option<&[u8]> {
        // SAFETY: 同 `fragments`。
        self.inner.frags.get(index).map(|frag| unsafe { frag.as_slice() })
    }

    /// 把全部字节按序复制为 `Vec`。
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.inner.len);
        for frag in self.fragments() {
            out.extend_from_slice(frag);
        }
        out
    }

    /// 首片段若指向内联暂存区，将其复制到独立分配并纳入义务链。
    ///
    /// 共享视图与线性化产物的生命周期可能超过本包，而暂存区随包体消亡，
    /// 因此这两类操作之前必须先行脱离暂存区。
    fn unuse_internal_data(&mut self) {
        if !self.inner.using_internal {
            return;
        }
        let frag = self.inner.frags[0];
        // SAFETY: using_internal 为真时首片段指向本包暂存区，必然存活。
        let mut copied: Box<[u8]> = Box::from(unsafe { frag.as_slice() });
        let base = NonNull::from(&mut copied[0]);
        self.inner.frags[0] = Fragment::new(base, copied.len());
        let old = self.inner.deleter.take();
        self.inner.deleter = old.chain(Deleter::from_storage(copied));
        self.inner.using_internal = false;
        self.inner.headroom = INTERNAL_DATA_SIZE;
    }

    /// 共享整个包：零拷贝视图，释放义务升级为引用计数共享。
    pub fn share(&mut self) -> Packet {
        let len = self.inner.len;
        self.share_unchecked(0, len)
    }

    /// 共享 `[offset, offset + len)` 的零拷贝子视图。
    ///
    /// 首尾片段按需截断；新包与本包通过共享单元共同持有释放义务，最后
    /// 一个视图消亡时后备存储恰好释放一次。
    pub fn share_range(&mut self, offset: usize, len: usize) -> Result<Packet, CoreError> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| CoreError::new(codes::BUFFER_BOUNDS, "share_range 偏移溢出"))?;
        if end > self.inner.len {
            return Err(CoreError::new(
                codes::BUFFER_BOUNDS,
                "share_range 超出包内字节范围",
            ));
        }
        Ok(self.share_unchecked(offset, len))
    }

    fn share_unchecked(&mut self, offset: usize, len: usize) -> Packet {
        self.unuse_internal_data();
        let mut shared = Packet::new();
        let mut skip = offset;
        let mut need = len;
        for frag in &self.inner.frags {
            if need == 0 {
                break;
            }
            if skip >= frag.size() {
                skip -= frag.size();
                continue;
            }
            let take = cmp::min(frag.size() - skip, need);
            // SAFETY: skip + take 不越过片段末尾，偏移后的基址仍落在原分配内。
            let base = unsafe { NonNull::new_unchecked(frag.base().as_ptr().add(skip)) };
            shared.inner.frags.push(Fragment::new(base, take));
            skip = 0;
            need -= take;
        }
        shared.inner.len = len;
        shared.inner.deleter = if len == 0 {
            Deleter::empty()
        } else {
            self.inner.deleter.share()
        };
        shared
    }

    /// 在包头预留 `size` 字节并返回可写窗口；窗口内容未写入前不作保证。
    ///
    /// 暂存区尚有余量时就地完成，不触发分配；否则新开一段小分配拼接到
    /// 片段序列最前，并把它纳入义务链。
    pub fn prepend_header(&mut self, size: usize) -> &mut [u8] {
        if size == 0 {
            return &mut [];
        }
        let inner = &mut *self.inner;
        if inner.headroom >= size {
            let new_headroom = inner.headroom - size;
            let base = NonNull::from(&mut inner.data[new_headroom]);
            if inner.using_internal {
                let grown = inner.frags[0].size() + size;
                inner.frags[0] = Fragment::new(base, grown);
            } else {
                inner.frags.insert(0, Fragment::new(base, size));
                inner.using_internal = true;
            }
            inner.headroom = new_headroom;
            inner.len += size;
            return &mut inner.data[new_headroom..new_headroom + size];
        }
        let mut storage = vec![0u8; size].into_boxed_slice();
        let base = NonNull::from(&mut storage[0]);
        inner.frags.insert(0, Fragment::new(base, size));
        inner.len += size;
        let old = inner.deleter.take();
        inner.deleter = old.chain(Deleter::from_storage(storage));
        // SAFETY: storage 已移交本包义务链独占持有，可变借用经 &mut self 传递。
        unsafe { slice::from_raw_parts_mut(base.as_ptr(), size) }
    }

    /// 在包尾追加 `size` 字节并返回可写窗口。
    ///
    /// 暂存区自尾向头仅服务头部预写，尾部追加总是新开分配。
    pub fn append_trailer(&mut self, size: usize) -> &mut [u8] {
        if size == 0 {
            return &mut [];
        }
        let inner = &mut *self.inner;
        let mut storage = vec![0u8; size].into_boxed_slice();
        let base = NonNull::from(&mut storage[0]);
        inner.frags.push(Fragment::new(base, size));
        inner.len += size;
        let old = inner.deleter.take();
        inner.deleter = old.chain(Deleter::from_storage(storage));
        // SAFETY: 同 `prepend_header` 的分配路径。
        unsafe { slice::from_raw_parts_mut(base.as_ptr(), size) }
    }

    /// 丢弃包头 `n` 字节；只调整片段描述，不触碰后备存储。
    pub fn trim_front(&mut self, mut n: usize) -> Result<(), CoreError> {
        if n > self.inner.len {
            return Err(CoreError::new(
                codes::BUFFER_BOUNDS,
                "trim_front 超出包内字节范围",
            ));
        }
        self.inner.len -= n;
        while n > 0 {
            let inner = &mut *self.inner;
            let first = inner.frags[0];
            if n < first.size() {
                // SAFETY: n 小于片段长度，前移后基址仍在原分配内。
                unsafe { inner.frags[0].advance(n) };
                if inner.using_internal {
                    inner.headroom += n;
                }
                break;
            }
            n -= first.size();
            inner.frags.remove(0);
            if inner.using_internal {
                inner.using_internal = false;
                inner.headroom = INTERNAL_DATA_SIZE;
            }
        }
        Ok(())
    }

    /// 丢弃包尾 `n` 字节；只调整片段描述，不触碰后备存储。
    pub fn trim_back(&mut self, mut n: usize) -> Result<(), CoreError> {
        if n > self.inner.len {
            return Err(CoreError::new(
                codes::BUFFER_BOUNDS,
                "trim_back 超出包内字节范围",
            ));
        }
        self.inner.len -= n;
        while n > 0 {
            let inner = &mut *self.inner;
            let last_index = inner.frags.len() - 1;
            let last = inner.frags[last_index];
            if n < last.size() {
                inner.frags[last_index].truncate(last.size() - n);
                break;
            }
            n -= last.size();
            inner.frags.pop();
            if inner.frags.is_empty() && inner.using_internal {
                inner.using_internal = false;
                inner.headroom = INTERNAL_DATA_SIZE;
            }
        }
        Ok(())
    }

    /// 把 `other` 的全部片段拼接到包尾，双方义务合并为一条。
    pub fn append(&mut self, mut other: Packet) {
        other.unuse_internal_data();
        let inner = &mut *self.inner;
        inner.len += other.inner.len;
        inner.frags.append(&mut other.inner.frags);
        let theirs = other.inner.deleter.take();
        let ours = inner.deleter.take();
        inner.deleter = ours.chain(theirs);
    }

    /// 自片段 `at_frag` 起折叠若干片段，得到一个覆盖至少 `desired_size`
    /// 字节的连续片段。
    ///
    /// # 逻辑解析（How）
    /// - 自 `at_frag` 起累加整片长度，直到首次达到或越过 `desired_size`；
    ///   被消费的片段即被折叠的范围。
    /// - 按序把各源片段复制进一块新分配，再以单一片段原位替换。
    /// - 若折叠覆盖了整个包（`at_frag == 0` 且 `desired_size == len()`），
    ///   旧义务链已无人引用，立即释放；否则与新分配的义务组合保留。
    ///
    /// # 契约说明（What）
    /// - 片段序列在达到 `desired_size` 前耗尽视为越界，返回
    ///   [`codes::BUFFER_BOUNDS`] 且包保持原状。
    /// - 成功后字节内容与折叠前逐位一致，零拷贝仅在此处让位于连续性。
    pub fn linearize(&mut self, at_frag: usize, desired_size: usize) -> Result<(), CoreError> {
        if desired_size == 0 {
            return Ok(());
        }
        let mut nr_frags = 0;
        let mut accum_size = 0;
        while accum_size < desired_size {
            let Some(frag) = self.inner.frags.get(at_frag + nr_frags) else {
                return Err(CoreError::new(
                    codes::BUFFER_BOUNDS,
                    "linearize 请求超过现有片段覆盖的字节数",
                ));
            };
            accum_size += frag.size();
            nr_frags += 1;
        }
        self.unuse_internal_data();
        let mut merged = vec![0u8; accum_size].into_boxed_slice();
        let mut written = 0;
        for index in 0..nr_frags {
            let frag = self.inner.frags[at_frag + index];
            // SAFETY: 源片段由本包义务链保活；目标区间互不重叠。
            let src = unsafe { frag.as_slice() };
            merged[written..written + src.len()].copy_from_slice(src);
            written += src.len();
        }
        let base = NonNull::from(&mut merged[0]);
        self.inner.frags.drain(at_frag + 1..at_frag + nr_frags);
        self.inner.frags[at_frag] = Fragment::new(base, accum_size);
        let replacement = Deleter::from_storage(merged);
        if at_frag == 0 && desired_size == self.inner.len {
            // 旧后备存储的每个字节都已复制完毕且无其它引用，立即归还。
            let old = mem::replace(&mut self.inner.deleter, replacement);
            drop(old);
        } else {
            let old = self.inner.deleter.take();
            self.inner.deleter = old.chain(replacement);
        }
        debug_assert_eq!(
            self.inner.len,
            self.inner.frags.iter().map(Fragment::size).sum::<usize>()
        );
        Ok(())
    }

    /// 取 `[offset, offset + size)` 的连续只读窗口，跨片段时按需线性化。
    pub fn get_header(&mut self, offset: usize, size: usize) -> Result<&[u8], CoreError> {
        if size == 0 {
            return Ok(&[]);
        }
        let end = offset
            .checked_add(size)
            .ok_or_else(|| CoreError::new(codes::BUFFER_BOUNDS, "get_header 偏移溢出"))?;
        if end > self.inner.len {
            return Err(CoreError::new(
                codes::BUFFER_BOUNDS,
                "get_header 超出包内字节范围",
            ));
        }
        let Some((index, in_frag)) = self.frag_at(offset) else {
            return Err(CoreError::new(
                codes::BUFFER_BOUNDS,
                "get_header 超出包内字节范围",
            ));
        };
        if in_frag + size > self.inner.frags[index].size() {
            self.linearize(index, in_frag + size)?;
        }
        let frag = self.inner.frags[index];
        // SAFETY: 此时片段覆盖整个请求窗口，只读借用经 &self 约束。
        Ok(unsafe { slice::from_raw_parts(frag.base().as_ptr().add(in_frag), size) })
    }

    /// 定位 `offset` 所在的片段下标与片段内偏移。
    fn frag_at(&self, offset: usize) -> Option<(usize, usize)> {
        let mut remaining = offset;
        for (index, frag) in self.inner.frags.iter().enumerate() {
            if remaining < frag.size() {
                return Some((index, remaining));
            }
            remaining -= frag.size();
        }
        None
    }

    /// 改写释放义务：包最终析构时，释放被搬运到归属分片执行。
    ///
    /// 返回的包与原包是同一零拷贝视图；其字节与片段结构完全不变。
    pub fn free_on_cpu(mut self, releaser: &CrossCpuReleaser) -> Packet {
        let old = self.inner.deleter.take();
        self.inner.deleter = releaser.rebind(old);
        self
    }

    /// 同 [`free_on_cpu`](Packet::free_on_cpu)，并在搬运后的释放完成之后
    /// 调用 `on_done`。
    pub fn free_on_cpu_notify(
        mut self,
        releaser: &CrossCpuReleaser,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Packet {
        let old = self.inner.deleter.take();
        self.inner.deleter = releaser.rebind_with_completion(old, on_done);
        self
    }
}

impl Default for Packet {
    fn default() -> Self {
        Packet::new()
    }
}

impl fmt::Debug for Packet {
    /// 按片段渲染：可见文本以带转义的引号串呈现，其余以十六进制字节组呈现。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "packet{{")?;
        let mut first = true;
        for frag in self.fragments() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            if frag.iter().all(|&byte| (9..=0x7f).contains(&byte)) {
                write!(f, "\"")?;
                for &byte in frag {
                    match byte {
                        b'\r' => write!(f, "\\r")?,
                        b'\n' => write!(f, "\\n")?,
                        b'\t' => write!(f, "\\t")?,
                        byte if byte.is_ascii_graphic() || byte == b' ' => {
                            write!(f, "{}", byte as char)?;
                        }
                        byte => write!(f, "\\x{byte:02x}")?,
                    }
                }
                write!(f, "\"")?;
            } else {
                write!(f, "{{")?;
                let mut first_byte = true;
                for &byte in frag {
                    if !first_byte {
                        write!(f, " ")?;
                    }
                    first_byte = false;
                    write!(f, "{byte:02x}")?;
                }
                write!(f, "}}")?;
            }
        }
        write!(f, "}}")
    }
}
