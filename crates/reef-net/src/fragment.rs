use core::{fmt, ptr::NonNull, slice};

/// `Fragment` 是指向一段连续内存的非占有视图（基址 + 长度）。
///
/// # 设计背景（Why）
/// - 散聚缓冲需要把一个逻辑字节流映射到多段物理内存；片段本身不携带任何
///   生命周期，所有权完全集中在所属 [`Packet`](crate::Packet) 的
///   [`Deleter`](crate::Deleter) 上，这样切片与拼接才能做到零拷贝。
///
/// # 契约说明（What）
/// - **有效性不变量**：`[base, base + size)` 在所属包的 Deleter 存活期间
///   始终可读。构造是安全的，解引用（[`Fragment::as_slice`]）要求调用方
///   证明该不变量成立。
/// - 子系统内不存在零长度片段：空区间直接从片段序列中剔除。
#[derive(Clone, Copy)]
pub struct Fragment {
    base: NonNull<u8>,
    size: usize,
}

impl Fragment {
    /// 以基址与长度构造片段。
    ///
    /// 构造本身不解引用指针；使用该片段读取数据前，调用方必须保证
    /// `[base, base + size)` 指向存活的分配。
    pub const fn new(base: NonNull<u8>, size: usize) -> Self {
        Fragment { base, size }
    }

    /// 从裸指针构造片段；空指针返回 `None`。
    pub fn from_raw_parts(base: *mut u8, size: usize) -> Option<Self> {
        NonNull::new(base).map(|base| Fragment { base, size })
    }

    /// 片段基址。
    pub const fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// 片段覆盖的字节数。
    pub const fn size(&self) -> usize {
        self.size
    }

    /// 以只读切片形式访问片段。
    ///
    /// # Safety
    /// 调用方必须保证 `[base, base + size)` 指向的分配仍然存活，且在返回
    /// 切片的生命周期内没有其它路径对同一区间进行可变访问。
    pub(crate) unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        unsafe { slice::from_raw_parts(self.base.as_ptr(), self.size) }
    }

    /// 丢弃片段前 `n` 字节（基址前移）。
    ///
    /// # Safety
    /// `n` 不得超过 `size`，且偏移后的基址必须仍落在原分配内。
    pub(crate) unsafe fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.size);
        // SAFETY: 调用方保证偏移不越过片段末尾。
        self.base = unsafe { NonNull::new_unchecked(self.base.as_ptr().add(n)) };
        self.size -= n;
    }

    /// 仅保留片段前 `keep` 字节。
    pub(crate) fn truncate(&mut self, keep: usize) {
        debug_assert!(keep <= self.size);
        self.size = keep;
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("base", &self.base.as_ptr())
            .field("size", &self.size)
            .finish()
    }
}
