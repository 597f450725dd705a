//! 分批 - 把有序序列切成固定大小、保持顺序的批次

/// 按 `size` 切分 `items`
///
/// 除最后一批外每批恰好 `size` 个，最后一批 `1..=size` 个；
/// 按顺序拼接所有批次即得到原序列。
///
/// # Panics
/// `size == 0` 属于编程错误，直接 panic
pub fn partition<T>(items: &[T], size: usize) -> Vec<&[T]> {
    assert!(size > 0, "batch size must be positive");
    items.chunks(size).collect()
}

/// 批次总数
pub fn batch_count(len: usize, size: usize) -> usize {
    assert!(size > 0, "batch size must be positive");
    len.div_ceil(size)
}
