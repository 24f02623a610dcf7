//! 打乱与划分.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// 以 `seed` 新建一个随机数发生器并打乱 `items`.
///
/// 每次调用都使用新的发生器, 因此同一种子对同样长度的输入总是给出同样的排列.
pub fn shuffle<T>(mut items: Vec<T>, seed: u64) -> Vec<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    items
}

/// 训练集大小: `floor(len * fraction)`.
#[inline]
pub fn train_len(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).floor() as usize).min(len)
}

/// 按 [`train_len`] 把 `items` 切为 (训练集, 验证集).
pub fn split_at_fraction<T>(mut items: Vec<T>, fraction: f64) -> (Vec<T>, Vec<T>) {
    let rest = items.split_off(train_len(items.len(), fraction));
    (items, rest)
}
