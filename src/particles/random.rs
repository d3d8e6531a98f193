//! 随机数表
//!
//! `random(i)` 不是运行时随机数生成，而是按索引查询一张预先生成的随机数纹理：
//! 同一个粒子每一帧得到相同的抖动值。这里生成纹理的数据，由宿主上传为单通道浮点纹理。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 预生成的随机数表，按 `width` 折行
#[derive(Debug, Clone, PartialEq)]
pub struct RandomTable {
    values: Vec<f32>,
    width: u32,
    height: u32,
}

impl RandomTable {
    /// 生成至少容纳 `count` 个值的随机数表
    ///
    /// 最后一行用额外的随机值补满，纹理始终是完整的矩形。相同的 `seed` 总是生成相同的表。
    pub fn generate(seed: u64, count: usize, width: u32) -> Self {
        let width = width.max(1);
        let height = (count.max(1) as u64).div_ceil(width as u64) as u32;
        let mut rng = StdRng::seed_from_u64(seed);
        let values = (0..width as usize * height as usize)
            .map(|_| rng.gen::<f32>())
            .collect();

        tracing::debug!(target: "particles", width, height, seed, "Generated random number table");
        Self {
            values,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// 与着色器中 `random(index)` 相同的寻址方式：`(index mod W, index / W)`
    pub fn lookup(&self, index: usize) -> Option<f32> {
        let width = self.width as usize;
        let (column, row) = (index % width, index / width);
        self.values.get(row * width + column).copied()
    }

    /// 上传用的纹素字节（R32F）
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }
}
