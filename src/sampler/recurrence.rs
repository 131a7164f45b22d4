use std::fmt;

use crate::core::{
    loader::{FileLoc, InputParams},
    rng::mix_bits,
    sampling::ONE_MINUS_EPSILON,
};

use super::{load_samples_per_pixel, SamplerT, StreamCursor};

// http://extremelearning.com.au/unreasonable-effectiveness-of-quasirandom-sequences/
/// Additive recurrence sequences, R1 for 1d values and R2 for 2d values. Every pixel and
/// dimension gets its own random toroidal shift of the sequence.
#[derive(Clone, Debug)]
pub struct RecurrenceSampler {
    spp: u32,
    seed: u64,
    full_resolution: glam::IVec2,
    cursor: StreamCursor,
}

impl RecurrenceSampler {
    const INV_PHI1: f64 = 0.618033988749895;
    const INV_PHI2: f64 = 0.754877666246571;
    /// Shift key of the film position, kept apart from the numbered dimensions.
    const PIXEL_DIMENSION: u64 = u32::MAX as u64 + 1;

    pub fn new(spp: u32, seed: u64, full_resolution: glam::IVec2) -> Self {
        Self {
            spp,
            seed,
            full_resolution,
            cursor: StreamCursor::default(),
        }
    }

    pub fn load(
        params: &mut InputParams,
        seed: u64,
        full_resolution: glam::IVec2,
        loc: &FileLoc,
    ) -> anyhow::Result<Self> {
        let spp = load_samples_per_pixel(params, loc)?;
        Ok(Self::new(spp, seed, full_resolution))
    }

    fn shift(&self, dimension: u64) -> u64 {
        let pixel = self.cursor.pixel;
        let pixel_index = pixel.y as i64 * self.full_resolution.x as i64 + pixel.x as i64;
        mix_bits(pixel_index as u64 ^ mix_bits(dimension.wrapping_mul(0x9e37_79b9) ^ self.seed))
    }

    fn to_unit(hash: u64) -> f64 {
        (hash >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn value_2d(&self, dimension: u64) -> glam::Vec2 {
        let hash = self.shift(dimension);
        let index = self.cursor.sample_index as f64;
        let x = (Self::to_unit(hash) + index * Self::INV_PHI2).fract();
        let y = (Self::to_unit(mix_bits(hash)) + index * Self::INV_PHI2 * Self::INV_PHI2).fract();
        glam::Vec2::new(
            (x as f32).min(ONE_MINUS_EPSILON),
            (y as f32).min(ONE_MINUS_EPSILON),
        )
    }
}

impl SamplerT for RecurrenceSampler {
    fn samples_per_pixel(&self) -> u32 {
        self.spp
    }

    fn start_pixel_sample_from(&mut self, p: glam::IVec2, sample_index: u32, dimension: u32) {
        self.cursor.start(p, sample_index, dimension);
    }

    fn get_1d(&mut self) -> f32 {
        let dimension = self.cursor.take(1);
        let hash = self.shift(dimension as u64);
        let index = self.cursor.sample_index as f64;
        let value = (Self::to_unit(hash) + index * Self::INV_PHI1).fract();
        (value as f32).min(ONE_MINUS_EPSILON)
    }

    fn get_2d(&mut self) -> glam::Vec2 {
        let dimension = self.cursor.take(2);
        self.value_2d(dimension as u64)
    }

    fn get_pixel_2d(&mut self) -> glam::Vec2 {
        self.cursor.take(0);
        self.value_2d(Self::PIXEL_DIMENSION)
    }
}

impl fmt::Display for RecurrenceSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ RecurrenceSampler samples_per_pixel: {} seed: {} full_resolution: {} ]",
            self.spp, self.seed, self.full_resolution
        )
    }
}
