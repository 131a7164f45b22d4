use std::fmt;

use crate::core::{
    loader::{FileLoc, InputParams},
    rng::{hash_pixel, Rng},
};

use super::{load_samples_per_pixel, SamplerT, StreamCursor};

/// Uniform random values, reproducible per pixel sample.
#[derive(Clone, Debug)]
pub struct IndependentSampler {
    spp: u32,
    seed: u64,
    rng: Rng,
    cursor: StreamCursor,
}

impl IndependentSampler {
    pub fn new(spp: u32, seed: u64) -> Self {
        Self {
            spp,
            seed,
            rng: Rng::new(seed),
            cursor: StreamCursor::default(),
        }
    }

    pub fn load(params: &mut InputParams, seed: u64, loc: &FileLoc) -> anyhow::Result<Self> {
        let spp = load_samples_per_pixel(params, loc)?;
        Ok(Self::new(spp, seed))
    }
}

impl SamplerT for IndependentSampler {
    fn samples_per_pixel(&self) -> u32 {
        self.spp
    }

    fn start_pixel_sample_from(&mut self, p: glam::IVec2, sample_index: u32, dimension: u32) {
        self.cursor.start(p, sample_index, dimension);
        self.rng = Rng::new(hash_pixel(p, self.seed, sample_index as u64));
        self.rng.advance(dimension);
    }

    fn get_1d(&mut self) -> f32 {
        self.cursor.take(1);
        self.rng.uniform_1d()
    }

    fn get_2d(&mut self) -> glam::Vec2 {
        self.cursor.take(2);
        self.rng.uniform_2d()
    }

    fn get_pixel_2d(&mut self) -> glam::Vec2 {
        self.get_2d()
    }
}

impl fmt::Display for IndependentSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ IndependentSampler samples_per_pixel: {} seed: {} ]",
            self.spp, self.seed
        )
    }
}
