use std::fmt;

use crate::core::{
    loader::{FileLoc, InputParams},
    rng::{hash_pixel, permutation_element, Rng},
    sampling::ONE_MINUS_EPSILON,
};

use super::{SamplerT, StreamCursor};

/// Splits every dimension into `x_samples * y_samples` strata and gives each pixel sample its
/// own stratum. Strata are shuffled per pixel and per dimension.
#[derive(Clone, Debug)]
pub struct StratifiedSampler {
    x_samples: u32,
    y_samples: u32,
    jitter: bool,
    seed: u64,
    rng: Rng,
    cursor: StreamCursor,
}

impl StratifiedSampler {
    pub fn new(x_samples: u32, y_samples: u32, jitter: bool, seed: u64) -> Self {
        Self {
            x_samples,
            y_samples,
            jitter,
            seed,
            rng: Rng::new(seed),
            cursor: StreamCursor::default(),
        }
    }

    pub fn load(params: &mut InputParams, seed: u64, loc: &FileLoc) -> anyhow::Result<Self> {
        let x_samples = params.get_int_or("xsamples", 4)?;
        let y_samples = params.get_int_or("ysamples", 4)?;
        if x_samples <= 0 || y_samples <= 0 {
            anyhow::bail!(format!(
                "{} at {}: 'xsamples' and 'ysamples' should be positive",
                params.name(),
                loc
            ));
        }
        let jitter = params.get_bool_or("jitter", true)?;
        Ok(Self::new(x_samples as u32, y_samples as u32, jitter, seed))
    }

    /// Stratum of the current pixel sample in `dimension`.
    fn stratum(&self, dimension: u32) -> u32 {
        debug_assert!(self.cursor.sample_index < self.samples_per_pixel());
        let hash = hash_pixel(self.cursor.pixel, dimension as u64, self.seed);
        permutation_element(
            self.cursor.sample_index,
            self.samples_per_pixel(),
            hash as u32,
        )
    }

    fn offset(&mut self) -> f32 {
        if self.jitter {
            self.rng.uniform_1d()
        } else {
            0.5
        }
    }
}

impl SamplerT for StratifiedSampler {
    fn samples_per_pixel(&self) -> u32 {
        self.x_samples * self.y_samples
    }

    fn start_pixel_sample_from(&mut self, p: glam::IVec2, sample_index: u32, dimension: u32) {
        self.cursor.start(p, sample_index, dimension);
        self.rng = Rng::new(hash_pixel(p, self.seed, sample_index as u64));
        // jittering takes exactly one draw per dimension
        if self.jitter {
            self.rng.advance(dimension);
        }
    }

    fn get_1d(&mut self) -> f32 {
        let dimension = self.cursor.take(1);
        let stratum = self.stratum(dimension);
        let delta = self.offset();
        ((stratum as f32 + delta) / self.samples_per_pixel() as f32).min(ONE_MINUS_EPSILON)
    }

    fn get_2d(&mut self) -> glam::Vec2 {
        let dimension = self.cursor.take(2);
        let stratum = self.stratum(dimension);
        let x = stratum % self.x_samples;
        let y = stratum / self.x_samples;
        let dx = self.offset();
        let dy = self.offset();
        glam::Vec2::new(
            ((x as f32 + dx) / self.x_samples as f32).min(ONE_MINUS_EPSILON),
            ((y as f32 + dy) / self.y_samples as f32).min(ONE_MINUS_EPSILON),
        )
    }

    fn get_pixel_2d(&mut self) -> glam::Vec2 {
        self.get_2d()
    }
}

impl fmt::Display for StratifiedSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ StratifiedSampler x_samples: {} y_samples: {} jitter: {} seed: {} ]",
            self.x_samples, self.y_samples, self.jitter, self.seed
        )
    }
}
