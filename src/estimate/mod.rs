//! Monte Carlo estimates of shape measures, spread over worker threads.
//!
//! The estimates walk a virtual image: every pixel of `resolution` draws `samples_per_pixel`
//! samples from its own sampler stream, so the result only depends on the sampler, not on the
//! number of workers.

mod util;

pub use util::*;

use crate::{
    sampler::{Sampler, SamplerT},
    shape::{ShapeHandle, ShapeSampleContext},
};

#[derive(Clone, Copy, Debug)]
pub struct EstimateConfig {
    pub resolution: glam::IVec2,
    pub num_threads: u32,
    pub show_progress: bool,
}

impl EstimateConfig {
    pub fn new(resolution: glam::IVec2) -> Self {
        Self {
            resolution,
            num_threads: num_cpus::get() as u32 * 2,
            show_progress: false,
        }
    }
}

/// Mean of the per-sample values and how many samples it was taken over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub num_samples: u64,
}

/// Estimates the surface area as the mean of `1 / pdf` over area samples.
pub fn estimate_area(
    shape: ShapeHandle<'_>,
    sampler: &Sampler,
    config: &EstimateConfig,
) -> anyhow::Result<Estimate> {
    estimate(sampler, config, |sampler| {
        shape
            .sample(sampler.get_2d())
            .map_or(0.0, |ss| 1.0 / ss.pdf as f64)
    })
}

/// Estimates the solid angle `shape` subtends as seen from `ctx`.
pub fn estimate_solid_angle(
    shape: ShapeHandle<'_>,
    ctx: &ShapeSampleContext,
    sampler: &Sampler,
    config: &EstimateConfig,
) -> anyhow::Result<Estimate> {
    estimate(sampler, config, |sampler| {
        shape
            .sample_with_context(ctx, sampler.get_2d())
            .map_or(0.0, |ss| 1.0 / ss.pdf as f64)
    })
}

fn estimate<F>(sampler: &Sampler, config: &EstimateConfig, func: F) -> anyhow::Result<Estimate>
where
    F: Fn(&mut Sampler) -> f64 + Sync,
{
    let width = config.resolution.x.max(0) as u32;
    let height = config.resolution.y.max(0) as u32;
    if width == 0 || height == 0 {
        anyhow::bail!(
            "estimate - resolution {} has no pixels",
            config.resolution
        );
    }
    let spp = sampler.samples_per_pixel();

    let progress_bar = estimate_progress_bar(width, height, config.show_progress);
    let ranges = create_image_ranges(config.num_threads, height);

    let sums = crossbeam::scope(|scope| {
        let handles: Vec<_> = ranges
            .iter()
            .map(|&ImageRange { from, to }| {
                let mut sampler = sampler.clone();
                let progress_bar = progress_bar.clone();
                let func = &func;
                scope.spawn(move |_| {
                    let mut sum = 0.0;
                    for j in from..to {
                        for i in 0..width {
                            let pixel = glam::IVec2::new(i as i32, j as i32);
                            for index in 0..spp {
                                sampler.start_pixel_sample(pixel, index);
                                sum += func(&mut sampler);
                            }
                            progress_bar.inc(1);
                        }
                    }
                    sum
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Result<Vec<f64>, _>>()
    })
    .map_err(|_| anyhow::anyhow!("estimate - worker thread panicked"))?
    .map_err(|_| anyhow::anyhow!("estimate - worker thread panicked"))?;

    progress_bar.finish_and_clear();

    let num_samples = width as u64 * height as u64 * spp as u64;
    let value = sums.iter().sum::<f64>() / num_samples as f64;
    log::debug!("estimate - {} over {} samples", value, num_samples);

    Ok(Estimate { value, num_samples })
}
