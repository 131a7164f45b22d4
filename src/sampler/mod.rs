mod independent;
mod recurrence;
mod stratified;

pub use independent::*;
pub use recurrence::*;
pub use stratified::*;

use std::fmt;

use crate::{
    core::loader::{FileLoc, InputParams},
    filter::{Filter, FilterT},
};

/// Per-pixel stream of sample values. Each worker owns its own clone.
#[enum_dispatch::enum_dispatch(Sampler)]
pub trait SamplerT: Send + Sync + Clone {
    fn samples_per_pixel(&self) -> u32;

    fn start_pixel_sample(&mut self, p: glam::IVec2, sample_index: u32) {
        self.start_pixel_sample_from(p, sample_index, 0);
    }

    /// Restarts the stream of sample `sample_index` of pixel `p`, skipping its first
    /// `dimension` dimensions.
    fn start_pixel_sample_from(&mut self, p: glam::IVec2, sample_index: u32, dimension: u32);

    fn get_1d(&mut self) -> f32;

    fn get_2d(&mut self) -> glam::Vec2;

    /// The sample used for the position on the film inside the pixel.
    fn get_pixel_2d(&mut self) -> glam::Vec2;
}

#[enum_dispatch::enum_dispatch]
#[derive(Clone, Debug)]
pub enum Sampler {
    IndependentSampler,
    StratifiedSampler,
    RecurrenceSampler,
}

crate::tagged_union!(Sampler {
    IndependentSampler,
    StratifiedSampler,
    RecurrenceSampler,
});

impl fmt::Display for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sampler::IndependentSampler(sampler) => sampler.fmt(f),
            Sampler::StratifiedSampler(sampler) => sampler.fmt(f),
            Sampler::RecurrenceSampler(sampler) => sampler.fmt(f),
        }
    }
}

/// Where a sampler is in its current stream.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StreamCursor {
    pub pixel: glam::IVec2,
    pub sample_index: u32,
    pub dimension: u32,
    started: bool,
}

impl StreamCursor {
    pub fn start(&mut self, pixel: glam::IVec2, sample_index: u32, dimension: u32) {
        self.pixel = pixel;
        self.sample_index = sample_index;
        self.dimension = dimension;
        self.started = true;
    }

    /// Returns the current dimension and moves `count` dimensions on.
    pub fn take(&mut self, count: u32) -> u32 {
        debug_assert!(
            self.started,
            "sampler is used before start_pixel_sample is called"
        );
        let dimension = self.dimension;
        self.dimension += count;
        dimension
    }
}

/// Everything a camera needs to turn one pixel sample into a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSample {
    pub p_film: glam::Vec2,
    pub p_lens: glam::Vec2,
    pub time: f32,
    pub filter_weight: f32,
}

impl Default for CameraSample {
    fn default() -> Self {
        Self {
            p_film: glam::Vec2::ZERO,
            p_lens: glam::Vec2::ZERO,
            time: 0.0,
            filter_weight: 1.0,
        }
    }
}

/// Draws a camera sample for pixel `p_pixel`. The stream must already be started.
pub fn get_camera_sample<S: SamplerT>(
    sampler: &mut S,
    p_pixel: glam::IVec2,
    filter: &Filter,
) -> CameraSample {
    let fs = filter.sample(sampler.get_pixel_2d());
    CameraSample {
        p_film: p_pixel.as_vec2() + glam::Vec2::new(0.5, 0.5) + fs.p,
        time: sampler.get_1d(),
        p_lens: sampler.get_2d(),
        filter_weight: fs.weight,
    }
}

pub fn create_sampler(
    name: &str,
    params: &mut InputParams,
    full_resolution: glam::IVec2,
    loc: &FileLoc,
) -> anyhow::Result<Sampler> {
    params.set_name(format!("sampler-{}", name).into());
    let seed = params.get_int_or("seed", 0)? as u32 as u64;

    let res = match name {
        "independent" => IndependentSampler::load(params, seed, loc)?.into(),
        "stratified" => StratifiedSampler::load(params, seed, loc)?.into(),
        "recurrence" => RecurrenceSampler::load(params, seed, full_resolution, loc)?.into(),
        _ => anyhow::bail!(format!("{} at {}: unknown sampler '{}'", params.name(), loc, name)),
    };

    params.check_unused_keys();
    log::debug!("{} - created {}", loc, res);

    Ok(res)
}

/// Reads `pixelsamples`, which has to be positive.
fn load_samples_per_pixel(params: &mut InputParams, loc: &FileLoc) -> anyhow::Result<u32> {
    let spp = params.get_int_or("pixelsamples", 16)?;
    if spp <= 0 {
        anyhow::bail!(format!(
            "{} at {}: 'pixelsamples' should be positive",
            params.name(),
            loc
        ));
    }
    Ok(spp as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::tagged::TaggedUnion, filter::BoxFilter};

    fn all_samplers() -> Vec<Sampler> {
        let loc = FileLoc::default();
        let res = glam::IVec2::new(16, 16);
        vec![
            create_sampler(
                "independent",
                &mut InputParams::new("s").with("pixelsamples", 8),
                res,
                &loc,
            )
            .unwrap(),
            create_sampler(
                "stratified",
                &mut InputParams::new("s")
                    .with("xsamples", 2)
                    .with("ysamples", 4),
                res,
                &loc,
            )
            .unwrap(),
            create_sampler(
                "recurrence",
                &mut InputParams::new("s").with("pixelsamples", 8),
                res,
                &loc,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn factory_builds_each_variant() {
        let samplers = all_samplers();
        assert!(samplers[0].is::<IndependentSampler>());
        assert!(samplers[1].is::<StratifiedSampler>());
        assert!(samplers[2].is::<RecurrenceSampler>());
        for sampler in &samplers {
            assert_eq!(sampler.samples_per_pixel(), 8);
            assert!(sampler.to_string().contains(sampler.tag_name()));
        }

        let err = create_sampler(
            "sobol",
            &mut InputParams::new("s"),
            glam::IVec2::ONE,
            &FileLoc::new("scene.json", None),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown sampler 'sobol'"));

        let err = create_sampler(
            "independent",
            &mut InputParams::new("s").with("pixelsamples", 0),
            glam::IVec2::ONE,
            &FileLoc::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("should be positive"));
    }

    #[test]
    fn restart_repeats_the_stream() {
        for mut sampler in all_samplers() {
            let p = glam::IVec2::new(3, 5);
            sampler.start_pixel_sample(p, 2);
            let first = (sampler.get_1d(), sampler.get_2d(), sampler.get_pixel_2d());
            sampler.start_pixel_sample(glam::IVec2::new(4, 5), 2);
            sampler.get_1d();
            sampler.start_pixel_sample(p, 2);
            let again = (sampler.get_1d(), sampler.get_2d(), sampler.get_pixel_2d());
            assert_eq!(first, again, "{}", sampler);
        }
    }

    #[test]
    fn clones_are_independent() {
        for mut sampler in all_samplers() {
            let p = glam::IVec2::new(1, 1);
            sampler.start_pixel_sample(p, 0);
            let mut other = sampler.clone();
            let a = sampler.get_2d();
            other.start_pixel_sample(glam::IVec2::new(9, 9), 3);
            other.get_2d();
            let b = sampler.get_2d();

            sampler.start_pixel_sample(p, 0);
            assert_eq!(sampler.get_2d(), a);
            assert_eq!(sampler.get_2d(), b);
        }
    }

    #[test]
    fn camera_sample_stays_in_filter_footprint() {
        let filter: Filter = BoxFilter::new(glam::Vec2::new(0.5, 0.5)).into();
        for mut sampler in all_samplers() {
            let p = glam::IVec2::new(7, 2);
            for index in 0..sampler.samples_per_pixel() {
                sampler.start_pixel_sample(p, index);
                let cs = get_camera_sample(&mut sampler, p, &filter);
                assert!(cs.p_film.x >= 7.0 && cs.p_film.x <= 8.0);
                assert!(cs.p_film.y >= 2.0 && cs.p_film.y <= 3.0);
                assert!(cs.time >= 0.0 && cs.time < 1.0);
                assert!(cs.p_lens.cmpge(glam::Vec2::ZERO).all());
                assert!(cs.p_lens.cmplt(glam::Vec2::ONE).all());
                assert_eq!(cs.filter_weight, 1.0);
            }
        }
        assert_eq!(CameraSample::default().filter_weight, 1.0);
    }
}
