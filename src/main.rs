use std::path::PathBuf;

use structopt::StructOpt;
use tagged_geometry::{
    estimate::{self, EstimateConfig},
    loader,
    shape::ShapeSampleContext,
};

/// Loads a scene description and compares the analytic measures of its shapes with Monte
/// Carlo estimates.
#[derive(StructOpt, Debug)]
#[structopt(name = "shape-probe")]
struct Opt {
    /// Scene description JSON
    #[structopt(parse(from_os_str))]
    scene: PathBuf,

    /// Number of worker threads, twice the number of cpus by default
    #[structopt(short, long)]
    threads: Option<u32>,

    /// Also estimate the solid angle each shape subtends from this point
    #[structopt(long, number_of_values = 3, allow_hyphen_values = true)]
    viewpoint: Option<Vec<f32>>,

    /// Show a progress bar per estimate
    #[structopt(long)]
    progress: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    log::info!("Loading scene '{}'...", opt.scene.display());
    let scene = loader::load_scene(&opt.scene)?;
    log::info!(
        "Scene is loaded, sampler: {}, filter: {}",
        scene.sampler,
        scene.filter
    );

    let mut config = EstimateConfig::new(scene.resolution);
    if let Some(threads) = opt.threads {
        config.num_threads = threads.max(1);
    }
    config.show_progress = opt.progress;
    let ctx = opt
        .viewpoint
        .as_ref()
        .map(|p| ShapeSampleContext::from_point(glam::Vec3A::new(p[0], p[1], p[2])));

    let begin_time = std::time::Instant::now();
    for (name, handles) in scene.shape_groups() {
        let mut area = 0.0;
        let mut estimated_area = 0.0;
        let mut estimated_solid_angle = 0.0;
        for &handle in &handles {
            area += handle.area() as f64;
            estimated_area += estimate::estimate_area(handle, &scene.sampler, &config)?.value;
            if let Some(ctx) = &ctx {
                estimated_solid_angle +=
                    estimate::estimate_solid_angle(handle, ctx, &scene.sampler, &config)?.value;
            }
        }

        let kind = handles.first().map_or("<none>", |h| h.tag_name());
        println!(
            "{} ({} x{}): area {:.6}, estimated {:.6}",
            name,
            kind,
            handles.len(),
            area,
            estimated_area
        );
        if ctx.is_some() {
            println!("    solid angle estimated {:.6} sr", estimated_solid_angle);
        }
    }

    log::info!("Finished, time used: {:?}", begin_time.elapsed());
    Ok(())
}
