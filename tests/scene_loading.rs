use std::path::PathBuf;

use approx::assert_relative_eq;
use tagged_geometry::{
    core::tagged::TaggedUnion,
    estimate::{estimate_area, EstimateConfig},
    loader::load_scene,
    sampler::{SamplerT, StratifiedSampler},
    shape::{Cylinder, Disk, Triangle},
};

fn scene_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tagged-geometry-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const QUAD_OBJ: &str = "\
v 0 0 0
v 2 0 0
v 2 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

#[test]
fn loads_scene_with_external_files() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = scene_dir("external");
    std::fs::write(dir.join("quad.obj"), QUAD_OBJ).unwrap();
    std::fs::write(
        dir.join("shapes.json"),
        r#"[
            { "type": "objmesh", "name": "quad", "filename": "quad.obj", "rotate": [90, 0, 0] },
            { "type": "disk", "radius": 2, "height": 1, "reverse_orientation": true },
            { "type": "cylinder", "radius": 0.5, "zmin": 0, "zmax": 3, "translate": [1, 2, 3] }
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("scene.json"),
        r#"{
            "resolution": [8, 4],
            "sampler": { "type": "stratified", "xsamples": 2, "ysamples": 3, "jitter": false },
            "shapes": "shapes.json"
        }"#,
    )
    .unwrap();

    let scene = load_scene(dir.join("scene.json")).unwrap();
    assert_eq!(scene.resolution, glam::IVec2::new(8, 4));
    assert!(scene.sampler.is::<StratifiedSampler>());
    assert_eq!(scene.sampler.samples_per_pixel(), 6);
    assert_eq!(scene.filter.tag_name(), "BoxFilter");

    let groups: Vec<_> = scene.shape_groups().collect();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].0, "quad");
    assert_eq!(groups[0].1.len(), 2);
    assert!(groups[0].1.iter().all(|h| h.is::<Triangle>()));
    let quad_area: f32 = groups[0].1.iter().map(|h| h.area()).sum();
    assert_relative_eq!(quad_area, 2.0, max_relative = 1e-5);

    // rotated about x, the quad now spans y = 0 with z in [0, 1]
    let bounds = groups[0].1[0].bounds().merge(groups[0].1[1].bounds());
    assert!(bounds.p_max.y.abs() < 1e-5 && bounds.p_min.y.abs() < 1e-5);
    assert_relative_eq!(bounds.p_max.z, 1.0, max_relative = 1e-5);

    let disk = groups[1].1[0];
    assert!(disk.is::<Disk>());
    assert!(disk.normal_bounds().contains(-glam::Vec3A::Z));

    let cylinder = groups[2].1[0];
    assert!(cylinder.is::<Cylinder>());
    assert!(cylinder
        .bounds()
        .contains(glam::Vec3A::new(1.0, 2.0, 4.5)));

    let config = EstimateConfig {
        num_threads: 2,
        ..EstimateConfig::new(scene.resolution)
    };
    for handle in scene.shape_handles() {
        let estimate = estimate_area(handle, &scene.sampler, &config).unwrap();
        assert_eq!(estimate.num_samples, 8 * 4 * 6);
        assert_relative_eq!(estimate.value as f32, handle.area(), max_relative = 1e-4);
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn errors_name_where_they_happened() {
    let dir = scene_dir("errors");
    std::fs::write(
        dir.join("scene.json"),
        r#"{
            "sampler": { "type": "independent" },
            "shapes": [
                { "type": "sphere" },
                { "type": "sphere", "scale": [1, 2, 1] }
            ]
        }"#,
    )
    .unwrap();
    let err = load_scene(dir.join("scene.json")).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("non-uniform scale"), "{}", message);
    assert!(message.contains("scene.json[1]"), "{}", message);

    std::fs::write(
        dir.join("scene.json"),
        r#"{ "sampler": { "type": "independent" }, "shapes": "missing.json" }"#,
    )
    .unwrap();
    let err = load_scene(dir.join("scene.json")).unwrap_err();
    assert!(err.to_string().contains("External json file not found"));

    assert!(load_scene(dir.join("nothing-here.json")).is_err());

    std::fs::remove_dir_all(&dir).ok();
}
