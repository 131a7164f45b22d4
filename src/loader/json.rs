use std::{
    collections::HashMap,
    convert::TryInto,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    core::{
        loader::{FileLoc, InputParams},
        tagged::{Arena, ArenaIndex, Handle},
        transform::Transform,
    },
    filter::{self, BoxFilter, Filter},
    sampler::{self, Sampler},
    shape::{self, Shape},
    texture::{self, FloatTexture},
};

/// Everything a scene description sets up: the shape arena and the sampling configuration.
#[derive(Debug)]
pub struct Scene {
    pub resolution: glam::IVec2,
    pub sampler: Sampler,
    pub filter: Filter,
    pub float_textures: HashMap<String, Arc<FloatTexture>>,
    pub shapes: Arena<Shape>,
    shape_names: Vec<(String, Vec<ArenaIndex>)>,
}

impl Scene {
    pub fn shape_handles(&self) -> impl Iterator<Item = Handle<'_, Shape>> + '_ {
        self.shapes.handles()
    }

    /// Shapes grouped by the scene entry that created them.
    pub fn shape_groups(&self) -> impl Iterator<Item = (&str, Vec<Handle<'_, Shape>>)> + '_ {
        self.shape_names.iter().map(move |(name, indices)| {
            let handles = indices.iter().map(|&i| self.shapes.handle(i)).collect();
            (name.as_str(), handles)
        })
    }
}

#[derive(Default)]
struct SceneBuilder {
    float_textures: HashMap<String, Arc<FloatTexture>>,
    shapes: Arena<Shape>,
    shape_names: Vec<(String, Vec<ArenaIndex>)>,
}

impl SceneBuilder {
    fn load_texture(&mut self, params: &mut InputParams, loc: &FileLoc) -> anyhow::Result<()> {
        let (name, tex) = texture::create_float_texture_from_params(params)
            .with_context(|| format!("texture at {}", loc))?;
        if self.float_textures.contains_key(&name) {
            anyhow::bail!(format!("{} at {}: duplicated texture name", params.name(), loc));
        }
        self.float_textures.insert(name, Arc::new(tex));
        Ok(())
    }

    fn load_shape(&mut self, params: &mut InputParams, loc: &FileLoc) -> anyhow::Result<()> {
        params.set_name("shape".into());
        let ty = params.get_str("type")?;
        let name = params.get_str_or("name", &format!("{}", loc))?;
        params.set_name(format!("shape-{}", ty).into());

        let render_from_object = load_transform(params)?;
        let reverse_orientation = params.get_bool_or("reverse_orientation", false)?;

        let indices = shape::create_shapes(
            &ty,
            &render_from_object,
            reverse_orientation,
            params,
            &self.float_textures,
            loc,
            &mut self.shapes,
        )?;
        self.shape_names.push((name, indices));
        Ok(())
    }
}

/// Reads the optional `matrix`, `scale`, `rotate` (degrees) and `translate` keys, applied in
/// that order.
fn load_transform(params: &mut InputParams) -> anyhow::Result<Transform> {
    let mut trans = glam::Affine3A::IDENTITY;
    // `transform` and `matrix` both take 16 floats, column-major
    for key in &["transform", "matrix"] {
        if params.contains_key(key) {
            trans = glam::Affine3A::from_mat4(params.get_matrix(key)?) * trans;
        }
    }
    if params.contains_key("scale") {
        trans = glam::Affine3A::from_scale(params.get_float3("scale")?.into()) * trans;
    }
    if params.contains_key("rotate") {
        let rotate = params.get_float3("rotate")?;
        trans = glam::Affine3A::from_rotation_z(rotate[2].to_radians())
            * glam::Affine3A::from_rotation_x(rotate[0].to_radians())
            * glam::Affine3A::from_rotation_y(rotate[1].to_radians())
            * trans;
    }
    if params.contains_key("translate") {
        trans = glam::Affine3A::from_translation(params.get_float3("translate")?.into()) * trans;
    }
    Ok(Transform::new(trans))
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> anyhow::Result<Scene> {
    let path = path.as_ref().to_path_buf();
    let json_file = std::fs::File::open(&path)
        .with_context(|| format!("scene - can't open '{}'", path.display()))?;
    let json_reader = std::io::BufReader::new(json_file);
    let json_value: serde_json::Value = serde_json::from_reader(json_reader)?;
    load_scene_from_value(&path, &json_value)
}

/// Builds a scene from parsed JSON. `path` locates external files the description refers to.
pub fn load_scene_from_value(path: &Path, json_value: &serde_json::Value) -> anyhow::Result<Scene> {
    let path = path.to_path_buf();

    let resolution = match json_value.get("resolution") {
        Some(value) => {
            let res = value
                .as_array()
                .filter(|arr| arr.len() == 2)
                .and_then(|arr| Some((arr[0].as_i64()?, arr[1].as_i64()?)))
                .context("scene - 'resolution' should be an array of 2 integers")?;
            if res.0 <= 0 || res.1 <= 0 {
                anyhow::bail!("scene - 'resolution' should be positive");
            }
            glam::IVec2::new(res.0 as i32, res.1 as i32)
        }
        None => glam::IVec2::new(64, 64),
    };

    let sampler_value = json_value
        .get("sampler")
        .context("scene - There is no 'sampler' field")?;
    let mut sampler_params: InputParams = sampler_value.try_into()?;
    sampler_params.set_name("sampler".into());
    let sampler_type = sampler_params.get_str("type")?;
    let sampler = sampler::create_sampler(
        &sampler_type,
        &mut sampler_params,
        resolution,
        &FileLoc::new(format!("{}", path.display()), None),
    )?;

    let filter = match json_value.get("filter") {
        Some(filter_value) => {
            let mut filter_params: InputParams = filter_value.try_into()?;
            filter::create_filter_from_params(&mut filter_params)?
        }
        None => BoxFilter::new(glam::Vec2::new(0.5, 0.5)).into(),
    };

    let mut builder = SceneBuilder::default();

    if let Some(texture_value) = json_value.get("textures") {
        load_from_value_or_external(
            &mut builder,
            &path,
            texture_value,
            "json-textures",
            &SceneBuilder::load_texture,
        )?;
    }

    let shape_value = json_value
        .get("shapes")
        .context("scene - There is no 'shapes' field")?;
    load_from_value_or_external(
        &mut builder,
        &path,
        shape_value,
        "json-shapes",
        &SceneBuilder::load_shape,
    )?;

    log::info!(
        "scene - {} shape(s) from {} entries",
        builder.shapes.len(),
        builder.shape_names.len()
    );

    Ok(Scene {
        resolution,
        sampler,
        filter,
        float_textures: builder.float_textures,
        shapes: builder.shapes,
        shape_names: builder.shape_names,
    })
}

fn load_from_object<F>(
    builder: &mut SceneBuilder,
    path: &PathBuf,
    value: &serde_json::Value,
    loc: &FileLoc,
    load_func: &F,
) -> anyhow::Result<()>
where
    F: Fn(&mut SceneBuilder, &mut InputParams, &FileLoc) -> anyhow::Result<()>,
{
    let mut params: InputParams = value
        .try_into()
        .with_context(|| format!("{} - invalid entry", loc))?;
    params.set_base_path(path.clone());
    load_func(builder, &mut params, loc)
}

/// Loads an object, an array of objects, or a path to a JSON file holding either.
fn load_from_value_or_external<F>(
    builder: &mut SceneBuilder,
    path: &PathBuf,
    value: &serde_json::Value,
    env: &str,
    load_func: &F,
) -> anyhow::Result<()>
where
    F: Fn(&mut SceneBuilder, &mut InputParams, &FileLoc) -> anyhow::Result<()>,
{
    if let Some(json_path) = value.as_str() {
        let external_path = path.with_file_name(json_path);
        let json_file = std::fs::File::open(&external_path)
            .context(format!("{} - External json file not found", env))?;
        let json_reader = std::io::BufReader::new(json_file);
        let json_value: serde_json::Value = serde_json::from_reader(json_reader)?;
        load_from_value_or_external(builder, &external_path, &json_value, env, load_func)?;
    } else if let Some(array) = value.as_array() {
        let filename = format!("{}", path.display());
        for (index, ele) in array.iter().enumerate() {
            let loc = FileLoc::new(filename.clone(), Some(index));
            load_from_object(builder, path, ele, &loc, load_func)?;
        }
    } else {
        let loc = FileLoc::new(format!("{}", path.display()), None);
        load_from_object(builder, path, value, &loc, load_func)?;
    }

    Ok(())
}
