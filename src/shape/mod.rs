mod cylinder;
mod disk;
mod sphere;
mod triangle;

pub use cylinder::*;
pub use disk::*;
pub use sphere::*;
pub use triangle::*;

use std::{collections::HashMap, fmt, sync::Arc};

use anyhow::Context;

use crate::{
    core::{
        bbox::Bbox,
        direction_cone::DirectionCone,
        interaction::{Interaction, SurfaceInteraction},
        loader::{FileLoc, InputParams},
        ray::Ray,
        tagged::{Arena, ArenaIndex, Handle},
        transform::Transform,
    },
    texture::{ConstFloatTex, FloatTexture},
};

/// A point on a shape together with its sampling density, in the measure of the call that
/// produced it.
#[derive(Clone, Copy, Debug)]
pub struct ShapeSample {
    pub intr: Interaction,
    pub pdf: f32,
}

/// The point a shape is sampled from when sampling by solid angle.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeSampleContext {
    pub p: glam::Vec3A,
    /// Geometric normal, absent for points in free space.
    pub n: Option<glam::Vec3A>,
    pub ns: Option<glam::Vec3A>,
    pub time: f32,
}

impl ShapeSampleContext {
    const ORIGIN_OFFSET: f32 = 1e-4;

    pub fn new(
        p: glam::Vec3A,
        n: Option<glam::Vec3A>,
        ns: Option<glam::Vec3A>,
        time: f32,
    ) -> Self {
        Self { p, n, ns, time }
    }

    pub fn from_point(p: glam::Vec3A) -> Self {
        Self {
            p,
            ..Default::default()
        }
    }

    pub fn from_interaction(intr: &SurfaceInteraction) -> Self {
        Self {
            p: intr.p,
            n: Some(intr.n),
            ns: Some(intr.n),
            time: intr.time,
        }
    }

    /// `p` pushed off its surface to the side `w` points to.
    pub fn offset_ray_origin(&self, w: glam::Vec3A) -> glam::Vec3A {
        match self.n {
            Some(n) => {
                let offset = n * Self::ORIGIN_OFFSET;
                if w.dot(n) < 0.0 {
                    self.p - offset
                } else {
                    self.p + offset
                }
            }
            None => self.p,
        }
    }

    pub fn spawn_ray(&self, wi: glam::Vec3A) -> Ray {
        Ray::new(self.offset_ray_origin(wi), wi).with_time(self.time)
    }
}

/// A ray hit together with the shape that was hit.
#[derive(Clone, Copy, Debug)]
pub struct ShapeIntersection<'a> {
    pub t_hit: f32,
    pub intr: SurfaceInteraction,
    pub shape: ShapeHandle<'a>,
}

#[enum_dispatch::enum_dispatch(Shape)]
pub trait ShapeT: Send + Sync {
    fn bounds(&self) -> Bbox;

    /// Cone containing every surface normal of the shape.
    fn normal_bounds(&self) -> DirectionCone;

    /// Closest hit with `t` in `(ray.t_min, t_max]`.
    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, SurfaceInteraction)>;

    fn intersect_p(&self, ray: &Ray, t_max: f32) -> bool {
        self.intersect(ray, t_max).is_some()
    }

    fn area(&self) -> f32;

    /// Samples a point with density per unit area.
    fn sample(&self, u: glam::Vec2) -> Option<ShapeSample>;

    fn pdf(&self, intr: &Interaction) -> f32;

    /// Samples a point with density per unit solid angle as seen from `ctx`.
    fn sample_with_context(&self, ctx: &ShapeSampleContext, u: glam::Vec2)
        -> Option<ShapeSample>;

    /// Solid angle density of sampling direction `wi` from `ctx`. Only meaningful for
    /// directions that hit the shape; others get 0.
    fn pdf_with_context(&self, ctx: &ShapeSampleContext, wi: glam::Vec3A) -> f32;
}

#[enum_dispatch::enum_dispatch]
#[derive(Debug)]
pub enum Shape {
    Sphere,
    Disk,
    Cylinder,
    Triangle,
}

crate::tagged_union!(Shape {
    Sphere,
    Disk,
    Cylinder,
    Triangle,
});

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Sphere(shape) => shape.fmt(f),
            Shape::Disk(shape) => shape.fmt(f),
            Shape::Cylinder(shape) => shape.fmt(f),
            Shape::Triangle(shape) => shape.fmt(f),
        }
    }
}

pub type ShapeHandle<'a> = Handle<'a, Shape>;

impl<'a> Handle<'a, Shape> {
    #[inline]
    pub fn bounds(&self) -> Bbox {
        self.get().bounds()
    }

    #[inline]
    pub fn normal_bounds(&self) -> DirectionCone {
        self.get().normal_bounds()
    }

    #[inline]
    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<ShapeIntersection<'a>> {
        let (t_hit, intr) = self.get().intersect(ray, t_max)?;
        Some(ShapeIntersection {
            t_hit,
            intr,
            shape: *self,
        })
    }

    #[inline]
    pub fn intersect_p(&self, ray: &Ray, t_max: f32) -> bool {
        self.get().intersect_p(ray, t_max)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.get().area()
    }

    #[inline]
    pub fn sample(&self, u: glam::Vec2) -> Option<ShapeSample> {
        self.get().sample(u)
    }

    #[inline]
    pub fn pdf(&self, intr: &Interaction) -> f32 {
        self.get().pdf(intr)
    }

    #[inline]
    pub fn sample_with_context(
        &self,
        ctx: &ShapeSampleContext,
        u: glam::Vec2,
    ) -> Option<ShapeSample> {
        self.get().sample_with_context(ctx, u)
    }

    #[inline]
    pub fn pdf_with_context(&self, ctx: &ShapeSampleContext, wi: glam::Vec3A) -> f32 {
        self.get().pdf_with_context(ctx, wi)
    }
}

/// Closest hit among `shapes`, tested one by one.
pub fn intersect_closest<'a>(
    shapes: &[ShapeHandle<'a>],
    ray: &Ray,
    t_max: f32,
) -> Option<ShapeIntersection<'a>> {
    let mut closest: Option<ShapeIntersection<'a>> = None;
    for shape in shapes {
        let t_max = closest.map_or(t_max, |isect| isect.t_hit);
        if let Some(isect) = shape.intersect(ray, t_max) {
            closest = Some(isect);
        }
    }
    closest
}

pub fn union_bounds<'a, I: IntoIterator<Item = ShapeHandle<'a>>>(shapes: I) -> Bbox {
    shapes
        .into_iter()
        .fold(Bbox::empty(), |bbox, shape| bbox.merge(shape.bounds()))
}

pub fn union_normal_bounds<'a, I: IntoIterator<Item = ShapeHandle<'a>>>(
    shapes: I,
) -> DirectionCone {
    shapes.into_iter().fold(DirectionCone::empty(), |cone, shape| {
        DirectionCone::union(cone, shape.normal_bounds())
    })
}

/// Density of uniform area sampling. Degenerate shapes have none.
pub(crate) fn uniform_area_pdf(area: f32) -> Option<f32> {
    if area > 0.0 {
        Some(1.0 / area)
    } else {
        None
    }
}

/// Turns an area density sample into a solid angle density one as seen from `ctx`.
///
/// The density is scaled by `dist^2 / |cos|` where `cos` is taken between the sampled normal
/// and the direction back to `ctx`. Samples seen edge-on are dropped.
pub(crate) fn area_sample_to_solid_angle(
    ctx: &ShapeSampleContext,
    mut ss: ShapeSample,
) -> Option<ShapeSample> {
    ss.intr.time = ctx.time;
    let wi = ss.intr.p - ctx.p;
    let dist2 = wi.length_squared();
    if dist2 == 0.0 {
        return None;
    }
    let wi = wi / dist2.sqrt();
    let cos_theta = ss.intr.n.dot(-wi).abs();
    if cos_theta == 0.0 {
        return None;
    }
    ss.pdf *= dist2 / cos_theta;
    if ss.pdf.is_finite() {
        Some(ss)
    } else {
        None
    }
}

/// Solid angle density for shapes that are sampled by area, found by tracing `wi` from `ctx`.
pub(crate) fn solid_angle_pdf_from_area<S: ShapeT + ?Sized>(
    shape: &S,
    ctx: &ShapeSampleContext,
    wi: glam::Vec3A,
) -> f32 {
    let wi = wi.normalize();
    let ray = ctx.spawn_ray(wi);
    let (_, isect) = match shape.intersect(&ray, f32::INFINITY) {
        Some(hit) => hit,
        None => return 0.0,
    };
    let cos_theta = isect.n.dot(-wi).abs();
    let pdf = shape.pdf(&isect.interaction()) * ctx.p.distance_squared(isect.p) / cos_theta;
    if pdf.is_finite() {
        pdf
    } else {
        0.0
    }
}

/// Scale of a transform applied to an analytic shape, which only supports similarity
/// transforms.
fn quadric_scale(
    render_from_object: &Transform,
    env: &str,
    loc: &FileLoc,
) -> anyhow::Result<f32> {
    render_from_object.uniform_scale().with_context(|| {
        format!(
            "{} at {}: non-uniform scale and shear are not supported",
            env, loc
        )
    })
}

/// Reads `key` as either the name of a float texture or a constant. A constant 1 means no
/// texture at all.
fn load_float_texture(
    params: &mut InputParams,
    key: &str,
    float_textures: &HashMap<String, Arc<FloatTexture>>,
    loc: &FileLoc,
) -> anyhow::Result<Option<Arc<FloatTexture>>> {
    if !params.contains_key(key) {
        return Ok(None);
    }
    if params.is_str(key) {
        let tex_name = params.get_str(key)?;
        let tex = float_textures.get(&tex_name).with_context(|| {
            format!(
                "{} at {}: float texture '{}' not found",
                params.name(),
                loc,
                tex_name
            )
        })?;
        Ok(Some(tex.clone()))
    } else {
        let value = params.get_float(key)?;
        if value == 1.0 {
            Ok(None)
        } else {
            Ok(Some(Arc::new(ConstFloatTex::new(value).into())))
        }
    }
}

/// Builds the shapes named `name` into `arena`. Meshes give one shape per triangle.
pub fn create_shapes(
    name: &str,
    render_from_object: &Transform,
    reverse_orientation: bool,
    params: &mut InputParams,
    float_textures: &HashMap<String, Arc<FloatTexture>>,
    loc: &FileLoc,
    arena: &mut Arena<Shape>,
) -> anyhow::Result<Vec<ArenaIndex>> {
    params.set_name(format!("shape-{}", name).into());
    if render_from_object.is_singular() {
        anyhow::bail!(format!("{} at {}: transform is singular", params.name(), loc));
    }

    let indices = match name {
        "sphere" => {
            let shape = Sphere::load(render_from_object, reverse_orientation, params, loc)?;
            vec![arena.alloc(shape)]
        }
        "disk" => {
            let shape = Disk::load(render_from_object, reverse_orientation, params, loc)?;
            vec![arena.alloc(shape)]
        }
        "cylinder" => {
            let shape = Cylinder::load(render_from_object, reverse_orientation, params, loc)?;
            vec![arena.alloc(shape)]
        }
        "trianglemesh" | "objmesh" => {
            let mut mesh = if name == "trianglemesh" {
                TriangleMesh::load(render_from_object, reverse_orientation, params, loc)?
            } else {
                TriangleMesh::load_obj(render_from_object, reverse_orientation, params, loc)?
            };
            mesh.alpha = load_float_texture(params, "alpha", float_textures, loc)?;
            Triangle::create_triangles(Arc::new(mesh))
                .into_iter()
                .map(|triangle| arena.alloc(triangle))
                .collect()
        }
        _ => anyhow::bail!(format!("{} at {}: unknown shape '{}'", params.name(), loc, name)),
    };

    params.check_unused_keys();
    log::debug!("{} - created {} shape(s) from '{}'", loc, indices.len(), name);

    Ok(indices)
}
