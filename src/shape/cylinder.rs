use std::{f32::consts::TAU, fmt};

use crate::core::{
    bbox::Bbox,
    coord::Coordinate,
    direction_cone::DirectionCone,
    interaction::{Interaction, SurfaceInteraction},
    loader::{FileLoc, InputParams},
    ray::Ray,
    sampling::spherical_phi,
    transform::Transform,
};

use super::{
    area_sample_to_solid_angle, disk::object_frame, quadric_scale, solid_angle_pdf_from_area,
    uniform_area_pdf, ShapeSample, ShapeSampleContext, ShapeT,
};

/// An open cylinder around the `z` axis of its frame, between `z_min` and `z_max`.
#[derive(Debug)]
pub struct Cylinder {
    base: glam::Vec3A,
    frame: Coordinate,
    radius: f32,
    z_min: f32,
    z_max: f32,
    flip_normals: bool,
}

impl Cylinder {
    pub fn new(
        base: glam::Vec3A,
        frame: Coordinate,
        radius: f32,
        z_min: f32,
        z_max: f32,
        flip_normals: bool,
    ) -> Self {
        Self {
            base,
            frame,
            radius,
            z_min: z_min.min(z_max),
            z_max: z_min.max(z_max),
            flip_normals,
        }
    }

    pub fn load(
        render_from_object: &Transform,
        reverse_orientation: bool,
        params: &mut InputParams,
        loc: &FileLoc,
    ) -> anyhow::Result<Self> {
        let radius = params.get_float_or("radius", 1.0)?;
        let z_min = params.get_float_or("zmin", -1.0)?;
        let z_max = params.get_float_or("zmax", 1.0)?;
        if radius <= 0.0 || z_min == z_max {
            anyhow::bail!(format!(
                "{} at {}: cylinder has no surface",
                params.name(),
                loc
            ));
        }
        let scale = quadric_scale(render_from_object, params.name(), loc)?;
        let base = render_from_object.transform_point3a(glam::Vec3A::ZERO);
        let frame = object_frame(render_from_object);
        let flip_normals = reverse_orientation;

        Ok(Cylinder::new(
            base,
            frame,
            radius * scale,
            z_min * scale,
            z_max * scale,
            flip_normals,
        ))
    }

    fn hit_local(&self, ray: &Ray, t_max: f32) -> Option<(f32, glam::Vec3A)> {
        let o = self.frame.to_local(ray.origin - self.base);
        let d = self.frame.to_local(ray.direction);

        let a = d.x * d.x + d.y * d.y;
        if a == 0.0 {
            return None;
        }
        let b = d.x * o.x + d.y * o.y;
        let c = o.x * o.x + o.y * o.y - self.radius * self.radius;
        let delta = b * b - a * c;
        if delta < 0.0 {
            return None;
        }
        let delta = delta.sqrt();
        let t0 = (-b - delta) / a;
        let t1 = (-b + delta) / a;

        for &t in &[t0, t1] {
            if t <= ray.t_min {
                continue;
            }
            if t > t_max {
                return None;
            }
            let p = o + d * t;
            if p.z >= self.z_min && p.z <= self.z_max {
                return Some((t, p));
            }
        }
        None
    }

    fn oriented(&self, n: glam::Vec3A) -> glam::Vec3A {
        if self.flip_normals {
            -n
        } else {
            n
        }
    }

    fn interaction_local(&self, local: glam::Vec3A) -> (glam::Vec3A, glam::Vec3A, glam::Vec2) {
        let n_local = glam::Vec3A::new(local.x, local.y, 0.0) / self.radius;
        let uv = glam::Vec2::new(
            spherical_phi(local) / TAU,
            (local.z - self.z_min) / (self.z_max - self.z_min),
        );
        let p = self.base + self.frame.to_world(local);
        let n = self.oriented(self.frame.to_world(n_local).normalize());
        (p, n, uv)
    }
}

impl ShapeT for Cylinder {
    fn bounds(&self) -> Bbox {
        let mut bbox = Bbox::empty();
        for &x in &[-self.radius, self.radius] {
            for &y in &[-self.radius, self.radius] {
                for &z in &[self.z_min, self.z_max] {
                    let corner = self.base + self.frame.to_world(glam::Vec3A::new(x, y, z));
                    bbox = bbox.merge_point(corner);
                }
            }
        }
        bbox
    }

    fn normal_bounds(&self) -> DirectionCone {
        DirectionCone::entire_sphere()
    }

    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, SurfaceInteraction)> {
        let (t, local) = self.hit_local(ray, t_max)?;
        // snap the hit back onto the surface
        let r_hit = (local.x * local.x + local.y * local.y).sqrt();
        let local = glam::Vec3A::new(
            local.x * self.radius / r_hit,
            local.y * self.radius / r_hit,
            local.z,
        );
        let (p, n, uv) = self.interaction_local(local);
        let dpdu = glam::Vec3A::new(-TAU * local.y, TAU * local.x, 0.0);
        let dpdv = glam::Vec3A::new(0.0, 0.0, self.z_max - self.z_min);

        Some((
            t,
            SurfaceInteraction {
                p,
                n,
                uv,
                dpdu: self.frame.to_world(dpdu),
                dpdv: self.frame.to_world(dpdv),
                wo: -ray.direction,
                time: ray.time,
            },
        ))
    }

    fn intersect_p(&self, ray: &Ray, t_max: f32) -> bool {
        self.hit_local(ray, t_max).is_some()
    }

    fn area(&self) -> f32 {
        (self.z_max - self.z_min) * self.radius * TAU
    }

    fn sample(&self, u: glam::Vec2) -> Option<ShapeSample> {
        let pdf = uniform_area_pdf(self.area())?;
        let z = self.z_min + u.x * (self.z_max - self.z_min);
        let (sin_phi, cos_phi) = (u.y * TAU).sin_cos();
        let local = glam::Vec3A::new(self.radius * cos_phi, self.radius * sin_phi, z);
        let (p, n, uv) = self.interaction_local(local);
        Some(ShapeSample {
            intr: Interaction {
                p,
                n,
                uv,
                time: 0.0,
            },
            pdf,
        })
    }

    fn pdf(&self, _intr: &Interaction) -> f32 {
        uniform_area_pdf(self.area()).unwrap_or(0.0)
    }

    fn sample_with_context(
        &self,
        ctx: &ShapeSampleContext,
        u: glam::Vec2,
    ) -> Option<ShapeSample> {
        let ss = self.sample(u)?;
        area_sample_to_solid_angle(ctx, ss)
    }

    fn pdf_with_context(&self, ctx: &ShapeSampleContext, wi: glam::Vec3A) -> f32 {
        solid_angle_pdf_from_area(self, ctx, wi)
    }
}

impl fmt::Display for Cylinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ Cylinder base: {} axis: {} radius: {} z_min: {} z_max: {} flip_normals: {} ]",
            self.base,
            self.frame.z(),
            self.radius,
            self.z_min,
            self.z_max,
            self.flip_normals
        )
    }
}
