use std::{
    f32::consts::{PI, TAU},
    fmt,
};

use crate::core::{
    bbox::Bbox,
    coord::Coordinate,
    direction_cone::DirectionCone,
    interaction::{Interaction, SurfaceInteraction},
    loader::{FileLoc, InputParams},
    ray::Ray,
    sampling::{safe_sqrt, spherical_phi, uniform_in_disk},
    transform::Transform,
};

use super::{
    area_sample_to_solid_angle, quadric_scale, solid_angle_pdf_from_area, uniform_area_pdf,
    ShapeSample, ShapeSampleContext, ShapeT,
};

/// A full disk. Its frame's `z` axis is the axis of the disk.
#[derive(Debug)]
pub struct Disk {
    center: glam::Vec3A,
    frame: Coordinate,
    radius: f32,
    flip_normals: bool,
}

impl Disk {
    pub fn new(center: glam::Vec3A, frame: Coordinate, radius: f32, flip_normals: bool) -> Self {
        Self {
            center,
            frame,
            radius,
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
        let height = params.get_float_or("height", 0.0)?;
        if radius <= 0.0 {
            anyhow::bail!(format!(
                "{} at {}: radius should be positive",
                params.name(),
                loc
            ));
        }
        let scale = quadric_scale(render_from_object, params.name(), loc)?;
        let center = render_from_object.transform_point3a(glam::Vec3A::new(0.0, 0.0, height));
        let frame = object_frame(render_from_object);
        let flip_normals = reverse_orientation;

        Ok(Disk::new(center, frame, radius * scale, flip_normals))
    }

    fn normal(&self) -> glam::Vec3A {
        if self.flip_normals {
            -self.frame.z()
        } else {
            self.frame.z()
        }
    }

    /// Hit point in the disk's local frame.
    fn hit_local(&self, ray: &Ray, t_max: f32) -> Option<(f32, glam::Vec3A)> {
        let o = self.frame.to_local(ray.origin - self.center);
        let d = self.frame.to_local(ray.direction);
        if d.z == 0.0 {
            return None;
        }
        let t = -o.z / d.z;
        if t <= ray.t_min || t > t_max {
            return None;
        }
        let p = o + d * t;
        if p.x * p.x + p.y * p.y > self.radius * self.radius {
            return None;
        }
        Some((t, glam::Vec3A::new(p.x, p.y, 0.0)))
    }

    /// `u` follows the azimuth, `v` runs from the rim (0) to the center (1).
    fn uv_of(&self, local: glam::Vec3A) -> glam::Vec2 {
        let r_hit = (local.x * local.x + local.y * local.y).sqrt();
        glam::Vec2::new(
            spherical_phi(local) / TAU,
            (self.radius - r_hit) / self.radius,
        )
    }
}

/// Orthonormal frame along the object space axes of a similarity transform. The `z` axis is the
/// transformed object `z` normal.
pub(super) fn object_frame(render_from_object: &Transform) -> Coordinate {
    let x = render_from_object
        .transform_vector3a(glam::Vec3A::X)
        .normalize();
    let y = render_from_object
        .transform_vector3a(glam::Vec3A::Y)
        .normalize();
    let z = render_from_object.transform_normal3a(glam::Vec3A::Z);
    Coordinate::from_axes(x, y, z)
}

impl ShapeT for Disk {
    fn bounds(&self) -> Bbox {
        let n = self.frame.z();
        let extent = glam::Vec3A::new(
            safe_sqrt(1.0 - n.x * n.x),
            safe_sqrt(1.0 - n.y * n.y),
            safe_sqrt(1.0 - n.z * n.z),
        ) * self.radius;
        Bbox::new(self.center - extent, self.center + extent)
    }

    fn normal_bounds(&self) -> DirectionCone {
        DirectionCone::from_direction(self.normal())
    }

    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, SurfaceInteraction)> {
        let (t, local) = self.hit_local(ray, t_max)?;
        let r_hit = (local.x * local.x + local.y * local.y).sqrt();
        let dpdu = glam::Vec3A::new(-TAU * local.y, TAU * local.x, 0.0);
        let dpdv = if r_hit > 0.0 {
            local * (-self.radius / r_hit)
        } else {
            glam::Vec3A::new(-self.radius, 0.0, 0.0)
        };

        Some((
            t,
            SurfaceInteraction {
                p: self.center + self.frame.to_world(local),
                n: self.normal(),
                uv: self.uv_of(local),
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
        PI * self.radius * self.radius
    }

    fn sample(&self, u: glam::Vec2) -> Option<ShapeSample> {
        let pdf = uniform_area_pdf(self.area())?;
        let pd = uniform_in_disk(u) * self.radius;
        let local = glam::Vec3A::new(pd.x, pd.y, 0.0);
        Some(ShapeSample {
            intr: Interaction {
                p: self.center + self.frame.to_world(local),
                n: self.normal(),
                uv: self.uv_of(local),
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

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ Disk center: {} normal: {} radius: {} flip_normals: {} ]",
            self.center,
            self.normal(),
            self.radius,
            self.flip_normals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tilted_disk() -> Disk {
        let transform = Transform::new(
            glam::Affine3A::from_translation(glam::Vec3::new(1.0, 2.0, 3.0))
                * glam::Affine3A::from_rotation_x(0.6),
        );
        Disk::new(
            transform.transform_point3a(glam::Vec3A::ZERO),
            object_frame(&transform),
            1.5,
            false,
        )
    }

    #[test]
    fn hit_inside_radius_only() {
        let disk = Disk::new(glam::Vec3A::ZERO, Coordinate::from_z(glam::Vec3A::Z), 1.0, false);
        let ray = Ray::new(glam::Vec3A::new(0.5, 0.0, 2.0), -glam::Vec3A::Z);
        let (t, isect) = disk.intersect(&ray, f32::INFINITY).unwrap();
        assert_abs_diff_eq!(t, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(isect.uv.y, 0.5, epsilon = 1e-5);
        assert_eq!(isect.n, glam::Vec3A::Z);

        let miss = Ray::new(glam::Vec3A::new(1.5, 0.0, 2.0), -glam::Vec3A::Z);
        assert!(disk.intersect(&miss, f32::INFINITY).is_none());
        let parallel = Ray::new(glam::Vec3A::new(-2.0, 0.0, 0.0), glam::Vec3A::X);
        assert!(!disk.intersect_p(&parallel, f32::INFINITY));
    }

    #[test]
    fn samples_lie_in_bounds() {
        let disk = tilted_disk();
        let bounds = disk.bounds().expand(1e-4);
        for i in 0..8 {
            for j in 0..8 {
                let u = glam::Vec2::new((i as f32 + 0.5) / 8.0, (j as f32 + 0.5) / 8.0);
                let ss = disk.sample(u).unwrap();
                assert!(bounds.contains(ss.intr.p));
                assert!(disk.normal_bounds().contains(ss.intr.n));
                assert_abs_diff_eq!(ss.pdf * disk.area(), 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn solid_angle_matches_area_conversion() {
        let disk = tilted_disk();
        let ctx = ShapeSampleContext::from_point(glam::Vec3A::new(0.0, 5.0, 0.0));
        for &(x, y) in &[(0.2, 0.3), (0.7, 0.1), (0.5, 0.9)] {
            let ss = disk
                .sample_with_context(&ctx, glam::Vec2::new(x, y))
                .unwrap();
            let wi = (ss.intr.p - ctx.p).normalize();
            let pdf = disk.pdf_with_context(&ctx, wi);
            assert_abs_diff_eq!(pdf / ss.pdf, 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn zero_radius_has_no_samples() {
        let disk = Disk::new(glam::Vec3A::ZERO, Coordinate::from_z(glam::Vec3A::Z), 0.0, false);
        let u = glam::Vec2::new(0.3, 0.6);
        assert!(disk.sample(u).is_none());
        let ctx = ShapeSampleContext::from_point(glam::Vec3A::new(0.0, 0.0, 2.0));
        assert!(disk.sample_with_context(&ctx, u).is_none());
    }
}
