use std::{
    f32::consts::{FRAC_1_PI, PI, TAU},
    fmt,
};

use crate::core::{
    bbox::Bbox,
    coord::Coordinate,
    direction_cone::DirectionCone,
    interaction::{Interaction, SurfaceInteraction},
    loader::{FileLoc, InputParams},
    ray::Ray,
    sampling::{safe_acos, safe_sqrt, spherical_direction, spherical_phi, uniform_on_sphere},
    transform::Transform,
};

use super::{
    area_sample_to_solid_angle, quadric_scale, solid_angle_pdf_from_area, uniform_area_pdf,
    ShapeSample, ShapeSampleContext, ShapeT,
};

/// Below this `sin^2` of the cone half angle the cone is sampled with a series expansion, the
/// direct formula loses all precision there.
const SMALL_CONE_SIN2: f32 = 0.00068523;

#[derive(Debug)]
pub struct Sphere {
    center: glam::Vec3A,
    radius: f32,
    flip_normals: bool,
    bbox: Bbox,
}

impl Sphere {
    pub fn new(center: glam::Vec3A, radius: f32, flip_normals: bool) -> Self {
        let delta = glam::Vec3A::new(radius, radius, radius);
        let bbox = Bbox::new(center - delta, center + delta);
        Self {
            center,
            radius,
            flip_normals,
            bbox,
        }
    }

    pub fn load(
        render_from_object: &Transform,
        reverse_orientation: bool,
        params: &mut InputParams,
        loc: &FileLoc,
    ) -> anyhow::Result<Self> {
        let radius = params.get_float_or("radius", 1.0)?;
        if radius <= 0.0 {
            anyhow::bail!(format!(
                "{} at {}: radius should be positive",
                params.name(),
                loc
            ));
        }
        let scale = quadric_scale(render_from_object, params.name(), loc)?;
        let center = render_from_object.transform_point3a(glam::Vec3A::ZERO);
        let flip_normals = reverse_orientation;

        Ok(Sphere::new(center, radius * scale, flip_normals))
    }

    pub fn center(&self) -> glam::Vec3A {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let b = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;
        let delta = b * b - a * c;
        if delta >= 0.0 {
            let delta = delta.sqrt();
            let min = (-b - delta) / a;
            let max = (-b + delta) / a;
            Some((min, max))
        } else {
            None
        }
    }

    fn hit_t(&self, ray: &Ray, t_max: f32) -> Option<f32> {
        let (min, max) = self.intersect_ray(ray)?;
        let t = if min > ray.t_min { min } else { max };
        if t > ray.t_min && t <= t_max {
            Some(t)
        } else {
            None
        }
    }

    fn oriented(&self, n: glam::Vec3A) -> glam::Vec3A {
        if self.flip_normals {
            -n
        } else {
            n
        }
    }

    /// `u` follows the azimuth, `v` runs from the south pole (0) to the north pole (1).
    fn uv_of(dir: glam::Vec3A) -> glam::Vec2 {
        let theta = safe_acos(dir.z);
        let phi = spherical_phi(dir);
        glam::Vec2::new(phi * 0.5 * FRAC_1_PI, 1.0 - theta * FRAC_1_PI)
    }

    fn surface_interaction(&self, p_hit: glam::Vec3A, ray: &Ray) -> SurfaceInteraction {
        let mut local = p_hit - self.center;
        local *= self.radius / local.length();
        if local.x == 0.0 && local.y == 0.0 {
            local.x = 1e-5 * self.radius;
        }

        let dir = local / self.radius;
        let uv = Self::uv_of(dir);
        let z_radius = (local.x * local.x + local.y * local.y).sqrt();
        let cos_phi = local.x / z_radius;
        let sin_phi = local.y / z_radius;
        let sin_theta = safe_sqrt(1.0 - dir.z * dir.z);
        let dpdu = glam::Vec3A::new(-TAU * local.y, TAU * local.x, 0.0);
        let dpdv = -PI
            * glam::Vec3A::new(
                local.z * cos_phi,
                local.z * sin_phi,
                -self.radius * sin_theta,
            );

        SurfaceInteraction {
            p: self.center + local,
            n: self.oriented(dir.normalize()),
            uv,
            dpdu,
            dpdv,
            wo: -ray.direction,
            time: ray.time,
        }
    }

    /// `1 - cos` of the half angle of the cone the sphere covers when seen from `p`.
    fn one_minus_cos_theta_max(&self, p: glam::Vec3A) -> f32 {
        let sin2_theta_max = self.radius * self.radius / self.center.distance_squared(p);
        if sin2_theta_max < SMALL_CONE_SIN2 {
            sin2_theta_max / 2.0
        } else {
            1.0 - safe_sqrt(1.0 - sin2_theta_max)
        }
    }

    fn is_inside(&self, ctx: &ShapeSampleContext) -> bool {
        let p_origin = ctx.offset_ray_origin(self.center - ctx.p);
        p_origin.distance_squared(self.center) <= self.radius * self.radius
    }
}

impl ShapeT for Sphere {
    fn bounds(&self) -> Bbox {
        self.bbox
    }

    fn normal_bounds(&self) -> DirectionCone {
        DirectionCone::entire_sphere()
    }

    fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, SurfaceInteraction)> {
        let t = self.hit_t(ray, t_max)?;
        Some((t, self.surface_interaction(ray.point_at(t), ray)))
    }

    fn intersect_p(&self, ray: &Ray, t_max: f32) -> bool {
        self.hit_t(ray, t_max).is_some()
    }

    fn area(&self) -> f32 {
        4.0 * PI * self.radius * self.radius
    }

    fn sample(&self, u: glam::Vec2) -> Option<ShapeSample> {
        let pdf = uniform_area_pdf(self.area())?;
        let dir = uniform_on_sphere(u);
        Some(ShapeSample {
            intr: Interaction {
                p: self.center + dir * self.radius,
                n: self.oriented(dir),
                uv: Self::uv_of(dir),
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
        if self.is_inside(ctx) {
            let ss = self.sample(u)?;
            return area_sample_to_solid_angle(ctx, ss);
        }

        // sample the cone of directions the sphere subtends, then find the point on the
        // sphere the sampled direction hits first
        let sin_theta_max = self.radius / ctx.p.distance(self.center);
        let sin2_theta_max = sin_theta_max * sin_theta_max;
        let cos_theta_max = safe_sqrt(1.0 - sin2_theta_max);
        let mut one_minus_cos_theta_max = 1.0 - cos_theta_max;

        let mut cos_theta = (cos_theta_max - 1.0) * u.x + 1.0;
        let mut sin2_theta = 1.0 - cos_theta * cos_theta;
        if sin2_theta_max < SMALL_CONE_SIN2 {
            sin2_theta = sin2_theta_max * u.x;
            cos_theta = (1.0 - sin2_theta).sqrt();
            one_minus_cos_theta_max = sin2_theta_max / 2.0;
        }

        let cos_alpha = sin2_theta / sin_theta_max
            + cos_theta * safe_sqrt(1.0 - sin2_theta / (sin_theta_max * sin_theta_max));
        let sin_alpha = safe_sqrt(1.0 - cos_alpha * cos_alpha);
        let phi = u.y * TAU;
        let w = spherical_direction(sin_alpha, cos_alpha, phi);

        let frame = Coordinate::from_z((self.center - ctx.p).normalize());
        let dir = frame.to_world(-w).normalize();
        let pdf = 1.0 / (TAU * one_minus_cos_theta_max);
        if !pdf.is_finite() {
            return None;
        }

        Some(ShapeSample {
            intr: Interaction {
                p: self.center + dir * self.radius,
                n: self.oriented(dir),
                uv: Self::uv_of(dir),
                time: ctx.time,
            },
            pdf,
        })
    }

    fn pdf_with_context(&self, ctx: &ShapeSampleContext, wi: glam::Vec3A) -> f32 {
        if self.is_inside(ctx) {
            return solid_angle_pdf_from_area(self, ctx, wi);
        }
        1.0 / (TAU * self.one_minus_cos_theta_max(ctx.p))
    }
}

impl fmt::Display for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ Sphere center: {} radius: {} flip_normals: {} ]",
            self.center, self.radius, self.flip_normals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hits_front_then_back() {
        let sphere = Sphere::new(glam::Vec3A::new(0.0, 0.0, -3.0), 1.0, false);
        let ray = Ray::new(glam::Vec3A::ZERO, -glam::Vec3A::Z);
        let (t, isect) = sphere.intersect(&ray, f32::INFINITY).unwrap();
        assert_abs_diff_eq!(t, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!((isect.n - glam::Vec3A::Z).length(), 0.0, epsilon = 1e-5);
        assert!(sphere.intersect(&ray, 1.5).is_none());
        assert!(sphere.intersect_p(&ray, 2.0));

        // from the inside only the far side is in front of the ray
        let ray = Ray::new(glam::Vec3A::new(0.0, 0.0, -3.0), glam::Vec3A::X);
        let (t, isect) = sphere.intersect(&ray, f32::INFINITY).unwrap();
        assert_abs_diff_eq!(t, 1.0, epsilon = 1e-5);
        assert!(isect.n.dot(ray.direction) > 0.0);
    }

    #[test]
    fn uv_and_partials() {
        let sphere = Sphere::new(glam::Vec3A::ZERO, 2.0, false);
        let ray = Ray::new(glam::Vec3A::new(5.0, 0.0, 0.0), -glam::Vec3A::X);
        let (_, isect) = sphere.intersect(&ray, f32::INFINITY).unwrap();
        assert_abs_diff_eq!(isect.uv.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(isect.uv.y, 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(isect.dpdu.dot(isect.n), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(isect.dpdv.dot(isect.n), 0.0, epsilon = 1e-4);
        assert!(isect.dpdu.cross(isect.dpdv).dot(isect.n) > 0.0);
    }

    #[test]
    fn reversed_sphere_points_inwards() {
        let sphere = Sphere::new(glam::Vec3A::ZERO, 1.0, true);
        let ss = sphere.sample(glam::Vec2::new(0.3, 0.6)).unwrap();
        assert_abs_diff_eq!(ss.intr.n.dot(ss.intr.p), -1.0, epsilon = 1e-5);
    }

    #[test]
    fn cone_sampling_from_outside() {
        let sphere = Sphere::new(glam::Vec3A::ZERO, 1.0, false);
        let ctx = ShapeSampleContext::from_point(glam::Vec3A::new(0.0, 0.0, 4.0));
        for &(x, y) in &[(0.1, 0.2), (0.5, 0.5), (0.9, 0.7), (0.99, 0.01)] {
            let ss = sphere
                .sample_with_context(&ctx, glam::Vec2::new(x, y))
                .unwrap();
            assert_abs_diff_eq!(ss.intr.p.length(), 1.0, epsilon = 1e-4);
            // the sampled point faces the reference point
            assert!(ss.intr.n.dot(ctx.p - ss.intr.p) >= -1e-4);
            let wi = (ss.intr.p - ctx.p).normalize();
            assert_abs_diff_eq!(sphere.pdf_with_context(&ctx, wi), ss.pdf, epsilon = 1e-3);
        }

        let cos_theta_max = (1.0f32 - 1.0 / 16.0).sqrt();
        let expected = 1.0 / (TAU * (1.0 - cos_theta_max));
        assert_abs_diff_eq!(
            sphere.pdf_with_context(&ctx, -glam::Vec3A::Z),
            expected,
            epsilon = 1e-2
        );
    }

    #[test]
    fn tiny_sphere_far_away_keeps_finite_density() {
        let sphere = Sphere::new(glam::Vec3A::ZERO, 0.01, false);
        let ctx = ShapeSampleContext::from_point(glam::Vec3A::new(100.0, 0.0, 0.0));
        let ss = sphere
            .sample_with_context(&ctx, glam::Vec2::new(0.4, 0.3))
            .unwrap();
        assert!(ss.pdf.is_finite() && ss.pdf > 0.0);
        assert_abs_diff_eq!(ss.intr.p.length(), 0.01, epsilon = 1e-4);
    }

    #[test]
    fn zero_radius_has_no_samples() {
        let sphere = Sphere::new(glam::Vec3A::ONE, 0.0, false);
        let u = glam::Vec2::new(0.3, 0.6);
        assert!(sphere.sample(u).is_none());
        let outside = ShapeSampleContext::from_point(glam::Vec3A::new(4.0, 1.0, 1.0));
        assert!(sphere.sample_with_context(&outside, u).is_none());
        let at_center = ShapeSampleContext::from_point(glam::Vec3A::ONE);
        assert!(sphere.sample_with_context(&at_center, u).is_none());
    }
}
