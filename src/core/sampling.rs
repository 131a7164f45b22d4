//! Warps from the unit square to the domains shapes and filters are sampled on.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Largest `f32` below 1.
pub const ONE_MINUS_EPSILON: f32 = 1.0 - f32::EPSILON / 2.0;

pub fn safe_sqrt(x: f32) -> f32 {
    x.max(0.0).sqrt()
}

pub fn safe_acos(x: f32) -> f32 {
    x.clamp(-1.0, 1.0).acos()
}

/// Unit direction with the given polar angle (as sine and cosine) and azimuth `phi`.
pub fn spherical_direction(sin_theta: f32, cos_theta: f32, phi: f32) -> glam::Vec3A {
    let (sin_phi, cos_phi) = phi.sin_cos();
    glam::Vec3A::new(
        sin_theta.clamp(-1.0, 1.0) * cos_phi,
        sin_theta.clamp(-1.0, 1.0) * sin_phi,
        cos_theta.clamp(-1.0, 1.0),
    )
}

/// Azimuth of `v` around the z axis, in `[0, 2pi)`.
pub fn spherical_phi(v: glam::Vec3A) -> f32 {
    let phi = v.y.atan2(v.x);
    if phi < 0.0 {
        phi + 2.0 * PI
    } else {
        phi
    }
}

pub fn uniform_on_sphere(u: glam::Vec2) -> glam::Vec3A {
    let cos_theta = 1.0 - 2.0 * u.x;
    let sin_theta = safe_sqrt(1.0 - cos_theta * cos_theta);
    let phi = u.y * 2.0 * PI;
    let (sin_phi, cos_phi) = phi.sin_cos();
    glam::Vec3A::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
}

/// Shirley-Chiu concentric mapping onto the unit disk.
pub fn uniform_in_disk(u: glam::Vec2) -> glam::Vec2 {
    let offset = u * 2.0 - glam::Vec2::ONE;
    if offset.x == 0.0 && offset.y == 0.0 {
        return glam::Vec2::ZERO;
    }

    let (r, theta) = if offset.x.abs() > offset.y.abs() {
        (offset.x, FRAC_PI_4 * (offset.y / offset.x))
    } else {
        (offset.y, FRAC_PI_2 - FRAC_PI_4 * (offset.x / offset.y))
    };
    let (sin_theta, cos_theta) = theta.sin_cos();
    glam::Vec2::new(cos_theta, sin_theta) * r
}

/// Barycentric coordinates of a uniformly distributed point in a triangle.
pub fn uniform_in_triangle(u: glam::Vec2) -> [f32; 3] {
    let r0_sqrt = u.x.sqrt();
    let b0 = 1.0 - r0_sqrt;
    let b1 = r0_sqrt * (1.0 - u.y);
    [b0, b1, 1.0 - b0 - b1]
}

/// Samples the tent function of radius `r` centered at 0.
pub fn sample_tent(u: f32, r: f32) -> f32 {
    if u < 0.5 {
        let u = u / 0.5;
        -r + r * u.sqrt()
    } else {
        let u = (u - 0.5) / 0.5;
        r - r * (1.0 - u).sqrt()
    }
}
