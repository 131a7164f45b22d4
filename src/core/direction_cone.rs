/// A cone of directions around `w`, containing every unit vector within `acos(cos_theta)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionCone {
    pub w: glam::Vec3A,
    pub cos_theta: f32,
}

impl DirectionCone {
    pub fn new(w: glam::Vec3A, cos_theta: f32) -> Self {
        Self {
            w: w.normalize(),
            cos_theta,
        }
    }

    pub fn from_direction(w: glam::Vec3A) -> Self {
        Self::new(w, 1.0)
    }

    pub fn entire_sphere() -> Self {
        Self {
            w: glam::Vec3A::Z,
            cos_theta: -1.0,
        }
    }

    pub fn empty() -> Self {
        Self {
            w: glam::Vec3A::Z,
            cos_theta: f32::INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cos_theta == f32::INFINITY
    }

    /// Whether the unit direction `w` lies inside the cone. Directions on the boundary count,
    /// with a little slack for rounding.
    pub fn contains(&self, w: glam::Vec3A) -> bool {
        !self.is_empty() && self.w.dot(w) >= self.cos_theta - 1e-5
    }

    /// Smallest cone containing both cones.
    pub fn union(a: DirectionCone, b: DirectionCone) -> DirectionCone {
        if a.is_empty() {
            return b;
        }
        if b.is_empty() {
            return a;
        }

        let theta_a = a.cos_theta.clamp(-1.0, 1.0).acos();
        let theta_b = b.cos_theta.clamp(-1.0, 1.0).acos();
        let theta_d = a.w.dot(b.w).clamp(-1.0, 1.0).acos();
        if (theta_d + theta_b).min(std::f32::consts::PI) <= theta_a {
            return a;
        }
        if (theta_d + theta_a).min(std::f32::consts::PI) <= theta_b {
            return b;
        }

        let theta_o = (theta_a + theta_d + theta_b) / 2.0;
        if theta_o >= std::f32::consts::PI {
            return DirectionCone::entire_sphere();
        }

        // rotate a.w towards b.w so the new axis sits in the middle of the merged cone
        let theta_r = theta_o - theta_a;
        let axis = a.w.cross(b.w);
        if axis.length_squared() == 0.0 {
            return DirectionCone::entire_sphere();
        }
        let rotation = glam::Mat3A::from_axis_angle(axis.normalize().into(), theta_r);
        DirectionCone {
            w: (rotation * a.w).normalize(),
            cos_theta: theta_o.cos(),
        }
    }
}
