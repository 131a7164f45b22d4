#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: glam::Vec3A,
    pub direction: glam::Vec3A,
    pub t_min: f32,
    pub time: f32,
}

impl Ray {
    /// Hits closer than this are treated as self-intersections with the surface the ray left.
    pub const T_MIN_EPS: f32 = 0.0001;

    pub fn new(origin: glam::Vec3A, direction: glam::Vec3A) -> Self {
        Self {
            origin,
            direction,
            t_min: Self::T_MIN_EPS,
            time: 0.0,
        }
    }

    pub fn with_time(self, time: f32) -> Self {
        Self { time, ..self }
    }

    pub fn point_at(&self, t: f32) -> glam::Vec3A {
        self.origin + self.direction * t
    }
}
