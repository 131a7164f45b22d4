/// A point on a surface, as produced by shape sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    pub p: glam::Vec3A,
    pub n: glam::Vec3A,
    pub uv: glam::Vec2,
    pub time: f32,
}

/// Local differential geometry at a ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceInteraction {
    pub p: glam::Vec3A,
    pub n: glam::Vec3A,
    pub uv: glam::Vec2,
    pub dpdu: glam::Vec3A,
    pub dpdv: glam::Vec3A,
    /// Direction back towards the ray origin.
    pub wo: glam::Vec3A,
    pub time: f32,
}

impl SurfaceInteraction {
    pub fn interaction(&self) -> Interaction {
        Interaction {
            p: self.p,
            n: self.n,
            uv: self.uv,
            time: self.time,
        }
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            p: glam::Vec3A::ZERO,
            n: glam::Vec3A::Z,
            uv: glam::Vec2::ZERO,
            time: 0.0,
        }
    }
}
