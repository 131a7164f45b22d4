use crate::core::{loader::InputParams, sampling::sample_tent};

use super::{load_radius, FilterSample, FilterT};

/// Tent filter, falling off linearly to 0 at the radius.
#[derive(Clone, Debug)]
pub struct TriangleFilter {
    radius: glam::Vec2,
}

impl TriangleFilter {
    pub fn new(radius: glam::Vec2) -> Self {
        Self { radius }
    }

    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let radius = load_radius(params, 2.0)?;
        Ok(Self::new(radius))
    }
}

impl FilterT for TriangleFilter {
    fn radius(&self) -> glam::Vec2 {
        self.radius
    }

    fn evaluate(&self, p: glam::Vec2) -> f32 {
        (self.radius.x - p.x.abs()).max(0.0) * (self.radius.y - p.y.abs()).max(0.0)
    }

    fn sample(&self, u: glam::Vec2) -> FilterSample {
        FilterSample {
            p: glam::Vec2::new(
                sample_tent(u.x, self.radius.x),
                sample_tent(u.y, self.radius.y),
            ),
            weight: 1.0,
        }
    }
}
