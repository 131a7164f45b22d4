use crate::core::loader::InputParams;

use super::{load_radius, FilterSample, FilterT};

#[derive(Clone, Debug)]
pub struct BoxFilter {
    radius: glam::Vec2,
}

impl BoxFilter {
    pub fn new(radius: glam::Vec2) -> Self {
        Self { radius }
    }

    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let radius = load_radius(params, 0.5)?;
        Ok(Self::new(radius))
    }
}

impl FilterT for BoxFilter {
    fn radius(&self) -> glam::Vec2 {
        self.radius
    }

    fn evaluate(&self, p: glam::Vec2) -> f32 {
        if p.x.abs() <= self.radius.x && p.y.abs() <= self.radius.y {
            1.0
        } else {
            0.0
        }
    }

    fn sample(&self, u: glam::Vec2) -> FilterSample {
        FilterSample {
            p: -self.radius + u * 2.0 * self.radius,
            weight: 1.0,
        }
    }
}
