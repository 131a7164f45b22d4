mod boxf;
mod triangle;

pub use boxf::*;
pub use triangle::*;

use std::fmt;

use crate::core::loader::InputParams;

/// Offset from the pixel center and the weight the sample carries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSample {
    pub p: glam::Vec2,
    pub weight: f32,
}

#[enum_dispatch::enum_dispatch(Filter)]
pub trait FilterT: Send + Sync {
    fn radius(&self) -> glam::Vec2;

    fn evaluate(&self, p: glam::Vec2) -> f32;

    /// Maps `u` to an offset distributed like the filter.
    fn sample(&self, u: glam::Vec2) -> FilterSample;
}

#[enum_dispatch::enum_dispatch]
#[derive(Clone, Debug)]
pub enum Filter {
    BoxFilter,
    TriangleFilter,
}

crate::tagged_union!(Filter {
    BoxFilter,
    TriangleFilter,
});

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Filter::BoxFilter(_) => "BoxFilter",
            Filter::TriangleFilter(_) => "TriangleFilter",
        };
        write!(f, "[ {} radius: {} ]", name, self.radius())
    }
}

pub fn create_filter_from_params(params: &mut InputParams) -> anyhow::Result<Filter> {
    params.set_name("filter".into());
    let ty = params.get_str("type")?;
    params.set_name(format!("filter-{}", ty).into());

    let res = match ty.as_str() {
        "box" => BoxFilter::load(params)?.into(),
        "triangle" => TriangleFilter::load(params)?.into(),
        _ => anyhow::bail!(format!("{}: unknown type '{}'", params.name(), ty)),
    };

    params.check_unused_keys();

    Ok(res)
}

fn load_radius(params: &mut InputParams, fallback: f32) -> anyhow::Result<glam::Vec2> {
    let radius = params.get_float_or("radius", fallback)?;
    if radius <= 0.0 {
        anyhow::bail!(format!("{}: 'radius' should be positive", params.name()));
    }
    Ok(glam::Vec2::new(radius, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tagged::TaggedUnion;

    #[test]
    fn factory_reads_type_and_radius() {
        let mut params = InputParams::new("filter")
            .with("type", "triangle")
            .with("radius", 1.5f32);
        let filter = create_filter_from_params(&mut params).unwrap();
        assert!(filter.is::<TriangleFilter>());
        assert_eq!(filter.radius(), glam::Vec2::new(1.5, 1.5));
        assert_eq!(filter.to_string(), "[ TriangleFilter radius: [1.5, 1.5] ]");

        let mut params = InputParams::new("filter").with("type", "box");
        let filter = create_filter_from_params(&mut params).unwrap();
        assert_eq!(filter.radius(), glam::Vec2::new(0.5, 0.5));

        let mut params = InputParams::new("filter").with("type", "gaussian");
        assert!(create_filter_from_params(&mut params).is_err());
    }
}
