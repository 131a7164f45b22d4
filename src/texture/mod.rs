mod checker;
mod constant;

pub use checker::*;
pub use constant::*;

use crate::core::loader::InputParams;

/// Where a float texture is looked up.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextureEvalContext {
    pub p: glam::Vec3A,
    pub uv: glam::Vec2,
}

impl TextureEvalContext {
    pub fn new(p: glam::Vec3A, uv: glam::Vec2) -> Self {
        Self { p, uv }
    }
}

#[enum_dispatch::enum_dispatch(FloatTexture)]
pub trait FloatTextureT: Send + Sync {
    fn evaluate(&self, ctx: &TextureEvalContext) -> f32;
}

#[enum_dispatch::enum_dispatch]
#[derive(Debug)]
pub enum FloatTexture {
    ConstFloatTex,
    CheckerFloatTex,
}

crate::tagged_union!(FloatTexture {
    ConstFloatTex,
    CheckerFloatTex,
});

/// Builds a float texture and returns it with the name other objects refer to it by.
pub fn create_float_texture_from_params(
    params: &mut InputParams,
) -> anyhow::Result<(String, FloatTexture)> {
    params.set_name("texture".into());
    let ty = params.get_str("type")?;
    let name = params.get_str("name")?;
    params.set_name(format!("texture-{}-{}", ty, name).into());

    let res = match ty.as_str() {
        "constant" => ConstFloatTex::load(params)?.into(),
        "checkerboard" => CheckerFloatTex::load(params)?.into(),
        _ => anyhow::bail!(format!("{}: unknown type '{}'", params.name(), ty)),
    };

    params.check_unused_keys();

    Ok((name, res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tagged::TaggedUnion;

    #[test]
    fn factory_dispatches_on_type() {
        let mut params = InputParams::new("texture")
            .with("type", "checkerboard")
            .with("name", "holes")
            .with("tex1", 0.0f32)
            .with("tex2", 1.0f32)
            .with("uscale", 4.0f32);
        let (name, tex) = create_float_texture_from_params(&mut params).unwrap();
        assert_eq!(name, "holes");
        assert!(tex.is::<CheckerFloatTex>());
        assert_eq!(tex.tag_name(), "CheckerFloatTex");

        let mut params = InputParams::new("texture")
            .with("type", "noise")
            .with("name", "n");
        let err = create_float_texture_from_params(&mut params).unwrap_err();
        assert!(err.to_string().contains("unknown type 'noise'"));
    }
}
