use crate::core::loader::InputParams;

use super::{FloatTextureT, TextureEvalContext};

/// Two values alternating on a grid in uv space.
#[derive(Debug)]
pub struct CheckerFloatTex {
    tex1: f32,
    tex2: f32,
    scale: glam::Vec2,
}

impl CheckerFloatTex {
    pub fn new(tex1: f32, tex2: f32, scale: glam::Vec2) -> Self {
        Self { tex1, tex2, scale }
    }

    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let tex1 = params.get_float_or("tex1", 1.0)?;
        let tex2 = params.get_float_or("tex2", 0.0)?;
        let u_scale = params.get_float_or("uscale", 1.0)?;
        let v_scale = params.get_float_or("vscale", 1.0)?;
        Ok(Self::new(tex1, tex2, glam::Vec2::new(u_scale, v_scale)))
    }
}

impl FloatTextureT for CheckerFloatTex {
    fn evaluate(&self, ctx: &TextureEvalContext) -> f32 {
        let st = ctx.uv * self.scale;
        if (st.x.floor() as i32 + st.y.floor() as i32) % 2 == 0 {
            self.tex1
        } else {
            self.tex2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_between_cells() {
        let tex = CheckerFloatTex::new(1.0, 0.0, glam::Vec2::new(2.0, 2.0));
        let at = |u, v| {
            let ctx = TextureEvalContext::new(glam::Vec3A::ZERO, glam::Vec2::new(u, v));
            tex.evaluate(&ctx)
        };
        assert_eq!(at(0.1, 0.1), 1.0);
        assert_eq!(at(0.6, 0.1), 0.0);
        assert_eq!(at(0.6, 0.6), 1.0);
        assert_eq!(at(-0.1, 0.1), 0.0);
    }
}
