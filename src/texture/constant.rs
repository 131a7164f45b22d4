use crate::core::loader::InputParams;

use super::{FloatTextureT, TextureEvalContext};

#[derive(Debug)]
pub struct ConstFloatTex {
    value: f32,
}

impl ConstFloatTex {
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    pub fn load(params: &mut InputParams) -> anyhow::Result<Self> {
        let value = params.get_float_or("value", 1.0)?;
        Ok(Self::new(value))
    }
}

impl FloatTextureT for ConstFloatTex {
    fn evaluate(&self, _ctx: &TextureEvalContext) -> f32 {
        self.value
    }
}
