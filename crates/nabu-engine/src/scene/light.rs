use crate::math::Vec3;
use crate::shader::{UniformBlock, UniformValue};

pub const LIGHT_COLOR: &str = "light.color";
pub const LIGHT_POSITION: &str = "light.position";
pub const LIGHT_AMBIENT_STRENGTH: &str = "light.ambient_strength";
pub const LIGHT_SPECULAR_STRENGTH: &str = "light.specular_strength";
pub const LIGHT_HARDNESS: &str = "light.hardness";

#[derive(Debug, Clone, PartialEq)]
pub struct LightConfig {
    pub color: Vec3,
    pub position: Vec3,
    pub ambient_strength: f32,
    pub specular_strength: f32,
    /// Specular exponent.
    pub hardness: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            position: Vec3::new(1.2, 1.0, 2.0),
            ambient_strength: 0.1,
            specular_strength: 0.5,
            hardness: 32.0,
        }
    }
}

/// Point light for a Phong-style shader.
#[derive(Debug, Clone)]
pub struct Light {
    config: LightConfig,
    uniforms: UniformBlock,
}

impl Light {
    pub fn new(config: LightConfig) -> Self {
        let uniforms = UniformBlock::new()
            .with(LIGHT_COLOR, config.color)
            .with(LIGHT_POSITION, config.position)
            .with(LIGHT_AMBIENT_STRENGTH, config.ambient_strength)
            .with(LIGHT_SPECULAR_STRENGTH, config.specular_strength)
            .with(LIGHT_HARDNESS, config.hardness);
        Self { config, uniforms }
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.config.color = color;
        self.publish(LIGHT_COLOR, color);
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.config.position = position;
        self.publish(LIGHT_POSITION, position);
    }

    pub fn set_ambient_strength(&mut self, strength: f32) {
        self.config.ambient_strength = strength;
        self.publish(LIGHT_AMBIENT_STRENGTH, strength);
    }

    pub fn set_specular_strength(&mut self, strength: f32) {
        self.config.specular_strength = strength;
        self.publish(LIGHT_SPECULAR_STRENGTH, strength);
    }

    pub fn set_hardness(&mut self, hardness: f32) {
        self.config.hardness = hardness;
        self.publish(LIGHT_HARDNESS, hardness);
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformBlock {
        &mut self.uniforms
    }

    fn publish(&mut self, name: &str, value: impl Into<UniformValue>) {
        if let Err(e) = self.uniforms.set(name, value) {
            log::error!("light uniform: {e}");
        }
    }
}
