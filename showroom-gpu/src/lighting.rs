//! Lighting rig as seen by the shader

use bytemuck::{Pod, Zeroable};
use showroom_core::{Light, Lighting};

/// Directional lights beyond this count are dropped
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Uniform block matching `Lighting` in `mesh.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LightingUniform {
    /// `xyz` unit vector towards the light, `w` intensity
    pub directional: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    pub ambient: f32,
    pub hemisphere: f32,
    pub directional_count: u32,
    pub _padding: f32,
}

impl LightingUniform {
    /// Collapse a list of lights into the fixed-size uniform.
    ///
    /// Ambient and hemisphere intensities add up. Directional lights shine
    /// from their position towards the origin.
    pub fn from_lighting(lighting: &Lighting) -> Self {
        let mut uniform = Self::zeroed();

        for light in &lighting.lights {
            match *light {
                Light::Ambient { intensity } => uniform.ambient += intensity,
                Light::Hemisphere { intensity } => uniform.hemisphere += intensity,
                Light::Directional { position, intensity } => {
                    let slot = uniform.directional_count as usize;
                    if slot >= MAX_DIRECTIONAL_LIGHTS {
                        log::warn!("Ignoring directional light at {:?}: at most {} supported", position, MAX_DIRECTIONAL_LIGHTS);
                        continue;
                    }
                    let Some(direction) = position.coords.try_normalize(f32::EPSILON) else {
                        log::warn!("Ignoring directional light placed at the origin");
                        continue;
                    };
                    uniform.directional[slot] = [direction.x, direction.y, direction.z, intensity];
                    uniform.directional_count += 1;
                }
            }
        }

        uniform
    }
}

impl From<&Lighting> for LightingUniform {
    fn from(lighting: &Lighting) -> Self {
        Self::from_lighting(lighting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use showroom_core::Point3f;

    #[test]
    fn test_uniform_size_matches_wgsl() {
        // array<vec4<f32>, 4> + 4 scalars
        assert_eq!(std::mem::size_of::<LightingUniform>(), 80);
    }

    #[test]
    fn test_orbit_rig() {
        let uniform = LightingUniform::from_lighting(&Lighting::orbit());
        assert_relative_eq!(uniform.ambient, 0.8);
        assert_eq!(uniform.directional_count, 1);

        let d = uniform.directional[0];
        let s = 1.0 / 3.0f32.sqrt();
        assert_relative_eq!(d[0], s, epsilon = 1e-6);
        assert_relative_eq!(d[1], s, epsilon = 1e-6);
        assert_relative_eq!(d[2], s, epsilon = 1e-6);
        assert_relative_eq!(d[3], 1.0);
    }

    #[test]
    fn test_studio_rig() {
        let uniform = LightingUniform::from_lighting(&Lighting::studio());
        assert_relative_eq!(uniform.ambient, 1.0);
        assert_relative_eq!(uniform.hemisphere, 0.6);
        assert_eq!(uniform.directional_count, 3);
        assert_relative_eq!(uniform.directional[2][3], 1.2);
    }

    #[test]
    fn test_excess_and_degenerate_lights_are_dropped() {
        let mut lights = vec![Light::Directional { position: Point3f::origin(), intensity: 1.0 }];
        for i in 0..6 {
            lights.push(Light::Directional { position: Point3f::new(1.0, i as f32, 0.0), intensity: 0.5 });
        }
        let uniform = LightingUniform::from_lighting(&Lighting { lights });
        assert_eq!(uniform.directional_count as usize, MAX_DIRECTIONAL_LIGHTS);
        assert_relative_eq!(uniform.directional[0][0], 1.0);
    }
}
