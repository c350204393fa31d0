use crate::math::Vec3;

pub const LIGHT_POSITION: Vec3 = Vec3::new(-5.0, -5.0, 10.0);
pub const SPHERE_RADIUS: f32 = 0.75;

#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub color: Vec3,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub light_position: Vec3,
}

impl Scene {
    /// Vertical stack of `sphere_count` spheres, each one higher and deeper
    /// than the last, with the diffuse color ramping from red-ish at the
    /// bottom to blue-ish at the top. Pure function of the count: the same
    /// count always yields the same spheres. Requires `sphere_count >= 2`,
    /// enforced by `config::validate_config` before any scene is built.
    pub fn stacked(sphere_count: usize) -> Self {
        let count = sphere_count as f32;
        let mut spheres = Vec::with_capacity(sphere_count);
        for index in 0..sphere_count {
            let i = index as f32;
            let y = -1.0 + i * (2.0 / (count - 1.0));
            let z = -2.0 - i * 0.5;
            let t = (count - i) / count;
            spheres.push(Sphere {
                center: Vec3::new(0.0, y, z),
                radius: SPHERE_RADIUS,
                color: Vec3::new(t, 0.5, 1.0 - t),
            });
        }

        Self {
            spheres,
            light_position: LIGHT_POSITION,
        }
    }
}
