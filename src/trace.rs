use crate::math::{Ray, Vec3};
use crate::scene::{Scene, Sphere};

pub const CAMERA_ORIGIN: Vec3 = Vec3::new(0.0, 0.0, 2.0);

const AMBIENT_STRENGTH: f32 = 0.1;
const SPECULAR_COLOR: Vec3 = Vec3::new(1.0, 1.0, 1.0);
const BACKGROUND_CELLS: f32 = 5.0;
const BACKGROUND_LIGHT: Vec3 = Vec3::splat(0.9);
const BACKGROUND_DARK: Vec3 = Vec3::splat(0.1);

// Everything in this module is mirrored by shaders/trace.wgsl. Any change to
// a formula here must be applied there as well, or the backends drift apart.

/// Distance to the near intersection, if the ray hits the sphere in front of
/// its origin. The far root is never considered, so a ray starting inside a
/// sphere misses it.
pub fn intersect_sphere(sphere: &Sphere, ray: &Ray) -> Option<f32> {
    let oc = ray.origin - sphere.center;
    let b = oc.dot(ray.direction);
    let c = oc.dot(oc) - sphere.radius * sphere.radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Index and distance of the closest hit across the whole scene. Strict `<`
/// keeps the lowest-index sphere on exact distance ties.
pub fn closest_hit(scene: &Scene, ray: &Ray) -> Option<(usize, f32)> {
    let mut closest: Option<(usize, f32)> = None;
    for (index, sphere) in scene.spheres.iter().enumerate() {
        if let Some(t) = intersect_sphere(sphere, ray) {
            if closest.map_or(true, |(_, best)| t < best) {
                closest = Some((index, t));
            }
        }
    }
    closest
}

pub fn phong_shade(
    point: Vec3,
    normal: Vec3,
    view: Vec3,
    light_position: Vec3,
    diffuse_color: Vec3,
) -> Vec3 {
    let ambient = diffuse_color * AMBIENT_STRENGTH;
    let light_dir = (light_position - point).normalize();
    let diffuse = diffuse_color * normal.dot(light_dir).max(0.0);
    let reflected = (normal * (2.0 * normal.dot(light_dir)) - light_dir).normalize();
    let specular = SPECULAR_COLOR * specular_power(reflected.dot(view).max(0.0));
    ambient + diffuse + specular
}

// Shininess is fixed at 32. The squaring chain runs the same five multiplies
// on both backends, where a pow() builtin would not be bit-reproducible.
fn specular_power(base: f32) -> f32 {
    let s2 = base * base;
    let s4 = s2 * s2;
    let s8 = s4 * s4;
    let s16 = s8 * s8;
    s16 * s16
}

/// Checkerboard for rays that hit nothing, from normalized screen
/// coordinates in [-1, 1]^2.
pub fn background(u: f32, v: f32) -> Vec3 {
    let ix = ((u + 1.0) * BACKGROUND_CELLS).floor() as i32;
    let iy = ((v + 1.0) * BACKGROUND_CELLS).floor() as i32;
    if ((ix + iy) & 1) == 0 {
        BACKGROUND_LIGHT
    } else {
        BACKGROUND_DARK
    }
}

/// Pre-clamp color of pixel (x, y) in the internal coordinate system, where
/// y grows upward and (0, 0) is the bottom-left pixel.
pub fn pixel_color(scene: &Scene, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    let u = -1.0 + (2.0 * x as f32) / (width - 1) as f32;
    let v = -1.0 + (2.0 * y as f32) / (height - 1) as f32;
    let direction = (Vec3::new(u, v, 0.0) - CAMERA_ORIGIN).normalize();
    let ray = Ray {
        origin: CAMERA_ORIGIN,
        direction,
    };

    match closest_hit(scene, &ray) {
        Some((index, t)) => {
            let sphere = &scene.spheres[index];
            let point = ray.at(t);
            let normal = (point - sphere.center).normalize();
            let view = (CAMERA_ORIGIN - point).normalize();
            phong_shade(point, normal, view, scene.light_position, sphere.color)
        }
        None => background(u, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_sphere_at(center: Vec3) -> Sphere {
        Sphere {
            center,
            radius: 1.0,
            color: Vec3::splat(0.5),
        }
    }

    fn axis_ray() -> Ray {
        Ray {
            origin: Vec3::new(0.0, 0.0, 2.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    #[test]
    fn hit_point_lies_on_the_sphere_surface() {
        let scene = crate::scene::Scene::stacked(10);
        let ray = axis_ray();
        for sphere in &scene.spheres {
            if let Some(t) = intersect_sphere(sphere, &ray) {
                let p = ray.at(t);
                let distance = (p - sphere.center).length();
                assert!(
                    (distance - sphere.radius).abs() < 1e-4,
                    "|P - center| = {distance}, radius = {}",
                    sphere.radius
                );
            }
        }
    }

    #[test]
    fn front_facing_hit_distance() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, -1.0));
        let t = intersect_sphere(&sphere, &axis_ray()).expect("head-on ray must hit");
        assert!((t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_behind_origin_is_a_miss() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, 6.0));
        assert!(intersect_sphere(&sphere, &axis_ray()).is_none());
    }

    #[test]
    fn ray_starting_inside_a_sphere_is_a_miss() {
        // Near root is behind the origin, and the far root is never taken.
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, 2.0));
        assert!(intersect_sphere(&sphere, &axis_ray()).is_none());
    }

    #[test]
    fn first_sphere_wins_exact_distance_ties() {
        let red = Sphere {
            center: Vec3::new(0.0, 0.0, -1.0),
            radius: 1.0,
            color: Vec3::new(1.0, 0.0, 0.0),
        };
        let blue = Sphere {
            center: Vec3::new(0.0, 0.0, -1.0),
            radius: 1.0,
            color: Vec3::new(0.0, 0.0, 1.0),
        };
        let scene = Scene {
            spheres: vec![red, blue],
            light_position: crate::scene::LIGHT_POSITION,
        };
        let (index, _) = closest_hit(&scene, &axis_ray()).expect("coincident spheres must hit");
        assert_eq!(index, 0);
    }

    #[test]
    fn shading_includes_ambient_when_light_is_behind() {
        // Surface facing away from the light: diffuse and specular both
        // clamp to zero, leaving exactly the ambient term.
        let color = Vec3::new(0.8, 0.4, 0.2);
        let shaded = phong_shade(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -10.0),
            color,
        );
        assert!((shaded.x - 0.08).abs() < 1e-6);
        assert!((shaded.y - 0.04).abs() < 1e-6);
        assert!((shaded.z - 0.02).abs() < 1e-6);
    }

    #[test]
    fn specular_power_matches_thirty_two_squarings() {
        assert_eq!(specular_power(0.0), 0.0);
        assert_eq!(specular_power(1.0), 1.0);
        assert!((specular_power(0.9) - 0.9f32.powi(32)).abs() < 1e-6);
    }

    #[test]
    fn background_center_cell_is_light_gray() {
        // (u, v) = (0, 0) maps to ix = iy = 5, sum 10, even.
        let color = background(0.0, 0.0);
        assert_eq!(color.x, 0.9);
    }

    #[test]
    fn background_alternates_between_adjacent_cells() {
        // Cells span 0.2 in screen space; sample cell centers to stay clear
        // of the float rounding at cell boundaries.
        let a = background(-0.9, -0.9);
        let b = background(-0.7, -0.9);
        assert_eq!(a.x, 0.9);
        assert_eq!(b.x, 0.1);
    }

    #[test]
    fn corner_pixels_map_to_the_screen_corners() {
        let scene = crate::scene::Scene::stacked(2);
        // Bottom-left pixel has (u, v) = (-1, -1): cell (0, 0), light gray,
        // and far enough from the stack that no sphere covers it.
        let color = pixel_color(&scene, 0, 0, 64, 64);
        assert_eq!(color.x, 0.9);
        assert_eq!(color.y, 0.9);
        assert_eq!(color.z, 0.9);
    }
}
