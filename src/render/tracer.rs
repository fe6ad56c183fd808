use crate::{
    foundation::core::{Color, Vec3},
    scene::model::Sphere,
};

/// Hard cap on recursive reflection/refraction bounces. Bounds worst-case
/// per-pixel work on highly reflective or transparent scenes.
pub const MAX_RAY_DEPTH: u32 = 5;

/// Color returned by rays that hit nothing. Over-bright on purpose; it
/// clamps to pure white at quantization.
pub const BACKGROUND: Color = Vec3::new(2.0, 2.0, 2.0);

/// Offset applied along the normal when spawning secondary rays, so they
/// cannot re-hit the surface they start on.
const BIAS: f32 = 1e-4;

/// Index of refraction for all transparent spheres.
const IOR: f32 = 1.1;

fn mix(a: f32, b: f32, amount: f32) -> f32 {
    b * amount + a * (1.0 - amount)
}

/// Computes the color seen along one ray.
///
/// Finds the nearest sphere along `dir` from `origin`; shades it as
/// reflective/refractive (recursing up to [`MAX_RAY_DEPTH`]) or as diffuse
/// lit by every emissive sphere with an unobstructed shadow ray. Rays that
/// hit nothing return [`BACKGROUND`].
pub fn trace(origin: Vec3, dir: Vec3, spheres: &[Sphere], depth: u32) -> Color {
    let mut tnear = f32::INFINITY;
    let mut nearest: Option<&Sphere> = None;
    for sphere in spheres {
        if let Some((t0, t1)) = sphere.intersect(origin, dir) {
            // Near intersection behind the origin: we are inside, the far
            // one is the visible surface.
            let t = if t0 < 0.0 { t1 } else { t0 };
            if t < tnear {
                tnear = t;
                nearest = Some(sphere);
            }
        }
    }
    let Some(sphere) = nearest else {
        return BACKGROUND;
    };

    let phit = origin + dir * tnear;
    let mut nhit = (phit - sphere.center).normalize();
    let mut inside = false;
    if dir.dot(nhit) > 0.0 {
        nhit = -nhit;
        inside = true;
    }

    let mut surface = Vec3::ZERO;
    if (sphere.transparency > 0.0 || sphere.reflection > 0.0) && depth < MAX_RAY_DEPTH {
        let facing_ratio = -dir.dot(nhit);
        let fresnel = mix((1.0 - facing_ratio).powi(3), 1.0, 0.1);

        let refl_dir = (dir - nhit * 2.0 * dir.dot(nhit)).normalize();
        let reflection = trace(phit + nhit * BIAS, refl_dir, spheres, depth + 1);

        let mut refraction = Vec3::ZERO;
        if sphere.transparency > 0.0 {
            let eta = if inside { IOR } else { 1.0 / IOR };
            let cosi = -nhit.dot(dir);
            let k = 1.0 - eta * eta * (1.0 - cosi * cosi);
            // k < 0 is total internal reflection: no transmitted ray.
            if k >= 0.0 {
                let refr_dir = (dir * eta + nhit * (eta * cosi - k.sqrt())).normalize();
                refraction = trace(phit - nhit * BIAS, refr_dir, spheres, depth + 1);
            }
        }

        surface = (reflection * fresnel + refraction * (1.0 - fresnel) * sphere.transparency)
            * sphere.surface_color;
    } else {
        // Diffuse shading: gather every emissive sphere this point can see.
        for (i, light) in spheres.iter().enumerate() {
            if !light.is_light() {
                continue;
            }
            let light_dir = (light.center - phit).normalize();
            let shadow_origin = phit + nhit * BIAS;
            let occluded = spheres
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.intersect(shadow_origin, light_dir).is_some());
            if !occluded {
                surface +=
                    sphere.surface_color * nhit.dot(light_dir).max(0.0) * light.emission_color;
            }
        }
    }

    surface + sphere.emission_color
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diffuse(center: Vec3, radius: f32, color: Vec3) -> Sphere {
        Sphere::new(center, radius, color, Vec3::ZERO, 0.0, 0.0)
    }

    fn light(center: Vec3, emission: Vec3) -> Sphere {
        Sphere::new(center, 0.001, Vec3::ZERO, emission, 0.0, 0.0)
    }

    #[test]
    fn miss_returns_background() {
        let spheres = vec![diffuse(Vec3::new(0.0, 0.0, -20.0), 1.0, Vec3::ONE)];
        let color = trace(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), &spheres, 0);
        assert_eq!(color, BACKGROUND);
    }

    #[test]
    fn empty_scene_returns_background() {
        assert_eq!(trace(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &[], 0), BACKGROUND);
    }

    #[test]
    fn head_on_diffuse_hit_is_lit_by_aligned_light() {
        // Light far along +Z behind the camera: its direction from the hit
        // point coincides with the surface normal, so N.L == 1 exactly.
        let surface_color = Vec3::new(1.0, 0.32, 0.36);
        let emission = Vec3::splat(3.0);
        let spheres = vec![
            diffuse(Vec3::new(0.0, 0.0, -20.0), 1.0, surface_color),
            light(Vec3::new(0.0, 0.0, 30.0), emission),
        ];
        let color = trace(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &spheres, 0);
        assert!((color - surface_color * emission).length() < 1e-3);
    }

    #[test]
    fn occluded_light_contributes_nothing() {
        let spheres = vec![
            diffuse(Vec3::new(0.0, 0.0, -20.0), 1.0, Vec3::ONE),
            // Opaque blocker between the sphere and the light.
            diffuse(Vec3::new(0.0, 5.0, -19.0), 1.0, Vec3::ONE),
            light(Vec3::new(0.0, 10.0, -18.0), Vec3::splat(3.0)),
        ];
        let color = trace(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &spheres, 0);
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn unoccluded_light_scales_with_incidence_angle() {
        let surface_color = Vec3::ONE;
        let emission = Vec3::ONE;
        let spheres = vec![
            diffuse(Vec3::new(0.0, 0.0, -20.0), 1.0, surface_color),
            light(Vec3::new(0.0, 40.0, -19.0), emission),
        ];
        let color = trace(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &spheres, 0);
        // Hit point is (0,0,-19) with normal +Z; the light sits mostly
        // above, so 0 < N.L < 1.
        let n = Vec3::new(0.0, 0.0, 1.0);
        let l = (Vec3::new(0.0, 40.0, -19.0) - Vec3::new(0.0, 0.0, -19.0)).normalize();
        let expected = surface_color * n.dot(l).max(0.0) * emission;
        assert!((color - expected).length() < 1e-3);
        assert!(color.length() > 0.0);
    }

    #[test]
    fn emissive_sphere_renders_as_its_emission() {
        let spheres = vec![Sphere::new(
            Vec3::new(0.0, 0.0, -10.0),
            1.0,
            Vec3::ZERO,
            Vec3::new(3.0, 2.0, 1.0),
            0.0,
            0.0,
        )];
        let color = trace(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &spheres, 0);
        assert_eq!(color, Vec3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn mirror_hall_terminates_with_finite_color() {
        // Two maximally reflective+transparent spheres facing each other
        // would recurse forever without the depth bound.
        let mirror = |z: f32| {
            Sphere::new(
                Vec3::new(0.0, 0.0, z),
                4.0,
                Vec3::ONE,
                Vec3::ZERO,
                1.0,
                1.0,
            )
        };
        let spheres = vec![mirror(-10.0), mirror(10.0)];
        let color = trace(
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(0.0, 0.0, -1.0),
            &spheres,
            0,
        );
        assert!(color.is_finite());
    }

    #[test]
    fn depth_bound_forces_diffuse_shading() {
        let spheres = vec![Sphere::new(
            Vec3::new(0.0, 0.0, -20.0),
            1.0,
            Vec3::ONE,
            Vec3::ZERO,
            1.0,
            0.0,
        )];
        // At the bound the reflective branch is skipped; with no lights the
        // diffuse result is black, not a reflected background.
        let color = trace(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &spheres, MAX_RAY_DEPTH);
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn total_internal_reflection_skips_refraction() {
        // A ray that starts inside a transparent sphere and exits along a
        // near-tangent chord drives the refraction discriminant negative;
        // the transmitted term must be skipped, never sqrt'd.
        let spheres = vec![Sphere::new(
            Vec3::new(0.0, 0.0, -10.0),
            2.0,
            Vec3::ONE,
            Vec3::ZERO,
            0.0,
            1.0,
        )];
        let origin = Vec3::new(0.0, 1.9, -10.0);
        let dir = Vec3::new(1.0, -0.1, 0.0).normalize();
        let color = trace(origin, dir, &spheres, 0);
        assert!(color.is_finite());
    }
}
