use crate::geometry::HitRecord;
use crate::math::{ColorRGB, Vec3};

/// The BRDF building blocks. Free functions so the material dispatcher below
/// stays a thin match over them.
pub mod brdf {
    use super::*;
    use std::f32::consts::PI;

    /// Lambert diffuse: `kd · cd / π`.
    #[inline]
    pub fn lambert(kd: f32, cd: ColorRGB) -> ColorRGB {
        cd * (kd / PI)
    }

    /// Lambert diffuse with a per-channel reflectance coefficient.
    #[inline]
    pub fn lambert_rgb(kd: ColorRGB, cd: ColorRGB) -> ColorRGB {
        cd * kd * (1.0 / PI)
    }

    /// Phong specular lobe: `ks · max(0, r·v)^exp` where `r` is the light
    /// direction mirrored about the normal.
    #[inline]
    pub fn phong(ks: f32, exponent: f32, l: Vec3, v: Vec3, n: Vec3) -> ColorRGB {
        let reflected = l.reflect(n);
        let cos_alpha = reflected.dot(v);
        if cos_alpha <= 0.0 {
            return ColorRGB::BLACK;
        }
        ColorRGB::WHITE * (ks * cos_alpha.powf(exponent))
    }

    /// Schlick's Fresnel approximation with half-vector `h` and base
    /// reflectivity `f0`.
    #[inline]
    pub fn fresnel_schlick(h: Vec3, v: Vec3, f0: ColorRGB) -> ColorRGB {
        let one_minus = (1.0 - h.dot(v)).max(0.0);
        f0 + (ColorRGB::WHITE - f0) * one_minus.powi(5)
    }

    /// Trowbridge-Reitz GGX normal distribution with UE4's squared
    /// roughness parameterization.
    #[inline]
    pub fn normal_distribution_ggx(n: Vec3, h: Vec3, roughness: f32) -> f32 {
        let alpha = roughness * roughness;
        let alpha_sq = alpha * alpha;
        let n_dot_h = n.dot(h);
        let denom = n_dot_h * n_dot_h * (alpha_sq - 1.0) + 1.0;
        alpha_sq / (PI * denom * denom)
    }

    /// Schlick-GGX geometry term for one direction (direct-lighting `k`).
    #[inline]
    pub fn geometry_schlick_ggx(n: Vec3, v: Vec3, roughness: f32) -> f32 {
        let alpha = roughness * roughness;
        let k = (alpha + 1.0) * (alpha + 1.0) / 8.0;
        let n_dot_v = n.dot(v);
        n_dot_v / (n_dot_v * (1.0 - k) + k)
    }

    /// Smith's shadowing-masking: the Schlick-GGX term for the view and
    /// light directions multiplied together.
    #[inline]
    pub fn geometry_smith(n: Vec3, v: Vec3, l: Vec3, roughness: f32) -> f32 {
        geometry_schlick_ggx(n, v, roughness) * geometry_schlick_ggx(n, l, roughness)
    }
}

// ─── Material ───────────────────────────────────────────────────────────────

/// Surface response as a tagged variant instead of a trait object: the
/// shading loop dispatches through one match and the scene stores materials
/// in a flat `Vec` addressed by id.
#[derive(Debug, Clone, Copy)]
pub enum Material {
    /// Flat debug color, ignores lighting directions.
    SolidColor { color: ColorRGB },
    /// Lambert diffuse.
    Lambert {
        diffuse_reflectance: f32,
        diffuse_color: ColorRGB,
    },
    /// Lambert diffuse plus a Phong specular lobe.
    LambertPhong {
        diffuse_reflectance: f32,
        specular_reflectance: f32,
        phong_exponent: f32,
        diffuse_color: ColorRGB,
    },
    /// Cook-Torrance microfacet model: Schlick Fresnel, GGX distribution,
    /// Smith geometry. `metalness` is binary in practice (0 dielectric,
    /// 1 conductor).
    CookTorrance {
        albedo: ColorRGB,
        metalness: f32,
        roughness: f32,
    },
}

/// Base reflectivity of dielectrics: a representative 4% at normal incidence.
const DIELECTRIC_F0: ColorRGB = ColorRGB::new(0.04, 0.04, 0.04);

impl Material {
    /// Evaluates the BRDF for a light direction `l` and view direction `v`
    /// at the given hit. Both directions are unit length and point away from
    /// the surface.
    pub fn shade(&self, hit: &HitRecord, l: Vec3, v: Vec3) -> ColorRGB {
        match *self {
            Material::SolidColor { color } => color,
            Material::Lambert {
                diffuse_reflectance,
                diffuse_color,
            } => brdf::lambert(diffuse_reflectance, diffuse_color),
            Material::LambertPhong {
                diffuse_reflectance,
                specular_reflectance,
                phong_exponent,
                diffuse_color,
            } => {
                // The Phong lobe wants the incident direction; `l` points
                // toward the light.
                brdf::lambert(diffuse_reflectance, diffuse_color)
                    + brdf::phong(specular_reflectance, phong_exponent, -l, v, hit.normal)
            }
            Material::CookTorrance {
                albedo,
                metalness,
                roughness,
            } => {
                let n = hit.normal;
                let h = (v + l).normalized();

                let f0 = if metalness == 0.0 { DIELECTRIC_F0 } else { albedo };
                let fresnel = brdf::fresnel_schlick(h, v, f0);
                let distribution = brdf::normal_distribution_ggx(n, h, roughness);
                let geometry = brdf::geometry_smith(n, v, l, roughness);

                let denominator = 4.0 * v.dot(n) * l.dot(n);
                let specular = if denominator > 0.0 {
                    fresnel * (distribution * geometry / denominator)
                } else {
                    ColorRGB::BLACK
                };

                // Conductors have no diffuse lobe; dielectrics diffuse the
                // energy Fresnel did not reflect.
                let kd = if metalness == 0.0 {
                    ColorRGB::WHITE - fresnel
                } else {
                    ColorRGB::BLACK
                };
                brdf::lambert_rgb(kd, albedo) + specular
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use std::f32::consts::PI;

    fn hit_with_normal(n: Vec3) -> HitRecord {
        HitRecord {
            t: 1.0,
            origin: Point3::zero(),
            normal: n,
            material_id: 0,
            did_hit: true,
        }
    }

    #[test]
    fn lambert_divides_by_pi() {
        let c = brdf::lambert(1.0, ColorRGB::new(1.0, 0.5, 0.25));
        assert!((c.r - 1.0 / PI).abs() < 1e-6);
        assert!((c.g - 0.5 / PI).abs() < 1e-6);
    }

    #[test]
    fn phong_is_black_off_the_lobe() {
        let n = Vec3::unit_y();
        // Incident light straight down reflects straight up; a sideways view
        // direction sits at 90° from the lobe.
        let incident = Vec3::new(0.0, -1.0, 0.0);
        let v = Vec3::unit_x();
        assert_eq!(brdf::phong(1.0, 60.0, incident, v, n), ColorRGB::BLACK);
    }

    #[test]
    fn phong_peaks_along_the_mirror_direction() {
        let n = Vec3::unit_y();
        let l = Vec3::new(-1.0, 1.0, 0.0).normalized();
        // l reflected about n continues to (-1,-1,0); the brightest view
        // direction is its negation.
        let v = Vec3::new(1.0, 1.0, 0.0).normalized();
        let peak = brdf::phong(1.0, 32.0, -l, v, n);
        assert!(peak.r > 0.9, "expected a near-unit peak, got {}", peak.r);
    }

    #[test]
    fn schlick_returns_f0_at_normal_incidence() {
        let f0 = ColorRGB::new(0.04, 0.04, 0.04);
        let v = Vec3::unit_y();
        let f = brdf::fresnel_schlick(v, v, f0);
        assert!((f.r - 0.04).abs() < 1e-6);
    }

    #[test]
    fn schlick_approaches_one_at_grazing_angles() {
        let f0 = ColorRGB::new(0.04, 0.04, 0.04);
        let h = Vec3::unit_y();
        let v = Vec3::new(1.0, 1e-3, 0.0).normalized();
        let f = brdf::fresnel_schlick(h, v, f0);
        assert!(f.r > 0.9, "grazing Fresnel should approach 1, got {}", f.r);
    }

    #[test]
    fn solid_color_ignores_directions() {
        let mat = Material::SolidColor { color: ColorRGB::new(0.2, 0.4, 0.6) };
        let hit = hit_with_normal(Vec3::unit_y());
        let c = mat.shade(&hit, Vec3::unit_y(), Vec3::unit_y());
        assert_eq!(c, ColorRGB::new(0.2, 0.4, 0.6));
    }

    #[test]
    fn cook_torrance_metal_has_no_diffuse_floor() {
        let metal = Material::CookTorrance {
            albedo: ColorRGB::new(0.95, 0.64, 0.54),
            metalness: 1.0,
            roughness: 0.1,
        };
        let hit = hit_with_normal(Vec3::unit_y());
        // View far off the mirror lobe: the specular term is tiny and a
        // metal has no diffuse term to fill in.
        let l = Vec3::new(0.9, 0.4, 0.0).normalized();
        let v = Vec3::unit_y();
        let c = metal.shade(&hit, l, v);
        let dielectric = Material::CookTorrance {
            albedo: ColorRGB::new(0.95, 0.64, 0.54),
            metalness: 0.0,
            roughness: 0.1,
        };
        let d = dielectric.shade(&hit, l, v);
        assert!(c.r < d.r, "metal should lack the diffuse contribution");
    }

    #[test]
    fn cook_torrance_survives_grazing_denominators() {
        let mat = Material::CookTorrance {
            albedo: ColorRGB::new(0.5, 0.5, 0.5),
            metalness: 0.0,
            roughness: 0.4,
        };
        let hit = hit_with_normal(Vec3::unit_y());
        let l = Vec3::new(1.0, 0.0, 0.0);
        let v = Vec3::new(-1.0, 0.0, 0.0);
        let c = mat.shade(&hit, l, v);
        assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
    }
}
