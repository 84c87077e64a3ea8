#[cfg(test)]
use crate::camera::Camera;
use crate::geometry::{HitRecord, Ray, T_MIN};
use crate::math::{ColorRGB, Vec3};
use crate::scene::{LightKind, Scene};
use rayon::prelude::*;
use std::io::{self, Write};
use std::time::Instant;
use tracing::info;

// ─── Render configuration ───────────────────────────────────────────────────

/// What each light contributes per shaded point. `Combined` is the full
/// pipeline; the other three isolate one factor for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    /// Lambert's cosine only, as a gray value.
    ObservedArea,
    /// Incident radiance only.
    Radiance,
    /// The material's BRDF response only.
    Brdf,
    /// `radiance · brdf · cos`.
    Combined,
}

impl ShadingMode {
    /// The next mode in the host's cycle order.
    pub fn cycled(self) -> Self {
        match self {
            ShadingMode::ObservedArea => ShadingMode::Radiance,
            ShadingMode::Radiance => ShadingMode::Brdf,
            ShadingMode::Brdf => ShadingMode::Combined,
            ShadingMode::Combined => ShadingMode::ObservedArea,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub mode: ShadingMode,
    pub shadows: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            mode: ShadingMode::Combined,
            shadows: true,
        }
    }
}

// ─── Framebuffer ────────────────────────────────────────────────────────────

/// A grid of 32-bit pixels. The default packing is `0x00RRGGBB`; hosts with
/// their own surface format hand [`Renderer::render_with`] a different
/// `map_rgb` and keep the buffer to themselves.
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
        }
    }

    /// The default `map_rgb`: packs into `0x00RRGGBB`.
    #[inline(always)]
    pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    /// Unpacks a pixel stored with [`Framebuffer::pack_rgb`].
    #[inline(always)]
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let p = self.pixels[(y * self.width + x) as usize];
        ((p >> 16) as u8, (p >> 8) as u8, p as u8)
    }

    /// Snapshot as a binary PPM (P6): RGB triplets, one byte per channel.
    pub fn write_ppm(&self, path: &str) -> io::Result<()> {
        let mut file = io::BufWriter::new(std::fs::File::create(path)?);
        write!(file, "P6\n{} {}\n255\n", self.width, self.height)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let (r, g, b) = self.rgb_at(x, y);
                file.write_all(&[r, g, b])?;
            }
        }
        file.flush()
    }
}

// ─── Render statistics ──────────────────────────────────────────────────────

/// Timing summary for one frame, printed to stderr by the CLI host.
pub struct RenderStats {
    pub width: u32,
    pub height: u32,
    pub primary_rays: u64,
    pub elapsed_secs: f64,
}

impl RenderStats {
    pub fn mrays_per_sec(&self) -> f64 {
        self.primary_rays as f64 / self.elapsed_secs / 1e6
    }

    pub fn print_summary(&self) {
        let fill = "━".repeat(30);
        eprintln!("  {fill}");
        eprintln!("  Time:     {:.3}s", self.elapsed_secs);
        eprintln!("  Rays:     {:.2}M primary", self.primary_rays as f64 / 1e6);
        eprintln!("  Speed:    {:.2} Mrays/s", self.mrays_per_sec());
        eprintln!("  Image:    {}×{}", self.width, self.height);
        eprintln!("  {fill}");
    }
}

// ─── Renderer ───────────────────────────────────────────────────────────────

/// The frame dispatcher: maps every pixel index to a primary ray, shades the
/// closest hit, and writes exactly one framebuffer cell per pixel.
///
/// Rows are dealt to rayon workers as disjoint mutable slices, so no cell is
/// ever written by two workers and no synchronization is needed. Each pixel
/// is a pure function of the scene and its own index, which makes the frame
/// byte-identical across runs and across thread counts.
pub struct Renderer<'a> {
    pub scene: &'a Scene,
    pub config: &'a RenderConfig,
}

impl<'a> Renderer<'a> {
    /// Renders into an owned framebuffer with the default pixel packing.
    pub fn render(&self, fb: &mut Framebuffer) -> RenderStats {
        let (width, height) = (fb.width, fb.height);
        self.render_with(&mut fb.pixels, width, height, Framebuffer::pack_rgb)
    }

    /// Renders into any host-owned pixel grid. `map_rgb` converts quantized
    /// channels into the host surface's 32-bit format.
    pub fn render_with<F>(
        &self,
        pixels: &mut [u32],
        width: u32,
        height: u32,
        map_rgb: F,
    ) -> RenderStats
    where
        F: Fn(u8, u8, u8) -> u32 + Sync,
    {
        assert_eq!(pixels.len(), (width * height) as usize);
        if pixels.is_empty() {
            return RenderStats {
                width,
                height,
                primary_rays: 0,
                elapsed_secs: 0.0,
            };
        }

        // One camera snapshot per frame; pose edits made after this point
        // land in the next frame.
        let mut camera = self.scene.camera;
        camera.update_view();

        let aspect = width as f32 / height as f32;
        let fov_scale = camera.fov_scale();
        let t0 = Instant::now();

        pixels
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(py, row)| {
                let cy = (1.0 - (2.0 * (py as f32 + 0.5)) / height as f32) * fov_scale;
                for (px, cell) in row.iter_mut().enumerate() {
                    let cx =
                        ((2.0 * (px as f32 + 0.5)) / width as f32 - 1.0) * aspect * fov_scale;
                    let direction = camera
                        .camera_to_world
                        .transform_vector(Vec3::new(cx, cy, 1.0));
                    let ray = Ray::new(camera.origin, direction);

                    let color = self.trace(&ray).max_to_one();
                    let (r, g, b) = color.to_rgb8();
                    *cell = map_rgb(r, g, b);
                }
            });

        let elapsed = t0.elapsed().as_secs_f64();
        info!(width, height, elapsed_secs = elapsed, "frame rendered");

        RenderStats {
            width,
            height,
            primary_rays: u64::from(width) * u64::from(height),
            elapsed_secs: elapsed,
        }
    }

    /// Shades one primary ray: closest hit, then the per-light loop with
    /// optional shadow queries. Misses stay black.
    fn trace(&self, ray: &Ray) -> ColorRGB {
        let mut rec = HitRecord::default();
        if !self.scene.closest_hit(ray, &mut rec) {
            return ColorRGB::BLACK;
        }

        // Kernels may leave the normal unnormalized (spheres do).
        rec.normal.normalize();
        let Some(material) = self.scene.materials().get(rec.material_id) else {
            return ColorRGB::BLACK;
        };

        let view = -ray.direction;
        let shadow_origin = rec.origin + rec.normal * T_MIN;
        let mut color = ColorRGB::BLACK;

        for light in self.scene.lights() {
            let mut to_light = light.direction_to(shadow_origin);
            let mut distance = to_light.normalize();
            if light.kind == LightKind::Directional {
                distance = f32::INFINITY;
            }

            if self.config.shadows {
                let shadow_ray = Ray::with_max(shadow_origin, to_light, distance);
                if self.scene.does_hit(&shadow_ray) {
                    continue;
                }
            }

            let observed_area = rec.normal.dot(to_light);
            match self.config.mode {
                ShadingMode::ObservedArea => {
                    if observed_area > 0.0 {
                        color += ColorRGB::gray(observed_area);
                    }
                }
                ShadingMode::Radiance => {
                    color += light.radiance(rec.origin);
                }
                ShadingMode::Brdf => {
                    color += material.shade(&rec, to_light, view);
                }
                ShadingMode::Combined => {
                    if observed_area > 0.0 {
                        color += light.radiance(rec.origin)
                            * material.shade(&rec, to_light, view)
                            * observed_area;
                    }
                }
            }
        }

        color
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
