//! prism-cli — the terminal host: CLI flags, scene selection, banner and
//! stats on stderr, frame presentation on stdout.

use clap::Parser;
use prism_cli::camera::Camera;
use prism_cli::display::{display_framebuffer, DisplayMode};
use prism_cli::geometry::{CullMode, Plane};
use prism_cli::loader::{self, LoadError};
use prism_cli::material::Material;
use prism_cli::math::{ColorRGB, Point3, Vec3, TO_RADIANS};
use prism_cli::mesh::TriangleMesh;
use prism_cli::presets::{BuiltScene, ScenePreset};
use prism_cli::renderer::{Framebuffer, RenderConfig, Renderer, ShadingMode};
use prism_cli::scene::{Light, Scene};
use tracing_subscriber::EnvFilter;

/// prism-cli — ray-trace 3D scenes in your terminal
#[derive(Parser, Debug)]
#[command(
    name = "prism-cli",
    version,
    about = "A terminal Whitted ray tracer written in Rust 🦀",
    long_about = "Renders 3D scenes directly in your terminal with a \
                  deterministic Whitted-style ray tracer: SAH-binned BVH \
                  meshes, physically based materials, hard shadows, and \
                  pixel-parallel dispatch.",
    after_help = "EXAMPLES:\n  \
                  prism-cli --scene reference\n  \
                  prism-cli --scene cube --mode observed-area --display braille\n  \
                  prism-cli --obj bunny.obj --width 240 --height 120\n  \
                  prism-cli --scene stress --no-shadows --save frame.ppm"
)]
struct Cli {
    /// Scene preset to render
    #[arg(short, long, value_enum, default_value_t = ScenePreset::Reference)]
    scene: ScenePreset,

    /// Render an OBJ file instead of a preset
    #[arg(long, value_name = "PATH", conflicts_with = "scene")]
    obj: Option<String>,

    /// Framebuffer width in pixels
    #[arg(short = 'W', long, default_value_t = 160)]
    width: u32,

    /// Framebuffer height in pixels
    #[arg(short = 'H', long, default_value_t = 90)]
    height: u32,

    /// Lighting mode
    #[arg(short, long, value_enum, default_value_t = CliShadingMode::Combined)]
    mode: CliShadingMode,

    /// Disable hard shadows
    #[arg(long)]
    no_shadows: bool,

    /// Terminal output encoding
    #[arg(short, long, value_enum, default_value_t = CliDisplayMode::Halfblock)]
    display: CliDisplayMode,

    /// Camera field of view in degrees
    #[arg(long)]
    fov: Option<f32>,

    /// Camera yaw in degrees
    #[arg(long)]
    yaw: Option<f32>,

    /// Camera pitch in degrees
    #[arg(long)]
    pitch: Option<f32>,

    /// Worker thread count (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Save the frame as a binary PPM snapshot
    #[arg(long, value_name = "PATH")]
    save: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliShadingMode {
    /// Lambert cosine only, as grayscale
    ObservedArea,
    /// Incident radiance only
    Radiance,
    /// Material BRDF only
    Brdf,
    /// Radiance × BRDF × cosine
    Combined,
}

impl From<CliShadingMode> for ShadingMode {
    fn from(m: CliShadingMode) -> Self {
        match m {
            CliShadingMode::ObservedArea => ShadingMode::ObservedArea,
            CliShadingMode::Radiance => ShadingMode::Radiance,
            CliShadingMode::Brdf => ShadingMode::Brdf,
            CliShadingMode::Combined => ShadingMode::Combined,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliDisplayMode {
    /// Half-block characters (▀) — 2 vertical pixels per cell
    Halfblock,
    /// Full-block characters with 24-bit true color
    Truecolor,
    /// ASCII grayscale density ramp
    Ascii,
    /// Unicode braille patterns — 2×4 subpixel resolution
    Braille,
}

impl From<CliDisplayMode> for DisplayMode {
    fn from(m: CliDisplayMode) -> Self {
        match m {
            CliDisplayMode::Halfblock => DisplayMode::HalfBlock,
            CliDisplayMode::Truecolor => DisplayMode::TrueColor,
            CliDisplayMode::Ascii => DisplayMode::Ascii,
            CliDisplayMode::Braille => DisplayMode::Braille,
        }
    }
}

/// Wraps a loaded OBJ in a simple lit scene.
fn build_obj_scene(path: &str) -> Result<BuiltScene, LoadError> {
    let data = loader::load_obj(path)?;

    let mut scene = Scene::new(Camera::new(Point3::new(0.0, 1.0, -4.0), 60.0));
    let floor = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::new(0.55, 0.55, 0.55),
    });
    let body = scene.add_material(Material::CookTorrance {
        albedo: ColorRGB::new(0.7, 0.7, 0.75),
        metalness: 0.0,
        roughness: 0.4,
    });

    scene.add_plane(Plane::new(
        Point3::new(0.0, -1.0, 0.0),
        Vec3::unit_y(),
        floor,
    ));
    match TriangleMesh::with_normals(data.positions, data.indices, data.normals, CullMode::Back, body)
    {
        Ok(mesh) => scene.add_mesh(mesh),
        Err(err) => {
            // Input violation: report and skip the mesh, keep the scene.
            eprintln!("  skipping invalid mesh from {path}: {err}");
        }
    }

    scene.add_light(Light::directional(
        Vec3::new(0.4, -1.0, 0.6),
        ColorRGB::WHITE,
        2.5,
    ));
    scene.add_light(Light::point(
        Point3::new(-3.0, 5.0, -4.0),
        ColorRGB::new(1.0, 0.9, 0.7),
        40.0,
    ));

    Ok(BuiltScene { name: "OBJ Viewer", scene })
}

fn print_header(scene_name: &str, config: &RenderConfig, display: DisplayMode, fov: f32) {
    let mode_name = match config.mode {
        ShadingMode::ObservedArea => "Observed Area",
        ShadingMode::Radiance => "Radiance",
        ShadingMode::Brdf => "BRDF",
        ShadingMode::Combined => "Combined",
    };
    let display_name = match display {
        DisplayMode::HalfBlock => "HalfBlock (2× vertical)",
        DisplayMode::TrueColor => "TrueColor (24-bit)",
        DisplayMode::Ascii => "ASCII grayscale",
        DisplayMode::Braille => "Braille (2×4 subpixel)",
    };
    eprintln!();
    eprintln!("  ╔═══════════════════════════════════════════════╗");
    eprintln!("  ║  prism-cli ✦  Terminal Ray Tracer             ║");
    eprintln!("  ╚═══════════════════════════════════════════════╝");
    eprintln!();
    eprintln!("  Scene:    {scene_name}");
    eprintln!("  Size:     {}×{} ({display_name})", config.width, config.height);
    eprintln!("  Lighting: {mode_name}, shadows {}", if config.shadows { "on" } else { "off" });
    eprintln!("  FOV:      {fov:.1}°");
    eprintln!();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("  could not size the worker pool: {err}");
        }
    }

    let built = match &cli.obj {
        Some(path) => match build_obj_scene(path) {
            Ok(built) => built,
            Err(err) => {
                eprintln!("  {err}");
                std::process::exit(1);
            }
        },
        None => cli.scene.build(),
    };
    let BuiltScene { name, mut scene } = built;

    if let Some(fov) = cli.fov {
        scene.camera.set_fov(fov);
    }
    if let Some(yaw) = cli.yaw {
        scene.camera.total_yaw = yaw * TO_RADIANS;
    }
    if let Some(pitch) = cli.pitch {
        scene.camera.total_pitch = pitch * TO_RADIANS;
    }

    let config = RenderConfig {
        width: cli.width,
        height: cli.height,
        mode: cli.mode.into(),
        shadows: !cli.no_shadows,
    };
    print_header(name, &config, cli.display.into(), scene.camera.fov_degrees());

    let renderer = Renderer { scene: &scene, config: &config };
    let mut framebuffer = Framebuffer::new(config.width, config.height);
    let stats = renderer.render(&mut framebuffer);

    display_framebuffer(&framebuffer, cli.display.into());

    eprintln!();
    stats.print_summary();

    if let Some(path) = &cli.save {
        match framebuffer.write_ppm(path) {
            Ok(()) => eprintln!("  Snapshot: {path}"),
            Err(err) => eprintln!("  Snapshot failed: {err}"),
        }
    }
}
