use crate::camera::Camera;
use crate::geometry::{CullMode, Plane, Sphere, Triangle};
use crate::material::Material;
use crate::math::{ColorRGB, Point3, Vec3, TO_RADIANS};
use crate::mesh::TriangleMesh;
use crate::scene::{Light, Scene};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A built scene plus the name shown in the banner.
pub struct BuiltScene {
    pub name: &'static str,
    pub scene: Scene,
}

/// Available built-in scene presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ScenePreset {
    /// The material showcase room: metal and plastic sphere rows, cull-mode
    /// demo triangles, three tinted point lights.
    Reference,
    /// A rotated, scaled cube mesh under mixed lighting.
    Cube,
    /// Two triangle clusters far apart on X — the classic skewed case a
    /// surface-area-heuristic split handles well.
    Clusters,
    /// A seeded-random soup of 1000 triangles to stress the BVH.
    Stress,
}

impl ScenePreset {
    pub fn build(self) -> BuiltScene {
        match self {
            ScenePreset::Reference => build_reference(),
            ScenePreset::Cube => build_cube(),
            ScenePreset::Clusters => build_clusters(),
            ScenePreset::Stress => build_stress(),
        }
    }
}

fn build_reference() -> BuiltScene {
    let mut scene = Scene::new(Camera::new(Point3::new(0.0, 3.0, -9.0), 45.0));

    let gray_blue = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::new(0.49, 0.57, 0.57),
    });
    let white = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::WHITE,
    });

    let silver = ColorRGB::new(0.972, 0.960, 0.915);
    let rough_metal = scene.add_material(Material::CookTorrance {
        albedo: silver,
        metalness: 1.0,
        roughness: 1.0,
    });
    let medium_metal = scene.add_material(Material::CookTorrance {
        albedo: silver,
        metalness: 1.0,
        roughness: 0.6,
    });
    let smooth_metal = scene.add_material(Material::CookTorrance {
        albedo: silver,
        metalness: 1.0,
        roughness: 0.1,
    });
    let plastic = ColorRGB::new(0.75, 0.75, 0.75);
    let rough_plastic = scene.add_material(Material::CookTorrance {
        albedo: plastic,
        metalness: 0.0,
        roughness: 1.0,
    });
    let medium_plastic = scene.add_material(Material::CookTorrance {
        albedo: plastic,
        metalness: 0.0,
        roughness: 0.6,
    });
    let smooth_plastic = scene.add_material(Material::CookTorrance {
        albedo: plastic,
        metalness: 0.0,
        roughness: 0.1,
    });

    // The room.
    scene.add_plane(Plane::new(Point3::new(0.0, 0.0, 0.0), Vec3::unit_y(), gray_blue));
    scene.add_plane(Plane::new(
        Point3::new(0.0, 0.0, 10.0),
        Vec3::new(0.0, 0.0, -1.0),
        gray_blue,
    ));
    scene.add_plane(Plane::new(
        Point3::new(0.0, 10.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        gray_blue,
    ));
    scene.add_plane(Plane::new(
        Point3::new(5.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        gray_blue,
    ));
    scene.add_plane(Plane::new(
        Point3::new(-5.0, 0.0, 0.0),
        Vec3::unit_x(),
        gray_blue,
    ));

    // Bottom row: metals, roughest to smoothest. Top row: plastics.
    scene.add_sphere(Sphere::new(Point3::new(-1.75, 1.0, 0.0), 0.75, rough_metal));
    scene.add_sphere(Sphere::new(Point3::new(0.0, 1.0, 0.0), 0.75, medium_metal));
    scene.add_sphere(Sphere::new(Point3::new(1.75, 1.0, 0.0), 0.75, smooth_metal));
    scene.add_sphere(Sphere::new(Point3::new(-1.75, 3.0, 0.0), 0.75, rough_plastic));
    scene.add_sphere(Sphere::new(Point3::new(0.0, 3.0, 0.0), 0.75, medium_plastic));
    scene.add_sphere(Sphere::new(Point3::new(1.75, 3.0, 0.0), 0.75, smooth_plastic));

    // Cull-mode demo triangles along the back: front-culled, back-culled,
    // and uncullable.
    for (offset_x, cull_mode) in [
        (-1.75, CullMode::Front),
        (0.0, CullMode::Back),
        (1.75, CullMode::None),
    ] {
        let mut mesh = TriangleMesh::new(Vec::new(), Vec::new(), cull_mode, white)
            .expect("empty mesh is always valid");
        // Wound so the face normal points at the camera (-z).
        mesh.append_triangle(
            &Triangle::new(
                Point3::new(offset_x - 0.75, 4.5, 3.0),
                Point3::new(offset_x, 6.0, 3.0),
                Point3::new(offset_x + 0.75, 4.5, 3.0),
                cull_mode,
                white,
            ),
            false,
        );
        scene.add_mesh(mesh);
    }

    scene.add_light(Light::point(
        Point3::new(0.0, 5.0, 5.0),
        ColorRGB::new(1.0, 0.61, 0.45),
        50.0,
    ));
    scene.add_light(Light::point(
        Point3::new(-2.5, 5.0, -5.0),
        ColorRGB::new(1.0, 0.8, 0.45),
        70.0,
    ));
    scene.add_light(Light::point(
        Point3::new(2.5, 2.5, -5.0),
        ColorRGB::new(0.34, 0.47, 0.68),
        50.0,
    ));

    BuiltScene { name: "Reference Room", scene }
}

/// Unit-cube geometry with outward winding: 8 corners, 12 triangles.
fn cube_geometry() -> (Vec<Point3>, Vec<u32>) {
    let positions = vec![
        Point3::new(-1.0, -1.0, -1.0),
        Point3::new(1.0, -1.0, -1.0),
        Point3::new(1.0, 1.0, -1.0),
        Point3::new(-1.0, 1.0, -1.0),
        Point3::new(-1.0, -1.0, 1.0),
        Point3::new(1.0, -1.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(-1.0, 1.0, 1.0),
    ];
    let indices = vec![
        0, 3, 2, 0, 2, 1, // front
        4, 5, 6, 4, 6, 7, // back
        0, 4, 7, 0, 7, 3, // left
        1, 2, 6, 1, 6, 5, // right
        0, 1, 5, 0, 5, 4, // bottom
        3, 7, 6, 3, 6, 2, // top
    ];
    (positions, indices)
}

fn build_cube() -> BuiltScene {
    let mut scene = Scene::new(Camera::new(Point3::new(0.0, 1.5, -6.0), 60.0));

    let floor = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::new(0.57, 0.57, 0.57),
    });
    let shell = scene.add_material(Material::CookTorrance {
        albedo: ColorRGB::new(0.9, 0.4, 0.2),
        metalness: 0.0,
        roughness: 0.35,
    });

    scene.add_plane(Plane::new(Point3::new(0.0, -1.5, 0.0), Vec3::unit_y(), floor));

    let (positions, indices) = cube_geometry();
    let mut cube = TriangleMesh::new(positions, indices, CullMode::Back, shell)
        .expect("cube geometry is well-formed");
    cube.translate(Vec3::new(0.0, 0.5, 0.0));
    cube.rotate_y(35.0 * TO_RADIANS);
    cube.scale(Vec3::new(1.0, 1.2, 1.0));
    cube.update_transforms();
    scene.add_mesh(cube);

    scene.add_light(Light::directional(
        Vec3::new(0.3, -1.0, 0.5),
        ColorRGB::WHITE,
        2.0,
    ));
    scene.add_light(Light::point(
        Point3::new(-3.0, 4.0, -3.0),
        ColorRGB::new(1.0, 0.85, 0.6),
        25.0,
    ));

    BuiltScene { name: "Spinning Cube", scene }
}

fn build_clusters() -> BuiltScene {
    let mut scene = Scene::new(Camera::new(Point3::new(5.0, 1.5, -14.0), 55.0));

    let ground = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::new(0.5, 0.55, 0.5),
    });
    let shards = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::new(0.85, 0.75, 0.35),
    });

    scene.add_plane(Plane::new(Point3::new(0.0, -1.0, 0.0), Vec3::unit_y(), ground));

    // Two tight shard clusters, one at x = 0 and one at x = 10.
    let mut rng = SmallRng::seed_from_u64(21);
    let mut mesh = TriangleMesh::new(Vec::new(), Vec::new(), CullMode::None, shards)
        .expect("empty mesh is always valid");
    for cluster_x in [0.0f32, 10.0] {
        for _ in 0..10 {
            let base = Point3::new(
                cluster_x + rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..1.5),
                rng.gen_range(-0.5..0.5),
            );
            mesh.append_triangle(
                &Triangle::new(
                    base,
                    base + Vec3::new(rng.gen_range(0.3..0.9), 0.0, rng.gen_range(-0.2..0.2)),
                    base + Vec3::new(0.0, rng.gen_range(0.3..0.9), rng.gen_range(-0.2..0.2)),
                    CullMode::None,
                    shards,
                ),
                true,
            );
        }
    }
    mesh.update_transforms();
    scene.add_mesh(mesh);

    scene.add_light(Light::point(
        Point3::new(5.0, 8.0, -4.0),
        ColorRGB::WHITE,
        120.0,
    ));

    BuiltScene { name: "Skewed Clusters", scene }
}

fn build_stress() -> BuiltScene {
    let mut scene = Scene::new(Camera::new(Point3::new(0.0, 0.0, -26.0), 60.0));

    let shard = scene.add_material(Material::Lambert {
        diffuse_reflectance: 1.0,
        diffuse_color: ColorRGB::new(0.7, 0.7, 0.75),
    });

    // One mesh, 1000 triangles. The seed is fixed so every run renders the
    // same frame.
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut mesh = TriangleMesh::new(Vec::new(), Vec::new(), CullMode::None, shard)
        .expect("empty mesh is always valid");
    for _ in 0..1000 {
        let center = Point3::new(
            rng.gen_range(-9.0..9.0),
            rng.gen_range(-6.0..6.0),
            rng.gen_range(-6.0..6.0),
        );
        mesh.append_triangle(
            &Triangle::new(
                center + random_offset(&mut rng),
                center + random_offset(&mut rng),
                center + random_offset(&mut rng),
                CullMode::None,
                shard,
            ),
            true,
        );
    }
    mesh.update_transforms();
    scene.add_mesh(mesh);

    scene.add_light(Light::directional(
        Vec3::new(0.2, -0.6, 1.0),
        ColorRGB::WHITE,
        3.0,
    ));

    BuiltScene { name: "Stress Soup (1000 triangles)", scene }
}

fn random_offset(rng: &mut SmallRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-0.6..0.6),
        rng.gen_range(-0.6..0.6),
        rng.gen_range(-0.6..0.6),
    )
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_builds_and_lights_its_scene() {
        for preset in [
            ScenePreset::Reference,
            ScenePreset::Cube,
            ScenePreset::Clusters,
            ScenePreset::Stress,
        ] {
            let built = preset.build();
            assert!(!built.scene.lights().is_empty(), "{} has no lights", built.name);
            assert!(!built.scene.materials().is_empty());
        }
    }

    #[test]
    fn material_ids_stay_in_range() {
        for preset in [ScenePreset::Reference, ScenePreset::Cube, ScenePreset::Stress] {
            let built = preset.build();
            let count = built.scene.materials().len();
            for mesh in built.scene.meshes() {
                assert!(mesh.material_id < count);
            }
        }
    }

    #[test]
    fn stress_preset_is_deterministic() {
        let a = ScenePreset::Stress.build();
        let b = ScenePreset::Stress.build();
        let ma = &a.scene.meshes()[0];
        let mb = &b.scene.meshes()[0];
        assert_eq!(ma.positions, mb.positions);
        assert_eq!(ma.indices, mb.indices);
    }
}
