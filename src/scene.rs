use crate::camera::Camera;
use crate::geometry::{HitRecord, Plane, Ray, Sphere};
use crate::material::Material;
use crate::math::{ColorRGB, Point3, Vec3};
use crate::mesh::TriangleMesh;

// ─── Lights ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Directional,
}

/// A light source. Point lights use `origin` and fall off with the square of
/// the distance; directional lights use `direction` and reach everything.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub kind: LightKind,
    pub origin: Point3,
    pub direction: Vec3,
    pub color: ColorRGB,
    pub intensity: f32,
}

impl Light {
    pub fn point(origin: Point3, color: ColorRGB, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            origin,
            direction: Vec3::zero(),
            color,
            intensity,
        }
    }

    pub fn directional(direction: Vec3, color: ColorRGB, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            origin: Point3::zero(),
            direction: direction.normalized(),
            color,
            intensity,
        }
    }

    /// Direction from `target` toward the light. Unnormalized for point
    /// lights so the caller gets the light distance from the same vector;
    /// already unit length for directional lights.
    #[inline]
    pub fn direction_to(&self, target: Point3) -> Vec3 {
        match self.kind {
            LightKind::Point => self.origin - target,
            LightKind::Directional => -self.direction,
        }
    }

    /// Incident radiance at `target`: `color · intensity / d²` for point
    /// lights, `color · intensity` for directional ones.
    #[inline]
    pub fn radiance(&self, target: Point3) -> ColorRGB {
        match self.kind {
            LightKind::Point => {
                self.color * (self.intensity / (self.origin - target).length_squared())
            }
            LightKind::Directional => self.color * self.intensity,
        }
    }
}

// ─── Scene ──────────────────────────────────────────────────────────────────

/// The scene database: owns every primitive, mesh, light, and material for
/// its lifetime, plus the camera. During a frame it is read-only; between
/// frames the host may retransform meshes through [`Scene::meshes_mut`].
pub struct Scene {
    pub camera: Camera,
    spheres: Vec<Sphere>,
    planes: Vec<Plane>,
    meshes: Vec<TriangleMesh>,
    lights: Vec<Light>,
    materials: Vec<Material>,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            spheres: Vec::new(),
            planes: Vec::new(),
            meshes: Vec::new(),
            lights: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Registers a material and returns the id primitives refer to it by.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_sphere(&mut self, sphere: Sphere) {
        self.spheres.push(sphere);
    }

    pub fn add_plane(&mut self, plane: Plane) {
        self.planes.push(plane);
    }

    /// Takes ownership of an already-validated mesh.
    pub fn add_mesh(&mut self, mesh: TriangleMesh) {
        self.meshes.push(mesh);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn meshes(&self) -> &[TriangleMesh] {
        &self.meshes
    }

    /// Mutable mesh access for between-frame transform updates. Callers must
    /// finish with `update_transforms` before the next render so no worker
    /// ever sees a stale BVH.
    pub fn meshes_mut(&mut self) -> &mut [TriangleMesh] {
        &mut self.meshes
    }

    /// Closest intersection across every primitive. `rec` keeps the nearest
    /// hit; the return mirrors `rec.did_hit`.
    pub fn closest_hit(&self, ray: &Ray, rec: &mut HitRecord) -> bool {
        for sphere in &self.spheres {
            sphere.hit(ray, rec, false);
        }
        for plane in &self.planes {
            plane.hit(ray, rec, false);
        }
        for mesh in &self.meshes {
            mesh.intersect(ray, rec, false);
        }
        rec.did_hit
    }

    /// Occlusion query: true at the first hit anywhere in the ray's window.
    pub fn does_hit(&self, ray: &Ray) -> bool {
        let mut scratch = HitRecord::default();
        for sphere in &self.spheres {
            if sphere.hit(ray, &mut scratch, true) {
                return true;
            }
        }
        for plane in &self.planes {
            if plane.hit(ray, &mut scratch, true) {
                return true;
            }
        }
        for mesh in &self.meshes {
            if mesh.intersect(ray, &mut scratch, true) {
                return true;
            }
        }
        false
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
