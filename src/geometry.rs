use crate::math::{Point3, Vec3};

/// Inclusive lower bound of every ray's parameter window. Doubles as the
/// self-shadow offset applied when spawning shadow rays from a surface.
pub const T_MIN: f32 = 1e-4;

// ─── Ray ────────────────────────────────────────────────────────────────────

/// A parametric ray `R(t) = origin + t · direction` with a precomputed
/// reciprocal direction for the slab test.
///
/// The direction is normalized at construction and the reciprocal is kept in
/// sync with it. Axis-aligned directions produce ±∞ reciprocal components;
/// the slab test relies on IEEE min/max to absorb them.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    #[inline]
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self::with_max(origin, direction, f32::INFINITY)
    }

    /// A ray with a bounded parameter window — shadow rays cap `t_max` at
    /// the distance to the light so occluders behind it are ignored.
    #[inline]
    pub fn with_max(origin: Point3, direction: Vec3, t_max: f32) -> Self {
        let direction = direction.normalized();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            t_min: T_MIN,
            t_max,
        }
    }

    /// Evaluates the ray at parameter `t`.
    #[inline(always)]
    pub fn at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }
}

// ─── HitRecord ──────────────────────────────────────────────────────────────

/// The closest intersection found so far. Starts at `t = +∞` with
/// `did_hit = false`; kernels only write it when they find a nearer hit, so
/// one record threads through an entire scene query unchanged.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord {
    pub t: f32,
    pub origin: Point3,
    pub normal: Vec3,
    pub material_id: usize,
    pub did_hit: bool,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            origin: Point3::zero(),
            normal: Vec3::zero(),
            material_id: 0,
            did_hit: false,
        }
    }
}

// ─── Culling ────────────────────────────────────────────────────────────────

/// Which triangle side a ray is allowed to hit.
///
/// Shadow queries run with the inverted mode so an occluder blocks light no
/// matter which face the shadow ray approaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    Front,
    Back,
    #[default]
    None,
}

impl CullMode {
    #[inline]
    pub fn inverted(self) -> Self {
        match self {
            CullMode::Front => CullMode::Back,
            CullMode::Back => CullMode::Front,
            CullMode::None => CullMode::None,
        }
    }
}

// ─── Sphere ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub origin: Point3,
    pub radius: f32,
    pub material_id: usize,
}

impl Sphere {
    pub const fn new(origin: Point3, radius: f32, material_id: usize) -> Self {
        Self { origin, radius, material_id }
    }

    /// Geometric ray/sphere test. Only the near root is considered; a sphere
    /// enclosing the ray origin therefore reports a miss.
    ///
    /// The recorded normal is the unnormalized `hit − center`; the shading
    /// pipeline normalizes once per hit.
    pub fn hit(&self, ray: &Ray, rec: &mut HitRecord, shadow_mode: bool) -> bool {
        let tc = self.origin - ray.origin;
        let dp = tc.dot(ray.direction);
        let od2 = tc.length_squared() - dp * dp;
        let r2 = self.radius * self.radius;
        if od2 > r2 {
            return false;
        }

        let tca = (r2 - od2).sqrt();
        let t = dp - tca;
        if t <= ray.t_min || t > ray.t_max {
            return false;
        }
        if shadow_mode {
            return true;
        }

        if t < rec.t {
            rec.t = t;
            rec.origin = ray.at(t);
            rec.normal = rec.origin - self.origin;
            rec.material_id = self.material_id;
            rec.did_hit = true;
        }
        true
    }
}

// ─── Plane ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vec3,
    pub material_id: usize,
}

impl Plane {
    pub const fn new(origin: Point3, normal: Vec3, material_id: usize) -> Self {
        Self { origin, normal, material_id }
    }

    /// Ray/plane test. A ray parallel to the plane divides by zero, the
    /// resulting ±∞ or NaN fails the window check, and the ray misses.
    pub fn hit(&self, ray: &Ray, rec: &mut HitRecord, shadow_mode: bool) -> bool {
        let t = (self.origin - ray.origin).dot(self.normal) / ray.direction.dot(self.normal);
        if !(t > ray.t_min && t <= ray.t_max) {
            return false;
        }
        if shadow_mode {
            return true;
        }

        if t < rec.t {
            rec.t = t;
            rec.origin = ray.at(t);
            rec.normal = self.normal;
            rec.material_id = self.material_id;
            rec.did_hit = true;
        }
        true
    }
}

// ─── Triangle ───────────────────────────────────────────────────────────────

/// A single triangle with a precomputed face normal. Standalone triangles and
/// BVH leaf triangles both funnel through [`Triangle::hit`].
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
    pub normal: Vec3,
    pub cull_mode: CullMode,
    pub material_id: usize,
}

impl Triangle {
    /// Constructs a triangle, inferring the face normal from the winding:
    /// `normalize((v1 − v0) × (v2 − v0))`.
    pub fn new(v0: Point3, v1: Point3, v2: Point3, cull_mode: CullMode, material_id: usize) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalized();
        Self { v0, v1, v2, normal, cull_mode, material_id }
    }

    pub const fn with_normal(
        v0: Point3,
        v1: Point3,
        v2: Point3,
        normal: Vec3,
        cull_mode: CullMode,
        material_id: usize,
    ) -> Self {
        Self { v0, v1, v2, normal, cull_mode, material_id }
    }

    /// Möller–Trumbore ray/triangle test.
    ///
    /// Culling happens against the face normal before the barycentric work:
    /// back-face culling rejects `d·n > 0`, front-face culling rejects
    /// `d·n < 0`, and shadow queries run with the inverted mode. A
    /// degenerate (zero-area) triangle fails the determinant threshold and
    /// silently misses.
    pub fn hit(&self, ray: &Ray, rec: &mut HitRecord, shadow_mode: bool) -> bool {
        let active = if shadow_mode {
            self.cull_mode.inverted()
        } else {
            self.cull_mode
        };
        let facing = ray.direction.dot(self.normal);
        match active {
            CullMode::Back if facing > 0.0 => return false,
            CullMode::Front if facing < 0.0 => return false,
            _ => {}
        }

        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let p = ray.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < f32::EPSILON {
            return false;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - self.v0;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return false;
        }

        let q = s.cross(e1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return false;
        }

        let t = e2.dot(q) * inv_det;
        if t < ray.t_min || t >= ray.t_max {
            return false;
        }
        if shadow_mode {
            return true;
        }

        if t < rec.t {
            rec.t = t;
            rec.origin = ray.at(t);
            rec.normal = self.normal;
            rec.material_id = self.material_id;
            rec.did_hit = true;
        }
        true
    }
}

// ─── Aabb ───────────────────────────────────────────────────────────────────

/// An axis-aligned bounding box, the bounding volume of every BVH node.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    /// The empty box: growing it by any point yields that point's box.
    pub const EMPTY: Aabb = Aabb {
        min: Point3::splat(f32::INFINITY),
        max: Point3::splat(f32::NEG_INFINITY),
    };

    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    #[inline(always)]
    pub fn grow(&mut self, p: Point3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline(always)]
    pub fn grow_aabb(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// The SAH area metric: `xy + yz + zx` of the box extent. Half the
    /// surface area, which cancels out of every cost comparison.
    #[inline]
    pub fn area(&self) -> f32 {
        let e = self.max - self.min;
        e.x * e.y + e.y * e.z + e.z * e.x
    }

    #[inline]
    pub fn contains(&self, p: Point3) -> bool {
        self.min.x <= p.x
            && self.min.y <= p.y
            && self.min.z <= p.z
            && self.max.x >= p.x
            && self.max.y >= p.y
            && self.max.z >= p.z
    }

    /// Slab ray/box test using the ray's cached reciprocal direction.
    /// Boolean only — AABBs never fill a hit record.
    ///
    /// IEEE min/max drop the NaNs an on-boundary origin with a zero
    /// direction component produces, so axis-aligned rays behave.
    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        let tx1 = (self.min.x - ray.origin.x) * ray.inv_direction.x;
        let tx2 = (self.max.x - ray.origin.x) * ray.inv_direction.x;
        let mut t_near = tx1.min(tx2);
        let mut t_far = tx1.max(tx2);

        let ty1 = (self.min.y - ray.origin.y) * ray.inv_direction.y;
        let ty2 = (self.max.y - ray.origin.y) * ray.inv_direction.y;
        t_near = t_near.max(ty1.min(ty2));
        t_far = t_far.min(ty1.max(ty2));

        let tz1 = (self.min.z - ray.origin.z) * ray.inv_direction.z;
        let tz2 = (self.max.z - ray.origin.z) * ray.inv_direction.z;
        t_near = t_near.max(tz1.min(tz2));
        t_far = t_far.min(tz1.max(tz2));

        t_far > 0.0 && t_far >= t_near
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_straight_ahead() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0, 0);
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        let mut rec = HitRecord::default();

        assert!(sphere.hit(&ray, &mut rec, false));
        assert!(rec.did_hit);
        assert!((rec.t - 4.0).abs() < 1e-4, "expected t≈4, got {}", rec.t);
        let n = rec.normal.normalized();
        assert!((n - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
    }

    #[test]
    fn sphere_shadow_mode_leaves_record_untouched() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0, 3);
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        let mut rec = HitRecord::default();

        assert!(sphere.hit(&ray, &mut rec, true));
        assert!(!rec.did_hit);
        assert_eq!(rec.t, f32::INFINITY);
    }

    #[test]
    fn sphere_behind_origin_misses() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, -5.0), 1.0, 0);
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        let mut rec = HitRecord::default();
        assert!(!sphere.hit(&ray, &mut rec, false));
    }

    #[test]
    fn plane_behind_ray_misses() {
        // Looking straight up, away from a floor plane: t would be negative.
        let plane = Plane::new(Point3::new(0.0, -1.0, 0.0), Vec3::unit_y(), 0);
        let ray = Ray::new(Point3::zero(), Vec3::unit_y());
        let mut rec = HitRecord::default();

        assert!(!plane.hit(&ray, &mut rec, false));
        assert!(!rec.did_hit);
    }

    #[test]
    fn plane_parallel_ray_misses() {
        let plane = Plane::new(Point3::new(0.0, -1.0, 0.0), Vec3::unit_y(), 0);
        let ray = Ray::new(Point3::zero(), Vec3::unit_x());
        let mut rec = HitRecord::default();
        assert!(!plane.hit(&ray, &mut rec, false));
    }

    #[test]
    fn shadow_offset_avoids_self_intersection() {
        let normal = Vec3::new(0.3, 0.9, 0.1).normalized();
        let plane = Plane::new(Point3::zero(), normal, 0);
        // Spawn from the surface, nudged along the normal, shooting along it.
        let ray = Ray::new(Point3::zero() + normal * T_MIN, normal);
        let mut rec = HitRecord::default();
        assert!(!plane.hit(&ray, &mut rec, false));
        assert!(!plane.hit(&ray, &mut rec, true));
    }

    fn cull_test_triangle() -> Triangle {
        Triangle::with_normal(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(1.0, 0.0, 5.0),
            Point3::new(0.0, 1.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            CullMode::Back,
            0,
        )
    }

    #[test]
    fn backface_cull_accepts_the_front_side() {
        let tri = cull_test_triangle();
        // Strikes the front (normal-facing) side well inside the edges.
        let ray = Ray::new(Point3::zero(), Vec3::new(0.08, 0.08, 1.0));

        let mut rec = HitRecord::default();
        assert!(tri.hit(&ray, &mut rec, false));
        assert!(rec.did_hit);
        assert!((rec.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);

        // Shadow mode inverts to front-face culling, which rejects this
        // front-side strike (d·n < 0).
        assert!(!tri.hit(&ray, &mut rec, true));
    }

    #[test]
    fn backface_cull_rear_side_flips_with_shadow_mode() {
        let tri = cull_test_triangle();
        // Approaches from behind the triangle (d·n > 0).
        let ray = Ray::new(Point3::new(0.3, 0.3, 6.0), Vec3::new(0.0, 0.0, -1.0));

        let mut rec = HitRecord::default();
        assert!(!tri.hit(&ray, &mut rec, false));
        assert!(tri.hit(&ray, &mut rec, true));
    }

    #[test]
    fn degenerate_triangle_misses() {
        let tri = Triangle::new(
            Point3::zero(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            CullMode::None,
            0,
        );
        let ray = Ray::new(Point3::new(0.5, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut rec = HitRecord::default();
        assert!(!tri.hit(&ray, &mut rec, false));
    }

    #[test]
    fn triangle_keeps_the_nearer_hit() {
        let near = Triangle::new(
            Point3::new(-1.0, -1.0, 2.0),
            Point3::new(1.0, -1.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
            CullMode::None,
            1,
        );
        let far = Triangle::new(
            Point3::new(-1.0, -1.0, 6.0),
            Point3::new(1.0, -1.0, 6.0),
            Point3::new(0.0, 1.0, 6.0),
            CullMode::None,
            2,
        );
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());

        let mut rec = HitRecord::default();
        assert!(far.hit(&ray, &mut rec, false));
        assert!(near.hit(&ray, &mut rec, false));
        assert_eq!(rec.material_id, 1);
        // The farther triangle reports the intersection but must not
        // overwrite the nearer record.
        assert!(far.hit(&ray, &mut rec, false));
        assert_eq!(rec.material_id, 1);
        assert!((rec.t - 2.0).abs() < 1e-4);
    }

    #[test]
    fn slab_hits_box_ahead() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, 4.0), Point3::new(1.0, 1.0, 6.0));
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        assert!(aabb.hit(&ray));
    }

    #[test]
    fn slab_misses_box_behind() {
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, -6.0), Point3::new(1.0, 1.0, -4.0));
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        assert!(!aabb.hit(&ray));
    }

    #[test]
    fn slab_handles_axis_aligned_rays() {
        // A +Z ray has ±∞ reciprocal X/Y components; the box sits off-axis.
        let aabb = Aabb::new(Point3::new(2.0, 2.0, 4.0), Point3::new(3.0, 3.0, 6.0));
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        assert!(!aabb.hit(&ray));

        // Same ray, box straddling the axis: hit.
        let centered = Aabb::new(Point3::new(-1.0, -1.0, 4.0), Point3::new(1.0, 1.0, 6.0));
        assert!(centered.hit(&ray));
    }

    #[test]
    fn slab_misses_distant_box() {
        // Closest approach to the box center far exceeds its diagonal.
        let aabb = Aabb::new(
            Point3::new(9.9, 9.9, 9.9),
            Point3::new(10.1, 10.1, 10.1),
        );
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        assert!(!aabb.hit(&ray));
    }

    #[test]
    fn slab_hits_from_inside() {
        let aabb = Aabb::new(Point3::splat(-1.0), Point3::splat(1.0));
        let ray = Ray::new(Point3::zero(), Vec3::new(0.3, 0.5, 0.8));
        assert!(aabb.hit(&ray));
    }

    #[test]
    fn empty_aabb_grows_to_a_point() {
        let mut aabb = Aabb::EMPTY;
        aabb.grow(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.min, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.area(), 0.0);
    }
}
