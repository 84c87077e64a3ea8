use crate::geometry::{Aabb, CullMode, HitRecord, Ray, Triangle};
use crate::math::{Mat4, Point3, Vec3};
use thiserror::Error;
use tracing::debug;

/// Number of SAH bins per axis when searching for a split plane.
pub const N_BINS: usize = 8;

/// Nodes at or below this many index slots (three per triangle) stay leaves
/// without evaluating the SAH. Tutorial-derived default; retune per workload.
pub const SMALL_LEAF_SLOTS: u32 = 8;

/// Rejection reasons for mesh construction. Degenerate geometry discovered
/// later (zero-area triangles) is not an error — the kernels just miss it.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("index count {0} is not a multiple of 3")]
    IndicesNotTriples(usize),
    #[error("index {index} out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },
    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),
    #[error("expected {expected} face normals, got {actual}")]
    NormalCountMismatch { expected: usize, actual: usize },
}

// ─── BVH node ───────────────────────────────────────────────────────────────

/// One node of the flat BVH array. A node is a leaf iff `tri_count > 0`;
/// internal nodes keep `tri_count == 0` and own children at `left_child` and
/// `left_child + 1`. All counts and offsets are in flattened index slots.
#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
    pub aabb: Aabb,
    pub left_child: u32,
    pub first_tri_index: u32,
    pub tri_count: u32,
}

impl BvhNode {
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.tri_count > 0
    }
}

impl Default for BvhNode {
    fn default() -> Self {
        Self {
            aabb: Aabb::EMPTY,
            left_child: 0,
            first_tri_index: 0,
            tri_count: 0,
        }
    }
}

/// Per-bin accumulator for the SAH sweep: vertex bounds plus a slot count.
#[derive(Clone, Copy)]
struct Bin {
    bounds: Aabb,
    count: u32,
}

impl Default for Bin {
    fn default() -> Self {
        Self { bounds: Aabb::EMPTY, count: 0 }
    }
}

// ─── TriangleMesh ───────────────────────────────────────────────────────────

/// A triangle soup with a TRS transform and an owned BVH.
///
/// Geometry lives in parallel contiguous buffers: `indices` holds three
/// slots per triangle into `positions`/`transformed_positions`, while
/// `normals`/`transformed_normals` hold one entry per triangle addressed by
/// `slot / 3`. The BVH partitions `indices` in place, so those per-triangle
/// arrays are permuted in lockstep with the triples.
///
/// `update_transforms` is the only sync point: it rewrites the transformed
/// buffers from the TRS matrices and rebuilds the BVH from scratch, reusing
/// the node allocation.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    pub positions: Vec<Point3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,

    pub transformed_positions: Vec<Point3>,
    pub transformed_normals: Vec<Vec3>,

    pub translation_transform: Mat4,
    pub rotation_transform: Mat4,
    pub scale_transform: Mat4,

    pub cull_mode: CullMode,
    pub material_id: usize,

    nodes: Vec<BvhNode>,
    nodes_used: u32,
}

impl TriangleMesh {
    /// Builds a mesh from positions and indices, deriving the face normals
    /// from the winding order.
    pub fn new(
        positions: Vec<Point3>,
        indices: Vec<u32>,
        cull_mode: CullMode,
        material_id: usize,
    ) -> Result<Self, MeshError> {
        Self::validate(&positions, &indices)?;
        let mut mesh = Self::unbuilt(positions, Vec::new(), indices, cull_mode, material_id);
        mesh.calculate_normals();
        mesh.update_transforms();
        Ok(mesh)
    }

    /// Builds a mesh with loader-supplied face normals (one per triangle).
    pub fn with_normals(
        positions: Vec<Point3>,
        indices: Vec<u32>,
        normals: Vec<Vec3>,
        cull_mode: CullMode,
        material_id: usize,
    ) -> Result<Self, MeshError> {
        Self::validate(&positions, &indices)?;
        if normals.len() != indices.len() / 3 {
            return Err(MeshError::NormalCountMismatch {
                expected: indices.len() / 3,
                actual: normals.len(),
            });
        }
        let mut mesh = Self::unbuilt(positions, normals, indices, cull_mode, material_id);
        mesh.update_transforms();
        Ok(mesh)
    }

    fn unbuilt(
        positions: Vec<Point3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
        cull_mode: CullMode,
        material_id: usize,
    ) -> Self {
        Self {
            positions,
            normals,
            indices,
            transformed_positions: Vec::new(),
            transformed_normals: Vec::new(),
            translation_transform: Mat4::IDENTITY,
            rotation_transform: Mat4::IDENTITY,
            scale_transform: Mat4::IDENTITY,
            cull_mode,
            material_id,
            nodes: Vec::new(),
            nodes_used: 0,
        }
    }

    fn validate(positions: &[Point3], indices: &[u32]) -> Result<(), MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndicesNotTriples(indices.len()));
        }
        for &index in indices {
            if index as usize >= positions.len() {
                return Err(MeshError::IndexOutOfBounds {
                    index,
                    vertex_count: positions.len(),
                });
            }
        }
        if let Some(bad) = positions.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::NonFiniteVertex(bad));
        }
        Ok(())
    }

    /// Face normals from the untransformed positions, one per index triple.
    fn calculate_normals(&mut self) {
        self.normals.clear();
        self.normals.reserve(self.indices.len() / 3);
        for slot in (0..self.indices.len()).step_by(3) {
            let v0 = self.positions[self.indices[slot] as usize];
            let v1 = self.positions[self.indices[slot + 1] as usize];
            let v2 = self.positions[self.indices[slot + 2] as usize];
            self.normals.push((v1 - v0).cross(v2 - v0).normalized());
        }
    }

    /// Stamps the translation matrix; takes effect on `update_transforms`.
    pub fn translate(&mut self, translation: Vec3) {
        self.translation_transform = Mat4::translation(translation);
    }

    pub fn rotate_y(&mut self, yaw: f32) {
        self.rotation_transform = Mat4::rotation_y(yaw);
    }

    pub fn scale(&mut self, scale: Vec3) {
        self.scale_transform = Mat4::scaling(scale);
    }

    /// Appends one triangle's vertices, indices, and face normal. Pass
    /// `defer_transform_update` while batching and call
    /// [`TriangleMesh::update_transforms`] once after the last append.
    pub fn append_triangle(&mut self, triangle: &Triangle, defer_transform_update: bool) {
        let start = self.positions.len() as u32;
        self.positions.push(triangle.v0);
        self.positions.push(triangle.v1);
        self.positions.push(triangle.v2);
        self.indices.extend([start, start + 1, start + 2]);
        self.normals.push(triangle.normal);

        if !defer_transform_update {
            self.update_transforms();
        }
    }

    /// Applies the composed `scale · rotation · translation` transform to
    /// every position and normal, then rebuilds the BVH over the result.
    /// Render workers must never observe a mesh mid-update; the frame loop
    /// only calls this between frames.
    pub fn update_transforms(&mut self) {
        let final_transform =
            self.scale_transform * self.rotation_transform * self.translation_transform;

        self.transformed_positions.clear();
        self.transformed_positions
            .extend(self.positions.iter().map(|p| final_transform.transform_point(*p)));

        self.transformed_normals.clear();
        self.transformed_normals.extend(
            self.normals
                .iter()
                .map(|n| final_transform.transform_vector(*n).normalized()),
        );

        self.build_bvh();
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The node array truncated to the slots actually in use.
    pub fn bvh_nodes(&self) -> &[BvhNode] {
        &self.nodes[..self.nodes_used as usize]
    }

    // ─── BVH construction ───────────────────────────────────────────────────

    fn build_bvh(&mut self) {
        let tri_count = self.triangle_count();
        // Upper bound for a binary tree over the triangles; the buffer is
        // reused verbatim when the triangle count is unchanged.
        let capacity = (2 * tri_count).saturating_sub(1).max(1);
        self.nodes.clear();
        self.nodes.resize(capacity, BvhNode::default());
        self.nodes_used = 1;

        let root = &mut self.nodes[0];
        root.left_child = 0;
        root.first_tri_index = 0;
        root.tri_count = self.indices.len() as u32;

        self.update_node_bounds(0);
        self.subdivide(0);

        debug!(
            triangles = tri_count,
            nodes = self.nodes_used,
            "rebuilt mesh BVH"
        );
    }

    /// Tightens a node's AABB around the actual vertices of its triangles.
    fn update_node_bounds(&mut self, node_idx: u32) {
        let node = self.nodes[node_idx as usize];
        let mut aabb = Aabb::EMPTY;
        let first = node.first_tri_index as usize;
        for slot in first..first + node.tri_count as usize {
            aabb.grow(self.transformed_positions[self.indices[slot] as usize]);
        }
        self.nodes[node_idx as usize].aabb = aabb;
    }

    /// Centroid of the triangle whose first slot is `slot`. Recomputed on
    /// demand rather than cached.
    #[inline]
    fn centroid(&self, slot: usize) -> Point3 {
        let v0 = self.transformed_positions[self.indices[slot] as usize];
        let v1 = self.transformed_positions[self.indices[slot + 1] as usize];
        let v2 = self.transformed_positions[self.indices[slot + 2] as usize];
        (v0 + v1 + v2) / 3.0
    }

    /// Recursive SAH split: stop early on small leaves, otherwise bin the
    /// centroids, pick the cheapest plane, and split only when it beats
    /// leaving the node whole.
    fn subdivide(&mut self, node_idx: u32) {
        let (first, count) = {
            let node = &self.nodes[node_idx as usize];
            (node.first_tri_index, node.tri_count)
        };
        if count <= SMALL_LEAF_SLOTS {
            return;
        }

        let Some((axis, split_pos, split_cost)) = self.find_best_split_plane(first, count) else {
            // Every centroid coincides on every axis; nothing to split by.
            return;
        };
        let no_split_cost = count as f32 * self.nodes[node_idx as usize].aabb.area();
        if split_cost >= no_split_cost {
            return;
        }

        // In-place partition over [first, first + count), moving whole
        // triples and keeping the per-triangle arrays permuted identically.
        let mut i = first as isize;
        let mut j = (first + count) as isize - 3;
        while i <= j {
            if self.centroid(i as usize)[axis] < split_pos {
                i += 3;
            } else {
                let (a, b) = (i as usize, j as usize);
                self.indices.swap(a, b);
                self.indices.swap(a + 1, b + 1);
                self.indices.swap(a + 2, b + 2);
                self.normals.swap(a / 3, b / 3);
                self.transformed_normals.swap(a / 3, b / 3);
                j -= 3;
            }
        }

        let left_count = (i - first as isize) as u32;
        if left_count == 0 || left_count == count {
            return;
        }

        let left = self.nodes_used;
        let right = left + 1;
        self.nodes_used += 2;

        self.nodes[left as usize].first_tri_index = first;
        self.nodes[left as usize].tri_count = left_count;
        self.nodes[right as usize].first_tri_index = i as u32;
        self.nodes[right as usize].tri_count = count - left_count;

        let node = &mut self.nodes[node_idx as usize];
        node.left_child = left;
        node.tri_count = 0;

        self.update_node_bounds(left);
        self.update_node_bounds(right);
        self.subdivide(left);
        self.subdivide(right);
    }

    /// Binned SAH search over all three axes. Returns the cheapest
    /// `(axis, plane, cost)` triple, or `None` when no axis offers a
    /// non-empty centroid interval.
    fn find_best_split_plane(&self, first: u32, count: u32) -> Option<(usize, f32, f32)> {
        let first = first as usize;
        let count = count as usize;
        let mut best: Option<(usize, f32, f32)> = None;

        for axis in 0..3 {
            let mut centroid_min = f32::INFINITY;
            let mut centroid_max = f32::NEG_INFINITY;
            for slot in (first..first + count).step_by(3) {
                let c = self.centroid(slot)[axis];
                centroid_min = centroid_min.min(c);
                centroid_max = centroid_max.max(c);
            }
            if centroid_min == centroid_max {
                continue;
            }

            let mut bins = [Bin::default(); N_BINS];
            let scale = N_BINS as f32 / (centroid_max - centroid_min);
            for slot in (first..first + count).step_by(3) {
                let v0 = self.transformed_positions[self.indices[slot] as usize];
                let v1 = self.transformed_positions[self.indices[slot + 1] as usize];
                let v2 = self.transformed_positions[self.indices[slot + 2] as usize];
                let c = (v0 + v1 + v2) / 3.0;
                let bin_idx = (((c[axis] - centroid_min) * scale) as usize).min(N_BINS - 1);
                bins[bin_idx].count += 3;
                bins[bin_idx].bounds.grow(v0);
                bins[bin_idx].bounds.grow(v1);
                bins[bin_idx].bounds.grow(v2);
            }

            // Prefix/suffix sweeps give the bounds and counts on both sides
            // of each of the N_BINS - 1 candidate planes in one pass.
            let mut left_area = [0.0f32; N_BINS - 1];
            let mut right_area = [0.0f32; N_BINS - 1];
            let mut left_count = [0u32; N_BINS - 1];
            let mut right_count = [0u32; N_BINS - 1];
            let mut left_box = Aabb::EMPTY;
            let mut right_box = Aabb::EMPTY;
            let mut left_sum = 0;
            let mut right_sum = 0;
            for i in 0..N_BINS - 1 {
                left_sum += bins[i].count;
                left_count[i] = left_sum;
                left_box.grow_aabb(&bins[i].bounds);
                left_area[i] = left_box.area();

                right_sum += bins[N_BINS - 1 - i].count;
                right_count[N_BINS - 2 - i] = right_sum;
                right_box.grow_aabb(&bins[N_BINS - 1 - i].bounds);
                right_area[N_BINS - 2 - i] = right_box.area();
            }

            let plane_step = (centroid_max - centroid_min) / N_BINS as f32;
            for i in 0..N_BINS - 1 {
                if left_count[i] == 0 || right_count[i] == 0 {
                    continue;
                }
                let cost =
                    left_count[i] as f32 * left_area[i] + right_count[i] as f32 * right_area[i];
                if best.map_or(true, |(_, _, c)| cost < c) {
                    best = Some((axis, centroid_min + plane_step * (i + 1) as f32, cost));
                }
            }
        }

        best
    }

    // ─── Traversal ──────────────────────────────────────────────────────────

    /// Intersects a ray with the mesh through the BVH. Closest-hit mode
    /// tightens `rec` to the nearest triangle; shadow mode returns at the
    /// first occluder without touching `rec`.
    pub fn intersect(&self, ray: &Ray, rec: &mut HitRecord, shadow_mode: bool) -> bool {
        if self.indices.is_empty() {
            return false;
        }
        self.intersect_bvh(0, ray, rec, shadow_mode)
    }

    fn intersect_bvh(&self, node_idx: u32, ray: &Ray, rec: &mut HitRecord, shadow_mode: bool) -> bool {
        let node = &self.nodes[node_idx as usize];
        if !node.aabb.hit(ray) {
            return false;
        }

        if !node.is_leaf() {
            let left = self.intersect_bvh(node.left_child, ray, rec, shadow_mode);
            if shadow_mode && left {
                return true;
            }
            let right = self.intersect_bvh(node.left_child + 1, ray, rec, shadow_mode);
            return left || right;
        }

        let first = node.first_tri_index as usize;
        let mut any_hit = false;
        for slot in (first..first + node.tri_count as usize).step_by(3) {
            let triangle = Triangle::with_normal(
                self.transformed_positions[self.indices[slot] as usize],
                self.transformed_positions[self.indices[slot + 1] as usize],
                self.transformed_positions[self.indices[slot + 2] as usize],
                self.transformed_normals[slot / 3],
                self.cull_mode,
                self.material_id,
            );
            if triangle.hit(ray, rec, shadow_mode) {
                if shadow_mode {
                    return true;
                }
                any_hit = true;
            }
        }
        any_hit
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    /// Two clusters of 10 identical triangles each, one around x = 0 and one
    /// around x = 10.
    fn cluster_mesh() -> TriangleMesh {
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for cluster_x in [0.0f32, 10.0] {
            for _ in 0..10 {
                let base = positions.len() as u32;
                positions.push(Point3::new(cluster_x, 0.0, 0.0));
                positions.push(Point3::new(cluster_x + 1.0, 0.0, 0.0));
                positions.push(Point3::new(cluster_x + 0.5, 1.0, 0.0));
                indices.extend([base, base + 1, base + 2]);
            }
        }
        TriangleMesh::new(positions, indices, CullMode::None, 0).unwrap()
    }

    /// A jittered triangle soup for structural invariant checks.
    fn random_soup(triangles: usize, seed: u64) -> TriangleMesh {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for _ in 0..triangles {
            let base = positions.len() as u32;
            let center = Point3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            for _ in 0..3 {
                positions.push(
                    center
                        + Vec3::new(
                            rng.gen_range(-0.5..0.5),
                            rng.gen_range(-0.5..0.5),
                            rng.gen_range(-0.5..0.5),
                        ),
                );
            }
            indices.extend([base, base + 1, base + 2]);
        }
        TriangleMesh::new(positions, indices, CullMode::None, 0).unwrap()
    }

    fn triples(indices: &[u32]) -> Vec<[u32; 3]> {
        indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
    }

    #[test]
    fn validation_rejects_bad_input() {
        let positions = vec![Point3::zero(), Point3::unit_x(), Point3::unit_y()];
        assert!(matches!(
            TriangleMesh::new(positions.clone(), vec![0, 1], CullMode::None, 0),
            Err(MeshError::IndicesNotTriples(2))
        ));
        assert!(matches!(
            TriangleMesh::new(positions.clone(), vec![0, 1, 3], CullMode::None, 0),
            Err(MeshError::IndexOutOfBounds { index: 3, .. })
        ));
        assert!(matches!(
            TriangleMesh::new(
                vec![Point3::new(f32::NAN, 0.0, 0.0), Point3::unit_x(), Point3::unit_y()],
                vec![0, 1, 2],
                CullMode::None,
                0
            ),
            Err(MeshError::NonFiniteVertex(0))
        ));
        assert!(matches!(
            TriangleMesh::with_normals(positions, vec![0, 1, 2], vec![], CullMode::None, 0),
            Err(MeshError::NormalCountMismatch { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn sah_splits_skewed_clusters_at_the_gap() {
        let mesh = cluster_mesh();
        let nodes = mesh.bvh_nodes();

        // Root splits once on X; both clusters become leaves of 10 triangles.
        assert_eq!(nodes.len(), 3);
        let root = &nodes[0];
        assert!(!root.is_leaf());
        let left = &nodes[root.left_child as usize];
        let right = &nodes[root.left_child as usize + 1];
        assert!(left.is_leaf() && right.is_leaf());
        assert_eq!(left.tri_count, 30);
        assert_eq!(right.tri_count, 30);

        // The split plane falls in the gap between the clusters.
        let (near, far) = if left.aabb.max.x < right.aabb.min.x {
            (left, right)
        } else {
            (right, left)
        };
        assert!(near.aabb.max.x < 5.0);
        assert!(far.aabb.min.x > 5.0);
    }

    #[test]
    fn nodes_are_leaves_iff_they_hold_slots() {
        let mesh = random_soup(200, 7);
        for node in mesh.bvh_nodes() {
            if node.is_leaf() {
                assert!(node.tri_count > 0);
                assert_eq!(node.tri_count % 3, 0);
            } else {
                assert_eq!(node.tri_count, 0);
                assert_ne!(node.left_child, 0);
                assert!((node.left_child + 1) < mesh.bvh_nodes().len() as u32);
            }
        }
    }

    #[test]
    fn leaf_slots_cover_every_index_exactly_once() {
        let mesh = random_soup(150, 11);
        let mut covered = vec![0u32; mesh.indices.len()];
        for node in mesh.bvh_nodes() {
            if node.is_leaf() {
                let first = node.first_tri_index as usize;
                for slot in first..first + node.tri_count as usize {
                    covered[slot] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn partition_permutes_whole_triples() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for _ in 0..120 {
            let base = positions.len() as u32;
            for _ in 0..3 {
                positions.push(Point3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                ));
            }
            indices.extend([base, base + 1, base + 2]);
        }
        let mut before = triples(&indices);

        let mesh = TriangleMesh::new(positions, indices, CullMode::None, 0).unwrap();
        let mut after = triples(&mesh.indices);

        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn normals_stay_matched_to_their_triangles() {
        let mesh = random_soup(80, 42);
        for (k, triple) in mesh.indices.chunks_exact(3).enumerate() {
            let v0 = mesh.positions[triple[0] as usize];
            let v1 = mesh.positions[triple[1] as usize];
            let v2 = mesh.positions[triple[2] as usize];
            let expected = (v1 - v0).cross(v2 - v0).normalized();
            let stored = mesh.normals[k];
            assert!(
                stored.dot(expected) > 1.0 - 1e-4,
                "normal {k} no longer matches its triple"
            );
        }
    }

    #[test]
    fn every_ancestor_aabb_contains_its_leaf_triangles() {
        let mesh = random_soup(100, 5);
        let nodes = mesh.bvh_nodes();

        fn walk(mesh: &TriangleMesh, nodes: &[BvhNode], node_idx: u32, ancestors: &mut Vec<u32>) {
            ancestors.push(node_idx);
            let node = &nodes[node_idx as usize];
            if node.is_leaf() {
                let first = node.first_tri_index as usize;
                for slot in first..first + node.tri_count as usize {
                    let v = mesh.transformed_positions[mesh.indices[slot] as usize];
                    for &a in ancestors.iter() {
                        assert!(
                            nodes[a as usize].aabb.contains(v),
                            "vertex {v} escapes ancestor node {a}"
                        );
                    }
                }
            } else {
                walk(mesh, nodes, node.left_child, ancestors);
                walk(mesh, nodes, node.left_child + 1, ancestors);
            }
            ancestors.pop();
        }

        walk(&mesh, nodes, 0, &mut Vec::new());
    }

    #[test]
    fn transforms_rewrite_buffers_and_rebuild_the_bvh() {
        let mut mesh = cluster_mesh();
        mesh.translate(Vec3::new(0.0, 0.0, 5.0));
        mesh.rotate_y(0.3);
        mesh.scale(Vec3::splat(2.0));
        mesh.update_transforms();

        assert_eq!(mesh.transformed_positions.len(), mesh.positions.len());
        assert_eq!(mesh.transformed_normals.len(), mesh.normals.len());
        for n in &mesh.transformed_normals {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }

        // The rebuilt root bounds follow the transform.
        let root = mesh.bvh_nodes()[0];
        for p in &mesh.transformed_positions {
            assert!(root.aabb.contains(*p));
        }
    }

    #[test]
    fn traversal_finds_the_closest_triangle() {
        // Two parallel quads; the nearer one must win.
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for z in [5.0f32, 9.0] {
            let base = positions.len() as u32;
            positions.extend([
                Point3::new(-2.0, -2.0, z),
                Point3::new(2.0, -2.0, z),
                Point3::new(2.0, 2.0, z),
                Point3::new(-2.0, 2.0, z),
            ]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        let mesh = TriangleMesh::new(positions, indices, CullMode::None, 4).unwrap();

        let ray = Ray::new(Point3::new(0.5, -0.5, 0.0), Vec3::unit_z());
        let mut rec = HitRecord::default();
        assert!(mesh.intersect(&ray, &mut rec, false));
        assert!(rec.did_hit);
        assert!((rec.t - 5.0).abs() < 1e-3, "expected t≈5, got {}", rec.t);
        assert_eq!(rec.material_id, 4);

        // Shadow mode reports occlusion without writing the record.
        let mut untouched = HitRecord::default();
        assert!(mesh.intersect(&ray, &mut untouched, true));
        assert!(!untouched.did_hit);
    }

    #[test]
    fn traversal_respects_ray_t_max() {
        let mesh = cluster_mesh();
        // Both clusters live near z = 0; a ray capped before them sees nothing.
        let ray = Ray::with_max(Point3::new(0.5, 0.5, -10.0), Vec3::unit_z(), 1.0);
        let mut rec = HitRecord::default();
        assert!(!mesh.intersect(&ray, &mut rec, false));
        assert!(!mesh.intersect(&ray, &mut rec, true));
    }

    #[test]
    fn empty_mesh_never_intersects() {
        let mesh = TriangleMesh::new(Vec::new(), Vec::new(), CullMode::None, 0).unwrap();
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        let mut rec = HitRecord::default();
        assert!(!mesh.intersect(&ray, &mut rec, false));
        assert!(!mesh.intersect(&ray, &mut rec, true));
    }

    #[test]
    fn append_triangle_batches_until_update() {
        let mut mesh = cluster_mesh();
        let before = mesh.triangle_count();
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 20.0),
            Point3::new(1.0, 0.0, 20.0),
            Point3::new(0.0, 1.0, 20.0),
            CullMode::None,
            0,
        );
        mesh.append_triangle(&tri, true);
        assert_eq!(mesh.triangle_count(), before + 1);
        // Deferred: the transformed buffers lag until update_transforms.
        assert_eq!(mesh.transformed_positions.len(), mesh.positions.len() - 3);

        mesh.update_transforms();
        assert_eq!(mesh.transformed_positions.len(), mesh.positions.len());

        let ray = Ray::new(Point3::new(0.3, 0.3, 0.0), Vec3::unit_z());
        let mut rec = HitRecord::default();
        assert!(mesh.intersect(&ray, &mut rec, false));
        assert!((rec.t - 20.0).abs() < 1e-3);
    }
}
