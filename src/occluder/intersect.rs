use glam::Vec3;

/// Separating-axis overlap test between a triangle and an axis-aligned box
/// given by its center and half extents. Touching counts as overlapping.
pub fn triangle_overlaps_box(center: Vec3, half: Vec3, triangle: [Vec3; 3]) -> bool {
    let v0 = triangle[0] - center;
    let v1 = triangle[1] - center;
    let v2 = triangle[2] - center;

    // Box face normals.
    let min = v0.min(v1).min(v2);
    let max = v0.max(v1).max(v2);
    if min.cmpgt(half).any() || max.cmplt(-half).any() {
        return false;
    }

    let edges = [v1 - v0, v2 - v1, v0 - v2];

    // Edge cross products.
    for edge in edges {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let a = axis.cross(edge);
            if a.length_squared() < f32::EPSILON {
                continue;
            }
            if separated(a, half, v0, v1, v2) {
                return false;
            }
        }
    }

    // Triangle plane.
    let normal = edges[0].cross(edges[1]);
    if normal.length_squared() < f32::EPSILON {
        return true;
    }
    !separated(normal, half, v0, v1, v2)
}

fn separated(axis: Vec3, half: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
    let p0 = v0.dot(axis);
    let p1 = v1.dot(axis);
    let p2 = v2.dot(axis);
    let r = half.dot(axis.abs());
    p0.min(p1).min(p2) > r || p0.max(p1).max(p2) < -r
}
