// Circular distance graphs
//
// All distances are normalized to the circumference, so a well-formed metric
// stays in [0, 0.5]. Graphs are immutable after construction and shared by
// reference for the whole run.

/// Distance metric over `size` vertices on a circle.
///
/// Implementations must return values in `[0, 0.5]` with `distance(a, a) == 0`
/// and `distance(a, b) == distance(b, a)`. [`SplitCircle`] is the documented
/// exception: its re-indexed linear formula serves the directional-balance
/// analysis and is not guaranteed symmetric for all inputs, so do not rely
/// on its symmetry.
pub trait Graph {
    /// Number of vertices; always > 0.
    fn size(&self) -> usize;

    /// Normalized distance between vertices `a` and `b`.
    fn distance(&self, a: usize, b: usize) -> f64;
}

/// Uniform circle: shortest wrap-around arc between two vertices.
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    size: usize,
}

impl Circle {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Re-indexed view of this circle with `split_vertex` as the origin.
    pub fn split(&self, split_vertex: usize) -> SplitCircle {
        SplitCircle::new(self.size, split_vertex)
    }
}

impl Graph for Circle {
    fn size(&self) -> usize {
        self.size
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        let diff = a.abs_diff(b);
        diff.min(self.size - diff) as f64 / self.size as f64
    }
}

/// Circle re-indexed from `split_vertex`, measured linearly (no wrap).
///
/// Used where directional reasoning needs positions relative to a cut point.
/// Distances can exceed 0.5 and the formula is not symmetric for all inputs.
#[derive(Debug, Clone, Copy)]
pub struct SplitCircle {
    size: usize,
    split_vertex: usize,
}

impl SplitCircle {
    pub fn new(size: usize, split_vertex: usize) -> Self {
        Self { size, split_vertex }
    }
}

impl Graph for SplitCircle {
    fn size(&self) -> usize {
        self.size
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        let ra = (a + self.size - self.split_vertex) % self.size;
        let rb = (b + self.size - self.split_vertex) % self.size;
        ra.abs_diff(rb) as f64 / self.size as f64
    }
}

/// Circle with arbitrary per-vertex positions in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct CustomCircle {
    vertices: Vec<f64>,
}

impl CustomCircle {
    pub fn new(vertices: Vec<f64>) -> Self {
        Self { vertices }
    }
}

impl Graph for CustomCircle {
    fn size(&self) -> usize {
        self.vertices.len()
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        let diff = self.vertices[a] - self.vertices[b];
        let wrapped = diff - diff.floor();
        wrapped.min(1.0 - wrapped)
    }
}
