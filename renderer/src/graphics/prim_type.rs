/// Primitive assembled from vertices by a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimType {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimType {
    /// Whether consecutive ranges of this type can be drawn as one range
    pub fn is_list(self) -> bool {
        matches!(self, Self::Points | Self::Lines | Self::Triangles)
    }
}
