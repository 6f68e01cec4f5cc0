/// Setup-time failures while deriving body attributes from mesh bounds.
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    /// The mesh has no extent along any axis, so it cannot be normalised.
    #[error("{name} has a degenerate bounding box (size {size:?})")]
    DegenerateBounds { name: &'static str, size: [f32; 3] },

    /// Target sizes must be positive and finite.
    #[error("{name} target size {size} must be positive")]
    InvalidTargetSize { name: &'static str, size: f32 },
}
