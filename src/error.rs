use std::path::PathBuf;

use thiserror::Error;

use crate::element::{EH, FH, HH, VH};

#[derive(Debug, Error)]
pub enum Error {
    // Topology.
    #[error("vertex {0} is not on the boundary, a face cannot be attached to it")]
    ComplexVertex(VH),
    #[error("halfedge {0} already has a face")]
    ComplexHalfedge(HH),
    #[error("no halfedge from {0} to {1}")]
    HalfedgeNotFound(VH, VH),
    #[error("unable to relink the boundary around a new face")]
    PatchRelinkingFailed,
    #[error("face {0} is not a triangle")]
    NonTriangleFace(FH),
    // Topology checks.
    #[error("halfedge {0} is out of range")]
    InvalidHalfedge(HH),
    #[error("vertex {0} is on the boundary but its halfedge is not")]
    OutgoingHalfedgeNotBoundary(VH),
    #[error("outgoing halfedges of vertex {0} are inconsistent")]
    InvalidOutgoingHalfedges(VH),
    #[error("halfedge {0} starts and ends at the same vertex")]
    DegenerateHalfedge(HH),
    #[error("halfedge {0} is not linked to its neighbours")]
    InvalidHalfedgeLink(HH),
    #[error("halfedge {0} is missing from the circulators of its vertices")]
    InvalidHalfedgeVertexLink(HH),
    #[error("halfedge {0} belongs to more than one loop")]
    InvalidLoopTopology(HH),
    #[error("halfedge {0} doesn't have the same face as its loop")]
    InconsistentFaceInLoop(HH),
    #[error("face {0} and its halfedge {1} are not linked")]
    InvalidFaceHalfedgeLink(FH, HH),
    // Obj.
    #[error("failed to load obj file: {0}")]
    ObjLoadFailed(String),
    #[error("incorrect number of coordinates: {0}")]
    IncorrectNumberOfCoordinates(usize),
    // Files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("invalid embedding file {path}, line {line}: {message}")]
    InvalidEmbeddingFile {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("invalid input file {path}, line {line}: {message}")]
    InvalidInputFile {
        path: PathBuf,
        line: usize,
        message: String,
    },
    /// The recorded vertex sequence of an embedded layout halfedge doesn't
    /// connect its landmarks, or overlaps another embedded path.
    #[error("recorded path of layout halfedge {0} is not a valid embedding")]
    InconsistentEmbedding(HH),
    #[error("invalid landmark matching: {0}")]
    InvalidMatching(String),
    // Embedding.
    /// None of the remaining layout edges can be routed.
    #[error("no legal path exists for layout edge {0}")]
    NoFeasiblePath(EH),
}
