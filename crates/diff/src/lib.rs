// Core diff library for the chunk review engine
// This crate provides the diff primitive and the chunk data model

mod chunk;
mod chunk_set;
mod snapshot;
mod text_diff;

pub use chunk::{Chunk, ChunkIdentity, ChunkKind};
pub use chunk_set::{ChunkSet, ChunkSetError, Side};
pub use similar::Algorithm;
pub use snapshot::{SnapshotError, TextSnapshot};
pub use text_diff::{ChunkDiffer, DiffConfig, DiffGranularity, TextDiff};
