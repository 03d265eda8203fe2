//! Chunking strategies and the chunk visualizer.

mod base;
mod recursive_chunker;
mod window_chunker;

pub mod visualizer;

pub use base::{char_bounds, char_len, Chunker};
pub use recursive_chunker::RecursiveChunker;
pub use window_chunker::{windows, Window, WindowChunker};
