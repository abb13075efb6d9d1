//! Digest bookkeeping entities.

pub mod watermark;

pub use watermark::DigestWatermark;
