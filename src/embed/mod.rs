//! Sign-policy embeddings: signed/unsigned interpretation of voxel storage.
//!
//! Storage is always non-negative integers; a [`SignPolicy`] fixes a zero
//! point so that *logical* values can be negative. All linear arithmetic in
//! this module subtracts the zero point before computing and re-adds it before
//! storing. Re-embedding ([`Embedding::embed`]) rescales samples so that a
//! value squared still fits the target bit width, which is what makes the
//! gradient-norm accumulation overflow-safe without per-voxel range checks.

pub mod embedding;
pub mod policy;

pub use self::embedding::Embedding;
pub use self::policy::SignPolicy;
