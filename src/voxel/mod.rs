//! Dense voxel stacks and the domain operations the filtering core consumes.
//!
//! A [`VoxelStack`] is an owned width×height×depth grid of 8- or 16-bit
//! samples. The filtering core only touches stacks through the narrow
//! [`VoxelAccess`] contract plus [`ops::enlarge`] / [`ops::crop`]; everything
//! else (file formats, metadata, rendering) lives outside this crate.

pub mod io;
pub mod ops;
pub mod stack;
pub mod traits;

pub use self::ops::BorderFill;
pub use self::stack::{BitDepth, VoxelStack};
pub use self::traits::VoxelAccess;
