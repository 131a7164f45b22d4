//! Geometry and sampling core of a path tracer.
//!
//! Shapes, samplers, filters and float textures are closed sets of concrete types wrapped in
//! enums. Calls on them compile to a match over the variant, and shapes are referenced through
//! copyable [`core::tagged::Handle`]s into an [`core::tagged::Arena`].

pub mod core;
pub mod estimate;
pub mod filter;
pub mod loader;
pub mod sampler;
pub mod shape;
pub mod texture;
