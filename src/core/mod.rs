pub mod bbox;
pub mod coord;
pub mod direction_cone;
pub mod interaction;
pub mod loader;
pub mod ray;
pub mod rng;
pub mod sampling;
pub mod tagged;
pub mod transform;
