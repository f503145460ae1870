//! Core building blocks for affine term-structure models: masked parameters,
//! specification, loading recursion, state-space assembly, Kalman filter,
//! data containers and loading, starting values, options, evaluation
//! bookkeeping, and simulation.
pub mod data;
pub mod guess;
pub mod kalman;
pub mod loader;
pub mod mask;
pub mod options;
pub mod params;
pub mod recursion;
pub mod simulate;
pub mod spec;
pub mod state_space;
pub mod tracker;
