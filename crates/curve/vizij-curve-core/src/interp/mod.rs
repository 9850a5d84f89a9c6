//! Interpolation helpers shared by the editable and compressed evaluators.
//!
//! Scalar lerp, de Casteljau Bezier, the per-segment rule used by every evaluator,
//! and the automatic tangent estimator.

pub mod functions;

pub use functions::{auto_tangent, bezier_interp, eval_segment, lerp_f32, unwind_degrees};
