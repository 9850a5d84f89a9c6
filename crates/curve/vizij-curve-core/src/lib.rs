//! Vizij Curve Core (engine-agnostic)
//!
//! Keyframe curves for scalar animation channels. Two representations cooperate:
//! - [`EditableCurve`]: sorted keyframes addressed through stable [`KeyHandle`]s, with
//!   tangent auto-computation, redundant-key removal, baking and time-range edits.
//! - [`CompressedCurve`]: an immutable packed encoding built once from an editable curve,
//!   evaluated through a format-specialised dispatch table.
//!
//! Evaluation on either representation is read-only and may run on many threads at once;
//! mutation of an [`EditableCurve`] is single-writer.

pub mod baking;
pub mod compressed;
pub mod config;
pub mod curve;
pub mod error;
pub mod handles;
pub mod interp;
pub mod keyframe;
pub mod sampling;

// Re-exports for consumers (adapters)
pub use baking::{bake_samples, export_baked_json, BakedCurve, BakingConfig, MAX_BAKED_KEYS};
pub use compressed::{
    static_eval, CompressedCurve, CompressionFormat, KeyTimeFormat, NumKeysOrConstant,
    UNSET_DEFAULT_VALUE,
};
pub use config::{CompressionSettings, CurveSettings};
pub use curve::EditableCurve;
pub use error::CurveError;
pub use handles::{KeyHandle, KeyHandleLookupTable, KeyHandleMap};
pub use keyframe::{
    Extrapolation, InfinityExtrap, InterpMode, Keyframe, TangentMode, TangentWeightMode,
};

/// Curve result type
pub type Result<T> = core::result::Result<T, CurveError>;
