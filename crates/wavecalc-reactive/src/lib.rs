//! wavecalc-reactive: parameterized components whose derived output is
//! recomputed synchronously whenever a watched input changes.
//!
//!   - `param`         bounded numeric parameters and the observer registry
//!   - `binding`       derivations bound to parameters, run inside tracing spans
//!   - `error_context` per-session single-slot error holder
//!   - `datashade`     curve rasterization with an explicit fallback
//!   - `widgets`       layout model rendered to HTML fragments
//!   - `pipeline`, `sine_wave`  the two shipped components

pub mod param;
pub mod binding;
pub mod error_context;
pub mod datashade;
pub mod widgets;
pub mod component;
pub mod pipeline;
pub mod sine_wave;

pub use binding::{bind, ComputeError, Derived};
pub use component::Component;
pub use error_context::{ErrorContext, ErrorRecord};
pub use param::{Bounds, NumberParam, ParamError, ParamSet, ParamSnapshot, WatcherId};
pub use pipeline::MultiplyPipeline;
pub use sine_wave::SineWave;
