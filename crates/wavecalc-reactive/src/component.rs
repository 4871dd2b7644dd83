//! The seam between a reactive component and whatever hosts it.

use crate::error_context::ErrorContext;
use crate::param::{ParamError, ParamSet};

/// A parameterized object with a renderable view. Hosts drive it through
/// `set_param` and re-render after every change.
pub trait Component: Send {
    fn name(&self) -> &str;

    fn params(&self) -> &ParamSet;

    /// Returns whether the value changed (and so whether anything recomputed).
    fn set_param(&mut self, name: &str, value: f64) -> Result<bool, ParamError>;

    fn errors(&self) -> &ErrorContext;

    fn render_html(&self) -> String;
}
