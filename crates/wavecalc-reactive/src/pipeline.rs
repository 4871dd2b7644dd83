//! Two-input multiply pipeline served as a page fragment.

use wavecalc_config::PanelConfig;

use crate::binding::{bind, Derived};
use crate::component::Component;
use crate::error_context::ErrorContext;
use crate::param::{NumberParam, ParamError, ParamSet};
use crate::widgets::{AlertType, Layout, Template, Widget};

pub struct MultiplyPipeline {
    params: ParamSet,
    result: Derived<f64>,
    errors: ErrorContext,
    title: String,
    sidebar_width: u32,
}

impl MultiplyPipeline {
    pub fn new(config: &PanelConfig) -> Result<Self, ParamError> {
        Self::with_errors(config, ErrorContext::new())
    }

    pub fn with_errors(config: &PanelConfig, errors: ErrorContext) -> Result<Self, ParamError> {
        let mut params = ParamSet::new();
        params.declare(NumberParam::new("value", 0.0).label("Value"))?;
        params.declare(NumberParam::new("multiplier", 1.0).label("Multiplier"))?;

        let result = bind(&mut params, "result", &["value", "multiplier"], &errors, |snap| {
            Ok(wavecalc_common::multiply(snap.require("value")?, snap.require("multiplier")?)?)
        })?;

        Ok(Self {
            params,
            result,
            errors,
            title: config.title.clone(),
            sidebar_width: config.sidebar_width,
        })
    }

    pub fn value(&self) -> f64 {
        self.params.get("value").unwrap_or_default()
    }

    pub fn multiplier(&self) -> f64 {
        self.params.get("multiplier").unwrap_or_default()
    }

    /// Latest product, `None` while the error context holds a failure.
    pub fn result(&self) -> Option<f64> {
        self.result.get()
    }

    pub fn derived(&self) -> &Derived<f64> {
        &self.result
    }

    pub fn view(&self) -> Template {
        let mut controls: Vec<Layout> = self
            .params
            .params()
            .iter()
            .map(|p| Widget::number_input(p).into())
            .collect();

        controls.push(match (self.errors.current(), self.result()) {
            (Some(err), _) => Widget::alert(err.message, AlertType::Danger).into(),
            (None, Some(result)) => Widget::static_text(result).into(),
            (None, None) => Widget::static_text("-").into(),
        });

        Template {
            title: self.title.clone(),
            sidebar_width: self.sidebar_width,
            sidebar: Layout::Column(controls),
            main: Layout::Column(Vec::new()),
        }
    }
}

impl Component for MultiplyPipeline {
    fn name(&self) -> &str {
        "multiply-pipeline"
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<bool, ParamError> {
        self.params.set(name, value)
    }

    fn errors(&self) -> &ErrorContext {
        &self.errors
    }

    fn render_html(&self) -> String {
        self.view().render_html()
    }
}
