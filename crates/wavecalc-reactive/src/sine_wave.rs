//! Interactive sine wave: three bounded parameters and a datashaded curve.

use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use wavecalc_config::WaveConfig;

use crate::binding::{bind, ComputeError, Derived};
use crate::component::Component;
use crate::datashade::{apply_datashader, linspace, Curve, LineRasterizer, Plot, Rasterizer, Shaded};
use crate::error_context::ErrorContext;
use crate::param::{NumberParam, ParamError, ParamSet};
use crate::widgets::{AlertType, Layout, Widget};

const WAVE_PARAMS: [&str; 3] = ["frequency", "amplitude", "phase"];

/// `amplitude * sin(2π·frequency·x + phase)`
pub fn sine(x: f64, frequency: f64, amplitude: f64, phase: f64) -> f64 {
    amplitude * (TAU * frequency * x + phase).sin()
}

pub struct SineWave {
    params: ParamSet,
    plot: Derived<Shaded>,
    errors: ErrorContext,
}

impl SineWave {
    /// Uses the line rasterizer when `config.datashade` is set, otherwise
    /// always renders the plain curve.
    pub fn new(config: &WaveConfig) -> Result<Self, ParamError> {
        let rasterizer: Option<Arc<dyn Rasterizer>> =
            config.datashade.then(|| Arc::new(LineRasterizer) as Arc<dyn Rasterizer>);
        Self::build(config, rasterizer, ErrorContext::new())
    }

    pub fn with_rasterizer(
        config: &WaveConfig,
        rasterizer: Arc<dyn Rasterizer>,
        errors: ErrorContext,
    ) -> Result<Self, ParamError> {
        Self::build(config, Some(rasterizer), errors)
    }

    fn build(
        config: &WaveConfig,
        rasterizer: Option<Arc<dyn Rasterizer>>,
        errors: ErrorContext,
    ) -> Result<Self, ParamError> {
        let mut params = ParamSet::new();
        params.declare(
            NumberParam::new("frequency", 1.0)
                .bounded(0.1, 5.0)
                .step(0.1)
                .label("Frequency")
                .doc("Wave frequency"),
        )?;
        params.declare(
            NumberParam::new("amplitude", 1.0)
                .bounded(0.1, 2.0)
                .step(0.1)
                .label("Amplitude")
                .doc("Wave amplitude"),
        )?;
        params.declare(
            NumberParam::new("phase", 0.0)
                .bounded(0.0, 2.0 * PI)
                .step(0.1)
                .label("Phase")
                .doc("Phase shift"),
        )?;

        let xs = linspace(config.x_min, config.x_max, config.samples);
        let (width, height) = (config.width, config.height);

        let plot = bind(&mut params, "sine_curve", &WAVE_PARAMS, &errors, move |snap| {
            let frequency = snap.require("frequency")?;
            let amplitude = snap.require("amplitude")?;
            let phase = snap.require("phase")?;

            let ys: Vec<f64> = xs.iter().map(|x| sine(*x, frequency, amplitude, phase)).collect();
            if let Some(bad) = ys.iter().position(|y| !y.is_finite()) {
                return Err(ComputeError::Failed(format!("sample {bad} is not finite")));
            }

            let curve = Curve::new(xs.clone(), ys);
            Ok(match &rasterizer {
                Some(rasterizer) => apply_datashader(curve, rasterizer.as_ref(), width, height),
                None => Shaded { plot: Plot::Curve(curve.with_size(width, height)), fallback: None },
            })
        })?;

        Ok(Self { params, plot, errors })
    }

    pub fn frequency(&self) -> f64 {
        self.params.get("frequency").unwrap_or_default()
    }

    pub fn amplitude(&self) -> f64 {
        self.params.get("amplitude").unwrap_or_default()
    }

    pub fn phase(&self) -> f64 {
        self.params.get("phase").unwrap_or_default()
    }

    /// Evaluate the wave at one `x` with the current parameters.
    pub fn sample(&self, x: f64) -> f64 {
        sine(x, self.frequency(), self.amplitude(), self.phase())
    }

    pub fn plot(&self) -> Option<Shaded> {
        self.plot.get()
    }

    pub fn derived(&self) -> &Derived<Shaded> {
        &self.plot
    }

    pub fn view(&self) -> Layout {
        let sliders: Vec<Layout> = self
            .params
            .params()
            .iter()
            .map(|p| Widget::float_slider(p).into())
            .collect();

        let output: Layout = match (self.errors.current(), self.plot()) {
            (Some(err), _) => Widget::alert(err.message, AlertType::Danger).into(),
            (None, Some(shaded)) => Widget::Plot { plot: shaded.plot }.into(),
            (None, None) => Widget::static_text("No data").into(),
        };

        Layout::Column(vec![
            Widget::markdown("## Interactive Sine Wave").into(),
            Layout::Row(vec![Layout::Column(sliders), output]),
        ])
    }
}

impl Component for SineWave {
    fn name(&self) -> &str {
        "sine-wave"
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
