//! Layout model for component views, rendered to HTML fragments.
//!
//! Inputs carry a `data-param` attribute naming the parameter they edit; the
//! session autoload script uses it to send changes back to the server.

use std::fmt::Write as _;

use serde::Serialize;

use crate::datashade::{Curve, Plot, Raster};
use crate::param::NumberParam;

const DEFAULT_PLOT_SIZE: (u32, u32) = (400, 300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Danger,
    Warning,
    Info,
}

impl AlertType {
    fn css(self) -> &'static str {
        match self {
            AlertType::Danger => "alert-danger",
            AlertType::Warning => "alert-warning",
            AlertType::Info => "alert-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Markdown { text: String },
    NumberInput { name: String, param: &'static str, value: f64, step: Option<f64> },
    FloatSlider { name: String, param: &'static str, value: f64, start: f64, end: f64, step: f64 },
    StaticText { value: String },
    Alert { message: String, alert_type: AlertType },
    Plot { plot: Plot },
}

impl Widget {
    pub fn markdown(text: impl Into<String>) -> Self {
        Widget::Markdown { text: text.into() }
    }

    pub fn static_text(value: impl ToString) -> Self {
        Widget::StaticText { value: value.to_string() }
    }

    pub fn alert(message: impl Into<String>, alert_type: AlertType) -> Self {
        Widget::Alert { message: message.into(), alert_type }
    }

    pub fn number_input(param: &NumberParam) -> Self {
        Widget::NumberInput {
            name: param.label_text().to_string(),
            param: param.name(),
            value: param.value(),
            step: param.step_size(),
        }
    }

    /// Slider over the parameter's bounds; unbounded parameters get a number
    /// input instead.
    pub fn float_slider(param: &NumberParam) -> Self {
        match param.bounds() {
            Some(bounds) => Widget::FloatSlider {
                name: param.label_text().to_string(),
                param: param.name(),
                value: param.value(),
                start: bounds.min,
                end: bounds.max,
                step: param.step_size().unwrap_or(0.1),
            },
            None => Self::number_input(param),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Widget::Markdown { text } => render_markdown(text, out),
            Widget::NumberInput { name, param, value, step } => {
                let step = step.map_or_else(|| "any".to_string(), |s| s.to_string());
                let _ = write!(
                    out,
                    r#"<label class="widget number-input">{}<input type="number" data-param="{}" value="{}" step="{}"></label>"#,
                    escape(name), param, value, step
                );
            }
            Widget::FloatSlider { name, param, value, start, end, step } => {
                let _ = write!(
                    out,
                    r#"<label class="widget float-slider">{}: <output>{:.2}</output><input type="range" data-param="{}" value="{}" min="{}" max="{}" step="{}"></label>"#,
                    escape(name), value, param, value, start, end, step
                );
            }
            Widget::StaticText { value } => {
                let _ = write!(out, r#"<div class="widget static-text">{}</div>"#, escape(value));
            }
            Widget::Alert { message, alert_type } => {
                let _ = write!(
                    out,
                    r#"<div class="alert {}" role="alert">{}</div>"#,
                    alert_type.css(),
                    escape(message)
                );
            }
            Widget::Plot { plot } => render_plot(plot, out),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", content = "children", rename_all = "snake_case")]
pub enum Layout {
    Column(Vec<Layout>),
    Row(Vec<Layout>),
    Widget(Widget),
}

impl From<Widget> for Layout {
    fn from(widget: Widget) -> Self {
        Layout::Widget(widget)
    }
}

impl Layout {
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        match self {
            Layout::Column(children) => render_children("column", children, out),
            Layout::Row(children) => render_children("row", children, out),
            Layout::Widget(widget) => widget.render(out),
        }
    }

    /// Depth-first search for the first widget matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Widget) -> bool) -> Option<&Widget> {
        match self {
            Layout::Column(children) | Layout::Row(children) => {
                children.iter().find_map(|child| child.find(pred))
            }
            Layout::Widget(widget) => pred(widget).then_some(widget),
        }
    }
}

fn render_children(class: &str, children: &[Layout], out: &mut String) {
    let _ = write!(out, r#"<div class="{class}">"#);
    for child in children {
        child.render(out);
    }
    out.push_str("</div>");
}

/// Page chrome with a fixed-width sidebar holding the controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub title: String,
    pub sidebar_width: u32,
    pub sidebar: Layout,
    pub main: Layout,
}

impl Template {
    pub fn render_html(&self) -> String {
        format!(
            r#"<div class="template"><header class="template-header"><h1>{}</h1></header><div class="template-body"><aside class="sidebar" style="width:{}px">{}</aside><main class="main">{}</main></div></div>"#,
            escape(&self.title),
            self.sidebar_width,
            self.sidebar.render_html(),
            self.main.render_html(),
        )
    }
}

fn render_markdown(text: &str, out: &mut String) {
    out.push_str(r#"<div class="widget markdown">"#);
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let level = line.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&level) && line[level..].starts_with(' ') {
            let _ = write!(out, "<h{level}>{}</h{level}>", escape(line[level..].trim()));
        } else {
            let _ = write!(out, "<p>{}</p>", escape(line));
        }
    }
    out.push_str("</div>");
}

fn render_plot(plot: &Plot, out: &mut String) {
    match plot {
        Plot::Curve(curve) => render_curve(curve, out),
        Plot::Raster(raster) => render_raster(raster, out),
    }
}

fn render_curve(curve: &Curve, out: &mut String) {
    let width = curve.width.unwrap_or(DEFAULT_PLOT_SIZE.0);
    let height = curve.height.unwrap_or(DEFAULT_PLOT_SIZE.1);
    let _ = write!(
        out,
        r#"<svg class="widget plot" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    if !curve.is_empty() {
        let (x_lo, x_hi) = finite_range(&curve.xs);
        let (y_lo, y_hi) = finite_range(&curve.ys);
        out.push_str(r#"<polyline fill="none" stroke="currentColor" stroke-width="2" points=""#);
        for (x, y) in curve.points().filter(|(x, y)| x.is_finite() && y.is_finite()) {
            let px = (x - x_lo) / (x_hi - x_lo) * f64::from(width);
            let py = (y_hi - y) / (y_hi - y_lo) * f64::from(height);
            let _ = write!(out, "{px:.1},{py:.1} ");
        }
        out.push_str(r#""/>"#);
    }
    out.push_str("</svg>");
}

fn render_raster(raster: &Raster, out: &mut String) {
    let (width, height) = (raster.width, raster.height);
    let max = f64::from(raster.max_count().max(1));
    let _ = write!(
        out,
        r#"<svg class="widget plot raster" width="{width}" height="{height}" viewBox="0 0 {width} {height}" shape-rendering="crispEdges">"#
    );
    for row in 0..height {
        for col in 0..width {
            let count = raster.count(col, row);
            if count > 0 {
                let opacity = (0.25 + 0.75 * f64::from(count) / max).min(1.0);
                let _ = write!(
                    out,
                    r#"<rect x="{col}" y="{row}" width="1" height="1" fill-opacity="{opacity:.2}"/>"#
                );
            }
        }
    }
    out.push_str("</svg>");
}

fn finite_range(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if hi > lo { (lo, hi) } else if lo.is_finite() { (lo - 0.5, lo + 0.5) } else { (0.0, 1.0) }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
