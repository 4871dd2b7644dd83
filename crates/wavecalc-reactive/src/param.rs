//! Numeric parameters and the observer registry that drives recomputation.
//!
//! A [`ParamSet`] owns the declared parameters of one component and a map
//! from parameter name to the watchers that depend on it. Writes that do not
//! change the stored value never notify anyone.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("Unknown parameter: {0}")]
    Unknown(String),

    #[error("Parameter {name} must be finite, got {value}")]
    NonFinite { name: String, value: f64 },

    #[error("Parameter {0} is already declared")]
    Duplicate(String),
}

/// Inclusive range a bounded parameter is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        debug_assert!(min <= max, "bounds [{min}, {max}] are inverted");
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberParam {
    name: &'static str,
    label: &'static str,
    default: f64,
    value: f64,
    bounds: Option<Bounds>,
    step: Option<f64>,
    doc: &'static str,
}

impl NumberParam {
    pub fn new(name: &'static str, default: f64) -> Self {
        Self {
            name,
            label: name,
            default,
            value: default,
            bounds: None,
            step: None,
            doc: "",
        }
    }

    /// Declare bounds; the current and default values are clamped into them.
    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        let bounds = Bounds::new(min, max);
        self.default = bounds.clamp(self.default);
        self.value = bounds.clamp(self.value);
        self.bounds = Some(bounds);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    pub fn name(&self) -> &'static str { self.name }
    pub fn label_text(&self) -> &'static str { self.label }
    pub fn value(&self) -> f64 { self.value }
    pub fn default_value(&self) -> f64 { self.default }
    pub fn bounds(&self) -> Option<Bounds> { self.bounds }
    pub fn step_size(&self) -> Option<f64> { self.step }
    pub fn doc_text(&self) -> &'static str { self.doc }

    /// Clamp (when bounded) and store `value`. Returns whether the stored
    /// value changed.
    pub fn set(&mut self, value: f64) -> Result<bool, ParamError> {
        let value = self.admit(value)?;
        if value == self.value {
            return Ok(false);
        }
        self.value = value;
        Ok(true)
    }

    fn admit(&self, value: f64) -> Result<f64, ParamError> {
        if !value.is_finite() {
            return Err(ParamError::NonFinite { name: self.name.to_string(), value });
        }
        Ok(match self.bounds {
            Some(bounds) => bounds.clamp(value),
            None => value,
        })
    }
}

/// Point-in-time copy of every parameter value, handed to watchers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamSnapshot(BTreeMap<&'static str, f64>);

impl ParamSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<f64, ParamError> {
        self.get(name).ok_or_else(|| ParamError::Unknown(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// `name=value` pairs in name order, e.g. `multiplier=4 value=3`.
impl fmt::Display for ParamSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(u64);

pub type WatchCallback = Box<dyn FnMut(&ParamSnapshot) + Send>;

struct Watcher {
    id: WatcherId,
    callback: WatchCallback,
}

/// Declared parameters plus the name → watcher registry.
#[derive(Default)]
pub struct ParamSet {
    params: Vec<NumberParam>,
    by_param: HashMap<&'static str, BTreeSet<WatcherId>>,
    // Registration order is notification order.
    watchers: Vec<Watcher>,
    next_id: u64,
}

impl fmt::Debug for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSet")
            .field("params", &self.params)
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, param: NumberParam) -> Result<(), ParamError> {
        if self.params.iter().any(|p| p.name == param.name) {
            return Err(ParamError::Duplicate(param.name.to_string()));
        }
        self.params.push(param);
        Ok(())
    }

    pub fn params(&self) -> &[NumberParam] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&NumberParam> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Result<f64, ParamError> {
        self.param(name)
            .map(NumberParam::value)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot(self.params.iter().map(|p| (p.name, p.value)).collect())
    }

    /// Register `callback` to run after any of `deps` changes.
    pub fn watch(
        &mut self,
        deps: &[&str],
        callback: impl FnMut(&ParamSnapshot) + Send + 'static,
    ) -> Result<WatcherId, ParamError> {
        let names = deps
            .iter()
            .map(|dep| self.param(dep).map(|p| p.name).ok_or_else(|| ParamError::Unknown(dep.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        let id = WatcherId(self.next_id);
        self.next_id += 1;
        for name in names {
            self.by_param.entry(name).or_default().insert(id);
        }
        self.watchers.push(Watcher { id, callback: Box::new(callback) });
        Ok(id)
    }

    /// Returns false when `id` was not registered.
    pub fn unwatch(&mut self, id: WatcherId) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|w| w.id != id);
        for ids in self.by_param.values_mut() {
            ids.remove(&id);
        }
        self.watchers.len() != before
    }

    /// Assign one parameter. Watchers of `name` run synchronously when the
    /// stored value changed; returns whether it did.
    pub fn set(&mut self, name: &str, value: f64) -> Result<bool, ParamError> {
        self.update(&[(name, value)])
    }

    /// Assign several parameters, then notify each affected watcher once.
    /// Nothing is written unless every assignment is valid.
    pub fn update(&mut self, assignments: &[(&str, f64)]) -> Result<bool, ParamError> {
        let mut admitted = Vec::with_capacity(assignments.len());
        for (name, value) in assignments {
            let idx = self
                .params
                .iter()
                .position(|p| p.name == *name)
                .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
            admitted.push((idx, self.params[idx].admit(*value)?));
        }

        let mut changed = Vec::new();
        for (idx, value) in admitted {
            let param = &mut self.params[idx];
            if param.set(value)? {
                changed.push(param.name);
            }
        }
        if changed.is_empty() {
            return Ok(false);
        }

        tracing::trace!(params = ?changed, "parameters changed");
        self.notify(&changed);
        Ok(true)
    }

    fn notify(&mut self, changed: &[&'static str]) {
        let triggered: BTreeSet<WatcherId> = changed
            .iter()
            .filter_map(|name| self.by_param.get(name))
            .flatten()
            .copied()
            .collect();
        if triggered.is_empty() {
            return;
        }

        let snapshot = self.snapshot();
        for watcher in self.watchers.iter_mut().filter(|w| triggered.contains(&w.id)) {
            (watcher.callback)(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(&ParamSnapshot) + Send + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let inner = hits.clone();
        (hits, move |_: &ParamSnapshot| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn wave_params() -> ParamSet {
        let mut set = ParamSet::new();
        set.declare(NumberParam::new("frequency", 1.0).bounded(0.1, 5.0)).unwrap();
        set.declare(NumberParam::new("amplitude", 1.0).bounded(0.1, 2.0)).unwrap();
        set.declare(NumberParam::new("label_size", 12.0)).unwrap();
        set
    }

    #[test]
    fn test_bounded_param_clamps_instead_of_rejecting() {
        let mut amplitude = NumberParam::new("amplitude", 1.0).bounded(0.1, 2.0);
        assert!(amplitude.set(10.0).unwrap());
        assert_eq!(amplitude.value(), 2.0);
        assert!(amplitude.set(-3.0).unwrap());
        assert_eq!(amplitude.value(), 0.1);
    }

    #[test]
    fn test_unbounded_param_accepts_any_finite_value() {
        let mut value = NumberParam::new("value", 0.0);
        value.set(-1e12).unwrap();
        assert_eq!(value.value(), -1e12);
        assert!(matches!(value.set(f64::INFINITY), Err(ParamError::NonFinite { .. })));
        assert_eq!(value.value(), -1e12);
    }

    #[test]
    fn test_default_is_clamped_into_bounds() {
        let phase = NumberParam::new("phase", 9.0).bounded(0.0, 6.0);
        assert_eq!(phase.default_value(), 6.0);
        assert_eq!(phase.value(), 6.0);
    }

    #[test]
    fn test_watcher_runs_only_for_its_dependencies() {
        let mut set = wave_params();
        let (hits, cb) = counter();
        set.watch(&["frequency", "amplitude"], cb).unwrap();

        set.set("label_size", 14.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        set.set("frequency", 2.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unchanged_write_is_a_noop() {
        let mut set = wave_params();
        let (hits, cb) = counter();
        set.watch(&["amplitude"], cb).unwrap();

        assert!(!set.set("amplitude", 1.0).unwrap());
        set.set("amplitude", 10.0).unwrap();
        // 10.0 clamps to 2.0, which is already stored.
        assert!(!set.set("amplitude", 50.0).unwrap());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_batch_update_notifies_once() {
        let mut set = wave_params();
        let (hits, cb) = counter();
        set.watch(&["frequency", "amplitude"], cb).unwrap();

        set.update(&[("frequency", 3.0), ("amplitude", 0.5)]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_batch_update_is_all_or_nothing() {
        let mut set = wave_params();
        let err = set.update(&[("frequency", 3.0), ("nope", 1.0)]).unwrap_err();
        assert_eq!(err, ParamError::Unknown("nope".into()));
        assert_eq!(set.get("frequency").unwrap(), 1.0);
    }

    #[test]
    fn test_watch_unknown_param_fails() {
        let mut set = wave_params();
        let (_, cb) = counter();
        assert!(matches!(set.watch(&["phase"], cb), Err(ParamError::Unknown(_))));
    }

    #[test]
    fn test_unwatch_stops_notifications() {
        let mut set = wave_params();
        let (hits, cb) = counter();
        let id = set.watch(&["frequency"], cb).unwrap();
        assert!(set.unwatch(id));
        assert!(!set.unwatch(id));
        set.set("frequency", 4.0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_watcher_sees_post_write_snapshot() {
        let mut set = wave_params();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = seen.clone();
        set.watch(&["frequency"], move |snap: &ParamSnapshot| {
            *sink.lock().unwrap() = snap.get("frequency");
        })
        .unwrap();
        set.set("frequency", 4.5).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(4.5));
    }

    #[test]
    fn test_snapshot_displays_name_value_pairs() {
        let mut set = wave_params();
        set.set("frequency", 2.5).unwrap();
        assert_eq!(set.snapshot().to_string(), "amplitude=1 frequency=2.5 label_size=12");
        assert_eq!(ParamSnapshot::default().to_string(), "");
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut set = wave_params();
        assert_eq!(
            set.declare(NumberParam::new("frequency", 2.0)),
            Err(ParamError::Duplicate("frequency".into()))
        );
    }
}
