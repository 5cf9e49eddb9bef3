//! Event types and sinks for observing driver runs.
//!
//! This module defines [`DriverEvent`] and a set of sinks to emit, collect, or forward
//! events while executing a [`crate::driver::plan::DriverPlan`] via
//! [`crate::driver::pipeline::DriverPipeline`].
use chrono::NaiveDate;

use crate::fieldgraph::spec::FieldSemantics;

/// Describes events emitted by driver runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum DriverEvent {
    /// Emitted when a run starts for a plan.
    RunStarted {
        driver: String,
        task_date: NaiveDate,
        /// Number of weighted categories in the plan.
        category_count: usize,
    },

    /// Emitted once per run when the freshness bound is not enforced.
    FreshnessCheckSkipped { task_date: NaiveDate, cutoff: NaiveDate },

    /// Emitted for every presence layer resolved during pre-flight.
    InputResolved {
        key: String,
        /// Effective date of a time-stamped asset; `None` for static data.
        effective_date: Option<NaiveDate>,
    },

    /// Emitted when the primary categories are unavailable and the run uses fill
    /// categories only.
    FallbackApplied {
        driver: String,
        categories: Vec<String>,
    },

    /// A category has no features anywhere in the run extent.
    CategoryEmpty { key: String },

    /// Emitted after a merged direct or indirect field was baked.
    FieldBaked {
        field: String,
        semantics: FieldSemantics,
        nonzero_cells: usize,
    },

    /// Emitted when the driver raster is complete.
    RunFinished {
        driver: String,
        defined_cells: usize,
        max_value: Option<f32>,
    },

    /// Emitted after the raster was handed to the exporter.
    Exported { destination: String },

    /// Non-fatal warning.
    Warning { context: String, message: String },
}

/// Discriminant of [`DriverEvent`], used by sinks to opt out of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverEventKind {
    RunStarted,
    FreshnessCheckSkipped,
    InputResolved,
    FallbackApplied,
    CategoryEmpty,
    FieldBaked,
    RunFinished,
    Exported,
    Warning,
}

impl DriverEvent {
    pub fn kind(&self) -> DriverEventKind {
        match self {
            DriverEvent::RunStarted { .. } => DriverEventKind::RunStarted,
            DriverEvent::FreshnessCheckSkipped { .. } => DriverEventKind::FreshnessCheckSkipped,
            DriverEvent::InputResolved { .. } => DriverEventKind::InputResolved,
            DriverEvent::FallbackApplied { .. } => DriverEventKind::FallbackApplied,
            DriverEvent::CategoryEmpty { .. } => DriverEventKind::CategoryEmpty,
            DriverEvent::FieldBaked { .. } => DriverEventKind::FieldBaked,
            DriverEvent::RunFinished { .. } => DriverEventKind::RunFinished,
            DriverEvent::Exported { .. } => DriverEventKind::Exported,
            DriverEvent::Warning { .. } => DriverEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`DriverEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: DriverEvent);

    /// Whether the sink wants events of `kind`; emitters skip building unwanted events.
    #[inline]
    fn wants(&self, _kind: DriverEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = DriverEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: DriverEvent) {}

    #[inline]
    fn wants(&self, _kind: DriverEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(DriverEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(DriverEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(DriverEvent),
{
    #[inline]
    fn send(&mut self, event: DriverEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<DriverEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<DriverEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[DriverEvent] {
        &self.events
    }

    /// Number of collected events of `kind`.
    pub fn count(&self, kind: DriverEventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: DriverEvent) {
        self.events.push(event);
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sinks
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn wants(&self, kind: DriverEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }

    fn send(&mut self, event: DriverEvent) {
        let kind = event.kind();
        let Some(last_idx) = self.sinks.iter().rposition(|s| s.wants(kind)) else {
            return;
        };
        for i in 0..last_idx {
            if self.sinks[i].wants(kind) {
                self.sinks[i].send(event.clone());
            }
        }
        self.sinks[last_idx].send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> DriverEvent {
        DriverEvent::Warning {
            context: context.into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::with_capacity(2);
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(DriverEvent::CategoryEmpty {
            key: "railway_tram".into(),
        });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.count(DriverEventKind::CategoryEmpty), 1);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![VecSink::new(), VecSink::new()]);
        assert!(multi.wants(DriverEventKind::Warning));
        multi.send(warning("ctx"));
        let sinks = multi.into_inner();
        assert_eq!(sinks[0].len(), 1);
        assert_eq!(sinks[1].len(), 1);
        assert!(matches!(sinks[0].as_slice()[0], DriverEvent::Warning { .. }));
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!EventSink::wants(&(), DriverEventKind::RunStarted));
        let empty: MultiSink<VecSink> = MultiSink::default();
        assert!(!empty.wants(DriverEventKind::RunStarted));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        {
            let mut sink = FnSink::new(|_event| {
                count += 1;
            });
            sink.send_many(vec![warning("a"), warning("b")]);
        }
        assert_eq!(count, 2);
    }
}
