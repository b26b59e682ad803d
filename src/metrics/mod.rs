use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use std::time::Duration;

/// Counters for the runtime loop and the allocation edits it drives.
#[derive(Debug, Default, Clone)]
pub struct WidgetMetrics {
    events: u64,
    renders: u64,
    dirty_zones: u64,
    zone_updates: u64,
    edits: u64,
    corrections: u64,
    recomputes: u64,
}

impl WidgetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_render(&mut self, dirty_count: usize) {
        self.renders = self.renders.saturating_add(1);
        self.dirty_zones = self.dirty_zones.saturating_add(dirty_count as u64);
    }

    pub fn record_zone_updates(&mut self, count: usize) {
        self.zone_updates = self.zone_updates.saturating_add(count as u64);
    }

    /// Count an applied edit; `corrected` when validation changed the request.
    pub fn record_edit(&mut self, corrected: bool) {
        self.edits = self.edits.saturating_add(1);
        if corrected {
            self.corrections = self.corrections.saturating_add(1);
        }
    }

    pub fn record_recompute(&mut self) {
        self.recomputes = self.recomputes.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            renders: self.renders,
            dirty_zones: self.dirty_zones,
            zone_updates: self.zone_updates,
            edits: self.edits,
            corrections: self.corrections,
            recomputes: self.recomputes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub renders: u64,
    pub dirty_zones: u64,
    pub zone_updates: u64,
    pub edits: u64,
    pub corrections: u64,
    pub recomputes: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => LogFields::new(),
        }
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "widget_metrics", self.as_fields())
    }
}
