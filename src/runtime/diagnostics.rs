use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::WidgetMetrics;

use super::{EventFlow, RoomPlugin, RuntimeContext, RuntimeEvent};

/// Logs the input the runtime receives, for replaying odd sessions.
pub struct LifecycleLoggerPlugin {
    logger: Logger,
    level: LogLevel,
    log_keys: bool,
    log_ticks: bool,
}

impl LifecycleLoggerPlugin {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_keys: true,
            log_ticks: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_keys(mut self, enabled: bool) -> Self {
        self.log_keys = enabled;
        self
    }

    pub fn log_ticks(mut self, enabled: bool) -> Self {
        self.log_ticks = enabled;
        self
    }

    fn emit(&self, message: &str, fields: impl IntoIterator<Item = (String, serde_json::Value)>) {
        let event = event_with_fields(self.level, "room::runtime.lifecycle", message, fields);
        let _ = self.logger.log_event(event);
    }
}

impl RoomPlugin for LifecycleLoggerPlugin {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.emit(
            "plugin_initialized",
            [json_kv("logger_level", json!(format!("{:?}", self.level)))],
        );
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Key(key) if self.log_keys => self.emit(
                "event.key",
                [
                    json_kv("code", json!(format!("{:?}", key.code))),
                    json_kv("modifiers", json!(format!("{:?}", key.modifiers))),
                ],
            ),
            RuntimeEvent::Paste(data) => {
                self.emit("event.paste", [json_kv("chars", json!(data.chars().count()))])
            }
            RuntimeEvent::Tick { elapsed } if self.log_ticks => self.emit(
                "event.tick",
                [json_kv("elapsed_ms", json!(elapsed.as_millis() as u64))],
            ),
            RuntimeEvent::FocusGained => self.emit("event.focus_gained", std::iter::empty()),
            RuntimeEvent::FocusLost => self.emit("event.focus_lost", std::iter::empty()),
            RuntimeEvent::Resize(size) => self.emit(
                "event.resize",
                [
                    json_kv("width", json!(size.width)),
                    json_kv("height", json!(size.height)),
                ],
            ),
            _ => {}
        }

        Ok(EventFlow::Continue)
    }
}

/// Emits a metrics snapshot on ticks, at most once per interval.
pub struct MetricsSnapshotPlugin {
    logger: Logger,
    metrics: Arc<Mutex<WidgetMetrics>>,
    target: String,
    interval: Duration,
    last_emit: Option<Instant>,
    started_at: Instant,
}

impl MetricsSnapshotPlugin {
    pub fn new(logger: Logger, metrics: Arc<Mutex<WidgetMetrics>>) -> Self {
        Self {
            logger,
            metrics,
            target: "room::runtime.metrics".to_string(),
            interval: Duration::from_secs(5),
            last_emit: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    fn emit_snapshot(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.interval {
                return;
            }
        }
        self.last_emit = Some(now);

        if let Ok(guard) = self.metrics.lock() {
            let event = guard
                .snapshot(now.duration_since(self.started_at))
                .to_log_event(&self.target);
            let _ = self.logger.log_event(event);
        }
    }
}

impl RoomPlugin for MetricsSnapshotPlugin {
    fn name(&self) -> &str {
        "diagnostics.metrics_snapshot"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.started_at = Instant::now();
        self.last_emit = None;
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        if matches!(event, RuntimeEvent::Tick { .. }) {
            self.emit_snapshot();
        }
        Ok(EventFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::{AnsiRenderer, Direction, LayoutNode, LayoutTree, RoomRuntime, Size};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn runtime() -> RoomRuntime {
        let layout = LayoutTree::new(LayoutNode::container(
            "root",
            Direction::Column,
            Vec::new(),
            vec![LayoutNode::leaf("body")],
        ));
        RoomRuntime::new(layout, AnsiRenderer::with_default(), Size::new(10, 2)).unwrap()
    }

    #[test]
    fn lifecycle_logger_records_keys_and_resizes() {
        let sink = MemorySink::new();
        let mut runtime = runtime();
        runtime.register_plugin(LifecycleLoggerPlugin::new(Logger::new(sink.clone())));

        let mut output = Vec::new();
        runtime
            .run_scripted(
                &mut output,
                [
                    RuntimeEvent::Key(KeyEvent::new(KeyCode::Char('+'), KeyModifiers::NONE)),
                    RuntimeEvent::Resize(Size::new(12, 3)),
                ],
            )
            .unwrap();

        assert_eq!(
            sink.messages(),
            vec!["plugin_initialized", "event.key", "event.resize"]
        );
    }

    #[test]
    fn metrics_snapshot_is_throttled() {
        let sink = MemorySink::new();
        let metrics = Arc::new(Mutex::new(WidgetMetrics::new()));
        let mut runtime = runtime();
        runtime.register_plugin(
            MetricsSnapshotPlugin::new(Logger::new(sink.clone()), metrics)
                .with_interval(Duration::from_secs(3600)),
        );

        let tick = RuntimeEvent::Tick {
            elapsed: Duration::from_millis(10),
        };
        let mut output = Vec::new();
        runtime
            .run_scripted(&mut output, [tick.clone(), tick.clone(), tick])
            .unwrap();

        assert_eq!(sink.messages(), vec!["widget_metrics"]);
    }
}
