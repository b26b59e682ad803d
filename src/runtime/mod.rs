use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use serde_json::json;

use crate::logging::{event_with_fields, json_kv};
use crate::{
    AnsiRenderer, LayoutTree, LogLevel, Logger, Rect, Result, Size, WidgetMetrics, ZoneRegistry,
};

pub mod diagnostics;
pub mod driver;
pub mod focus;

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Counters shared with plugins and the allocation controller.
    pub metrics: Option<Arc<Mutex<WidgetMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "room::runtime.metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(WidgetMetrics::new())));
        }
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<WidgetMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Events delivered to plugins.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Paste(String),
    FocusGained,
    FocusLost,
    Resize(Size),
}

/// Whether later plugins still see an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Handle given to plugins during a hook. Updates are queued and applied
/// once the hook returns.
pub struct RuntimeContext<'a> {
    rects: &'a HashMap<String, Rect>,
    zone_updates: Vec<(String, String)>,
    redraw_requested: bool,
    exit_requested: bool,
    cursor_hint: Option<(u16, u16)>,
}

impl<'a> RuntimeContext<'a> {
    fn new(rects: &'a HashMap<String, Rect>) -> Self {
        Self {
            rects,
            zone_updates: Vec::new(),
            redraw_requested: false,
            exit_requested: false,
            cursor_hint: None,
        }
    }

    pub fn set_zone(&mut self, zone_id: impl Into<String>, content: impl Into<String>) {
        self.zone_updates.push((zone_id.into(), content.into()));
        self.redraw_requested = true;
    }

    pub fn request_render(&mut self) {
        self.redraw_requested = true;
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn set_cursor_hint(&mut self, row: u16, col: u16) {
        self.cursor_hint = Some((row, col));
    }

    pub fn rect(&self, zone_id: &str) -> Option<&Rect> {
        self.rects.get(zone_id)
    }

    /// True when the layout knows `zone_id`; writes to unknown zones fail.
    pub fn has_zone(&self, zone_id: &str) -> bool {
        self.rects.contains_key(zone_id)
    }

    fn into_outcome(self) -> ContextOutcome {
        ContextOutcome {
            zone_updates: self.zone_updates,
            redraw_requested: self.redraw_requested,
            exit_requested: self.exit_requested,
            cursor_hint: self.cursor_hint,
        }
    }
}

struct ContextOutcome {
    zone_updates: Vec<(String, String)>,
    redraw_requested: bool,
    exit_requested: bool,
    cursor_hint: Option<(u16, u16)>,
}

/// Behaviour injection point for the runtime.
pub trait RoomPlugin: Send {
    fn name(&self) -> &str {
        "room_plugin"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        _event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }

    fn before_render(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Plugins with priorities; lower priorities see events first.
#[derive(Default)]
pub struct PluginBundle {
    entries: Vec<(i32, Box<dyn RoomPlugin>)>,
}

impl PluginBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin<P>(mut self, plugin: P, priority: i32) -> Self
    where
        P: RoomPlugin + 'static,
    {
        self.entries.push((priority, Box::new(plugin)));
        self
    }

    pub fn register_into(self, runtime: &mut RoomRuntime) {
        runtime.register_bundle(self);
    }
}

pub struct RoomRuntime {
    layout: LayoutTree,
    rects: HashMap<String, Rect>,
    registry: ZoneRegistry,
    renderer: AnsiRenderer,
    plugins: Vec<(i32, Box<dyn RoomPlugin>)>,
    config: RuntimeConfig,
    should_exit: bool,
    redraw_requested: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl RoomRuntime {
    pub fn new(layout: LayoutTree, renderer: AnsiRenderer, initial_size: Size) -> Result<Self> {
        let mut registry = ZoneRegistry::new();
        let rects = layout.solve(initial_size)?;
        registry.sync_layout(&rects);

        Ok(Self {
            layout,
            rects,
            registry,
            renderer,
            plugins: Vec::new(),
            config: RuntimeConfig::default(),
            should_exit: false,
            redraw_requested: true,
            start_instant: None,
            last_metrics_emit: None,
        })
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn register_plugin<P>(&mut self, plugin: P)
    where
        P: RoomPlugin + 'static,
    {
        self.insert_plugin(0, Box::new(plugin));
    }

    pub fn register_bundle(&mut self, bundle: PluginBundle) {
        for (priority, plugin) in bundle.entries {
            self.insert_plugin(priority, plugin);
        }
    }

    fn insert_plugin(&mut self, priority: i32, plugin: Box<dyn RoomPlugin>) {
        // stable: equal priorities keep registration order
        let at = self.plugins.partition_point(|(p, _)| *p <= priority);
        self.plugins.insert(at, (priority, plugin));
    }

    /// Last content written to a zone.
    pub fn zone_content(&self, zone_id: &str) -> Option<&str> {
        self.registry.content_of(zone_id)
    }

    pub fn resize(&mut self, size: Size) -> Result<()> {
        self.rects = self.layout.solve(size)?;
        self.registry.sync_layout(&self.rects);
        self.redraw_requested = true;
        self.log_runtime_event(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        Ok(())
    }

    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.bootstrap(stdout)?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                if let Some(runtime_event) = self.map_event(event::read()?)? {
                    self.dispatch_event(runtime_event)?;
                    self.render_if_needed(stdout)?;
                }
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch_event(RuntimeEvent::Tick { elapsed })?;
                self.render_if_needed(stdout)?;
            }
        }

        self.finalize();
        Ok(())
    }

    /// Drive the runtime from a fixed event list; no terminal involved.
    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.bootstrap(stdout)?;
        for event in events {
            if let RuntimeEvent::Resize(size) = event {
                self.resize(size)?;
            }
            self.dispatch_event(event)?;
            self.render_if_needed(stdout)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize();
        Ok(())
    }

    fn dispatch_event(&mut self, event: RuntimeEvent) -> Result<()> {
        let mut consumed = false;
        for idx in 0..self.plugins.len() {
            let (flow, outcome) = {
                let plugin = &mut self.plugins[idx].1;
                let mut ctx = RuntimeContext::new(&self.rects);
                let flow = plugin.on_event(&mut ctx, &event)?;
                (flow, ctx.into_outcome())
            };
            self.apply_outcome(outcome)?;
            if flow == EventFlow::Consumed {
                consumed = true;
                break;
            }
        }
        self.with_metrics(|metrics| metrics.record_event());
        self.log_runtime_event(
            LogLevel::Trace,
            "event_dispatched",
            [
                json_kv("event", json!(Self::describe_event(&event))),
                json_kv("consumed", json!(consumed)),
            ],
        );
        self.maybe_emit_metrics();
        Ok(())
    }

    fn render_if_needed(&mut self, stdout: &mut impl Write) -> Result<()> {
        if !self.redraw_requested {
            return Ok(());
        }
        self.redraw_requested = false;

        for idx in 0..self.plugins.len() {
            let outcome = {
                let plugin = &mut self.plugins[idx].1;
                let mut ctx = RuntimeContext::new(&self.rects);
                plugin.before_render(&mut ctx)?;
                ctx.into_outcome()
            };
            self.apply_outcome(outcome)?;
        }
        self.redraw_requested = false;

        let dirty = self.registry.take_dirty();
        if dirty.is_empty() {
            return Ok(());
        }
        self.renderer.render(stdout, &dirty)?;
        self.with_metrics(|metrics| metrics.record_render(dirty.len()));
        self.log_runtime_event(
            LogLevel::Debug,
            "render_completed",
            [json_kv("dirty_zones", json!(dirty.len()))],
        );
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: ContextOutcome) -> Result<()> {
        let ContextOutcome {
            zone_updates,
            redraw_requested,
            exit_requested,
            cursor_hint,
        } = outcome;

        if !zone_updates.is_empty() {
            let count = zone_updates.len();
            for (zone, content) in zone_updates {
                self.registry.apply_content(&zone, content)?;
            }
            self.with_metrics(|metrics| metrics.record_zone_updates(count));
        }

        if redraw_requested {
            self.redraw_requested = true;
        }

        if let Some(cursor) = cursor_hint {
            self.renderer.settings_mut().restore_cursor = Some(cursor);
        }

        if exit_requested && !self.should_exit {
            self.should_exit = true;
            self.log_runtime_event(LogLevel::Info, "exit_requested", std::iter::empty());
        }

        Ok(())
    }

    fn map_event(&mut self, event: CrosstermEvent) -> Result<Option<RuntimeEvent>> {
        let mapped = match event {
            CrosstermEvent::Key(key) => RuntimeEvent::Key(key),
            CrosstermEvent::Paste(data) => RuntimeEvent::Paste(data),
            CrosstermEvent::FocusGained => RuntimeEvent::FocusGained,
            CrosstermEvent::FocusLost => RuntimeEvent::FocusLost,
            CrosstermEvent::Resize(width, height) => {
                let size = Size::new(width, height);
                self.resize(size)?;
                RuntimeEvent::Resize(size)
            }
            CrosstermEvent::Mouse(_) => return Ok(None),
        };
        Ok(Some(mapped))
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        self.redraw_requested = true;
        if self.config.metrics.is_none() && !self.config.metrics_interval.is_zero() {
            self.config.enable_metrics();
        }
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("plugins", json!(self.plugins.len())),
                json_kv("zones", json!(self.rects.len())),
            ],
        );

        for idx in 0..self.plugins.len() {
            let (name, outcome) = {
                let plugin = &mut self.plugins[idx].1;
                let mut ctx = RuntimeContext::new(&self.rects);
                plugin.init(&mut ctx)?;
                (plugin.name().to_string(), ctx.into_outcome())
            };
            self.log_runtime_event(
                LogLevel::Debug,
                "plugin_initialized",
                [json_kv("plugin", json!(name))],
            );
            self.apply_outcome(outcome)?;
        }

        self.render_if_needed(stdout)
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );
    }

    fn with_metrics(&self, record: impl FnOnce(&mut WidgetMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, "room::runtime", message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }

        let uptime = self
            .start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default();

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(uptime)
                    .to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }

    fn describe_event(event: &RuntimeEvent) -> &'static str {
        match event {
            RuntimeEvent::Tick { .. } => "tick",
            RuntimeEvent::Key(_) => "key",
            RuntimeEvent::Paste(_) => "paste",
            RuntimeEvent::FocusGained => "focus_gained",
            RuntimeEvent::FocusLost => "focus_lost",
            RuntimeEvent::Resize(_) => "resize",
        }
    }
}
