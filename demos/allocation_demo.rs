//! Interactive room allocation session.
//!
//! Usage: `cargo run --example allocation_demo [scenario.json] [--large]`
//! Set `ROOM_ALLOCATION_LOG=path` to capture JSON-lines logs, including every
//! allocation the widget reports.

use std::env;
use std::time::Duration;

use room_allocation::{
    AllocationController, AllocationScenario, AllocationSummary, AnsiRenderer, CliDriver,
    FileSink, LifecycleLoggerPlugin, LogLevel, Logger, MetricsSnapshotPlugin, NullSink,
    PluginBundle, RoomAllocationPlugin, RoomRuntime, Size, WidgetConfig, allocation_layout,
};

const LOG_MAX_BYTES: u64 = 1024 * 1024;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let scenario = load_scenario()?;
    let logger = match env::var("ROOM_ALLOCATION_LOG") {
        Ok(path) => Logger::new(FileSink::new(path, LOG_MAX_BYTES)?),
        Err(_) => Logger::new(NullSink),
    }
    .with_min_level(LogLevel::Debug);

    let layout = allocation_layout(scenario.rooms.len());
    let mut runtime = RoomRuntime::new(layout, AnsiRenderer::with_default(), Size::new(80, 24))?;
    let metrics = {
        let config = runtime.config_mut();
        config.logger = Some(logger.clone());
        config.metrics_interval = Duration::ZERO;
        config.enable_metrics();
        config
            .metrics_handle()
            .ok_or("metrics handle missing after enable_metrics")?
    };

    let report_logger = logger.clone();
    let controller = AllocationController::new(
        scenario.guest,
        scenario.rooms.clone(),
        WidgetConfig::default()
            .with_policy(scenario.policy)
            .with_logger(logger.clone())
            .with_metrics(metrics.clone()),
    )
    .with_observer(move |rooms: &[AllocationSummary]| {
        let fields = match serde_json::to_value(rooms) {
            Ok(value) => [("rooms".to_string(), value)].into_iter().collect(),
            Err(_) => Default::default(),
        };
        let _ = report_logger.log_with_fields(
            LogLevel::Info,
            "room::demo",
            "room allocations",
            fields,
        );
    });

    PluginBundle::new()
        .with_plugin(LifecycleLoggerPlugin::new(logger.clone()), -100)
        .with_plugin(RoomAllocationPlugin::new(controller), 0)
        .with_plugin(
            MetricsSnapshotPlugin::new(logger, metrics).with_interval(Duration::from_secs(10)),
            100,
        )
        .register_into(&mut runtime);

    CliDriver::new(runtime).run()?;
    Ok(())
}

fn load_scenario() -> std::result::Result<AllocationScenario, Box<dyn std::error::Error>> {
    let mut scenario = AllocationScenario::sample();
    for arg in env::args().skip(1) {
        if arg == "--large" {
            scenario = AllocationScenario::large_party();
        } else {
            scenario = AllocationScenario::from_path(&arg)?;
        }
    }
    Ok(scenario)
}
