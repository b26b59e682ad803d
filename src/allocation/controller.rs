use serde_json::json;

use crate::config::{ValidationPolicy, WidgetConfig};
use crate::error::AllocationError;
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::stepper::{StepperBounds, parse_count};

use super::default::default_allocation;
use super::model::{
    AllocationState, AllocationSummary, Guest, GuestKind, RoomAllocation, RoomTemplate,
};

const LOG_TARGET: &str = "room::allocation";

type ControllerResult<T> = std::result::Result<T, AllocationError>;

/// Receives the sanitized allocation every time it changes.
pub trait AllocationObserver: Send {
    fn on_change(&mut self, allocations: &[AllocationSummary]);
}

impl<F> AllocationObserver for F
where
    F: FnMut(&[AllocationSummary]) + Send,
{
    fn on_change(&mut self, allocations: &[AllocationSummary]) {
        self(allocations)
    }
}

/// Result of a user edit after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub room: usize,
    pub kind: GuestKind,
    pub previous: u32,
    pub requested: i64,
    pub applied: u32,
}

impl EditOutcome {
    /// True when validation replaced the requested count.
    pub fn corrected(&self) -> bool {
        self.requested != self.applied as i64
    }

    pub fn changed(&self) -> bool {
        self.previous != self.applied
    }
}

/// Owns the allocation for one guest/room input and applies edits to it.
pub struct AllocationController {
    guest: Guest,
    templates: Vec<RoomTemplate>,
    state: AllocationState,
    config: WidgetConfig,
    observer: Option<Box<dyn AllocationObserver>>,
}

impl AllocationController {
    pub fn new(guest: Guest, templates: Vec<RoomTemplate>, config: WidgetConfig) -> Self {
        let mut controller = Self {
            guest,
            templates,
            state: AllocationState::default(),
            config,
            observer: None,
        };
        controller.recompute();
        controller
    }

    /// Attach the observer and hand it the current allocation.
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: AllocationObserver + 'static,
    {
        self.set_observer(observer);
        self
    }

    pub fn set_observer<O>(&mut self, observer: O)
    where
        O: AllocationObserver + 'static,
    {
        self.observer = Some(Box::new(observer));
        self.notify();
    }

    pub fn guest(&self) -> Guest {
        self.guest
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    pub fn rooms(&self) -> &[RoomAllocation] {
        &self.state.rooms
    }

    pub fn room(&self, index: usize) -> ControllerResult<&RoomAllocation> {
        self.state
            .rooms
            .get(index)
            .ok_or(AllocationError::RoomOutOfRange {
                index,
                len: self.state.rooms.len(),
            })
    }

    pub fn remaining(&self, kind: GuestKind) -> u32 {
        self.state.remaining(kind)
    }

    pub fn summaries(&self) -> Vec<AllocationSummary> {
        self.state.summaries()
    }

    pub fn total_price(&self) -> u64 {
        self.state.total_price()
    }

    /// Size of the whole party, seated or not.
    pub fn total_guests(&self) -> u32 {
        self.guest.total()
    }

    /// Replace the inputs; recomputes only if they differ. Returns whether it did.
    pub fn update_inputs(&mut self, guest: Guest, templates: Vec<RoomTemplate>) -> bool {
        if guest == self.guest && templates == self.templates {
            return false;
        }
        self.guest = guest;
        self.templates = templates;
        self.recompute();
        true
    }

    /// Throw away edits and start again from the default allocation.
    pub fn recompute(&mut self) {
        let rooms = default_allocation(self.guest, &self.templates);
        self.state = AllocationState::seeded(self.guest, rooms);

        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_recompute();
            }
        }
        self.log(
            LogLevel::Info,
            "allocation_recomputed",
            [
                json_kv("rooms", json!(self.state.rooms.len())),
                json_kv("guests", json!(self.total_guests())),
                json_kv("remaining_adults", json!(self.state.remaining_adults)),
                json_kv("remaining_children", json!(self.state.remaining_children)),
            ],
        );
        self.notify();
    }

    /// Correct `proposed` into a count the room and the unseated guests allow.
    ///
    /// A count that already fits comes back unchanged.
    pub fn validate(&self, room: usize, kind: GuestKind, proposed: i64) -> ControllerResult<u32> {
        let allocation = self.room(room)?;
        let requested = proposed.max(0);
        let max = allocation.max_for(kind) as i64;
        let budget = self.state.remaining(kind) as i64 + allocation.count(kind) as i64;
        let limit = max.min(budget);

        if requested <= limit {
            return Ok(requested as u32);
        }

        let limit = limit as u32;
        Ok(match self.config.policy {
            ValidationPolicy::ClampToBoundary => limit,
            ValidationPolicy::FallbackToDefault => kind.fallback().min(limit),
        })
    }

    /// Validate `value`, write the result into the room and settle the
    /// remaining counter. Returns the count actually stored.
    pub fn apply(&mut self, room: usize, kind: GuestKind, value: u32) -> ControllerResult<u32> {
        let value = self.validate(room, kind, value as i64)?;
        self.write(room, kind, value)?;
        Ok(value)
    }

    fn write(&mut self, room: usize, kind: GuestKind, value: u32) -> ControllerResult<()> {
        let len = self.state.rooms.len();
        let allocation = self
            .state
            .rooms
            .get_mut(room)
            .ok_or(AllocationError::RoomOutOfRange { index: room, len })?;

        let previous = allocation.count(kind);
        allocation.set_count(kind, value);
        let price = allocation.price;

        let delta = value as i64 - previous as i64;
        let remaining = self.state.remaining_mut(kind);
        *remaining = (*remaining as i64 - delta).max(0) as u32;
        let remaining = *remaining;

        self.log(
            LogLevel::Debug,
            "allocation_applied",
            [
                json_kv("room", json!(room)),
                json_kv("kind", json!(kind.as_str())),
                json_kv("value", json!(value)),
                json_kv("price", json!(price)),
                json_kv("remaining", json!(remaining)),
            ],
        );
        self.notify();
        Ok(())
    }

    /// Validate and apply a count coming from a stepper.
    pub fn propose(
        &mut self,
        room: usize,
        kind: GuestKind,
        proposed: i64,
    ) -> ControllerResult<EditOutcome> {
        let previous = self.room(room)?.count(kind);
        let applied = self.validate(room, kind, proposed)?;
        let outcome = EditOutcome {
            room,
            kind,
            previous,
            requested: proposed,
            applied,
        };

        if outcome.corrected() {
            self.log(
                LogLevel::Warn,
                "allocation_corrected",
                [
                    json_kv("room", json!(room)),
                    json_kv("kind", json!(kind.as_str())),
                    json_kv("requested", json!(proposed)),
                    json_kv("applied", json!(applied)),
                ],
            );
        }
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_edit(outcome.corrected());
            }
        }

        self.write(room, kind, applied)?;
        Ok(outcome)
    }

    /// Like [`propose`](Self::propose) for raw field text; unparseable text
    /// becomes the kind's fallback count.
    pub fn propose_text(
        &mut self,
        room: usize,
        kind: GuestKind,
        text: &str,
    ) -> ControllerResult<EditOutcome> {
        let proposed = parse_count(text).unwrap_or(kind.fallback() as i64);
        self.propose(room, kind, proposed)
    }

    /// Re-validate whatever is stored for the room, e.g. after free typing.
    pub fn finalize(&mut self, room: usize, kind: GuestKind) -> ControllerResult<EditOutcome> {
        let current = self.room(room)?.count(kind);
        self.propose(room, kind, current as i64)
    }

    /// Bounds and button overrides for the stepper editing `kind` in `room`.
    pub fn stepper_bounds(&self, room: usize, kind: GuestKind) -> ControllerResult<StepperBounds> {
        let allocation = self.room(room)?;
        let floor = match kind {
            GuestKind::Adult => self.config.adult_min,
            GuestKind::Child => self.config.child_min,
        };
        let exhausted = self.state.remaining(kind) == 0;
        Ok(StepperBounds {
            min: floor as i64,
            max: allocation.max_for(kind) as i64,
            disable_minus: exhausted && allocation.count(kind) == floor,
            disable_plus: exhausted,
        })
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            let summaries = self.state.summaries();
            observer.on_change(&summaries);
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Logger, MemorySink};
    use crate::metrics::WidgetMetrics;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn sample_rooms() -> Vec<RoomTemplate> {
        vec![
            RoomTemplate::new(1000, 200, 100, 4),
            RoomTemplate::new(0, 500, 500, 4),
            RoomTemplate::new(500, 300, 200, 4),
        ]
    }

    fn controller(policy: ValidationPolicy) -> AllocationController {
        AllocationController::new(
            Guest::new(4, 2),
            sample_rooms(),
            WidgetConfig::default().with_policy(policy),
        )
    }

    fn assert_capacity_respected(controller: &AllocationController) {
        for room in controller.rooms() {
            assert!(
                room.occupants() <= room.capacity(),
                "room over capacity: {room:?}"
            );
        }
    }

    #[test]
    fn default_scenario_seeds_remaining_guests() {
        let controller = controller(ValidationPolicy::ClampToBoundary);
        let adults: Vec<_> = controller.rooms().iter().map(|room| room.adults).collect();
        assert_eq!(adults, vec![1, 1, 1]);
        assert_eq!(controller.remaining(GuestKind::Adult), 1);
        assert_eq!(controller.remaining(GuestKind::Child), 2);
    }

    #[test]
    fn accepted_increase_consumes_remaining_and_reprices() {
        let mut controller = controller(ValidationPolicy::FallbackToDefault);
        let outcome = controller.propose(0, GuestKind::Adult, 2).unwrap();
        assert!(!outcome.corrected());
        assert_eq!(controller.rooms()[0].adults, 2);
        assert_eq!(controller.remaining(GuestKind::Adult), 0);
        assert_eq!(controller.rooms()[0].price, 1000 + 2 * 200);
    }

    #[test]
    fn over_capacity_falls_back_under_fallback_policy() {
        let mut controller = controller(ValidationPolicy::FallbackToDefault);
        let outcome = controller.propose(0, GuestKind::Adult, 5).unwrap();
        assert!(outcome.corrected());
        assert_eq!(outcome.applied, 1);
        assert_eq!(controller.rooms()[0].adults, 1);
        assert_eq!(controller.remaining(GuestKind::Adult), 1);
    }

    #[test]
    fn over_capacity_clamps_to_boundary_by_default() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        // capacity allows 4, but only one adult is left to add
        let outcome = controller.propose(0, GuestKind::Adult, 5).unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(controller.remaining(GuestKind::Adult), 0);

        let outcome = controller.propose(1, GuestKind::Child, 9).unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(controller.remaining(GuestKind::Child), 0);
        assert_capacity_respected(&controller);
    }

    #[test]
    fn exceeding_remaining_budget_is_corrected() {
        let mut controller = controller(ValidationPolicy::FallbackToDefault);
        let outcome = controller.propose(2, GuestKind::Child, 3).unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(controller.remaining(GuestKind::Child), 2);
    }

    #[test]
    fn fallback_never_exceeds_capacity() {
        let mut controller = AllocationController::new(
            Guest::new(1, 4),
            vec![RoomTemplate::new(0, 100, 50, 4)],
            WidgetConfig::default().with_policy(ValidationPolicy::FallbackToDefault),
        );
        controller.propose(0, GuestKind::Adult, 0).unwrap();
        controller.propose(0, GuestKind::Child, 4).unwrap();
        let outcome = controller.propose(0, GuestKind::Adult, 3).unwrap();
        assert_eq!(outcome.applied, 0);
        assert_capacity_respected(&controller);
    }

    #[test]
    fn negative_requests_clamp_to_zero() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        let outcome = controller.propose(1, GuestKind::Adult, -3).unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(controller.remaining(GuestKind::Adult), 2);
        assert_eq!(controller.rooms()[1].price, 0);
    }

    #[test]
    fn validating_a_valid_value_is_identity() {
        for policy in [
            ValidationPolicy::ClampToBoundary,
            ValidationPolicy::FallbackToDefault,
        ] {
            let mut controller = controller(policy);
            controller.propose(0, GuestKind::Child, 2).unwrap();
            for room in 0..controller.rooms().len() {
                for kind in GuestKind::ALL {
                    let current = controller.rooms()[room].count(kind);
                    assert_eq!(
                        controller.validate(room, kind, current as i64).unwrap(),
                        current
                    );
                }
            }
        }
    }

    #[test]
    fn finalize_keeps_valid_state() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        controller.propose(0, GuestKind::Adult, 2).unwrap();
        let before = controller.state().clone();
        let outcome = controller.finalize(0, GuestKind::Adult).unwrap();
        assert!(!outcome.corrected());
        assert_eq!(controller.state(), &before);
    }

    #[test]
    fn finalize_repairs_rooms_seeded_over_capacity() {
        // the default pass ignores capacity, so a tiny room can start overfull
        let mut controller = AllocationController::new(
            Guest::new(2, 0),
            vec![RoomTemplate::new(0, 100, 50, 0)],
            WidgetConfig::default(),
        );
        assert_eq!(controller.rooms()[0].adults, 1);
        let outcome = controller.finalize(0, GuestKind::Adult).unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(controller.remaining(GuestKind::Adult), 2);
    }

    #[test]
    fn unparseable_text_uses_kind_fallback() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        controller.propose(0, GuestKind::Adult, 2).unwrap();
        let outcome = controller.propose_text(0, GuestKind::Adult, "x").unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(controller.remaining(GuestKind::Adult), 1);

        let outcome = controller.propose_text(1, GuestKind::Child, "").unwrap();
        assert_eq!(outcome.applied, 0);
        let outcome = controller.propose_text(1, GuestKind::Child, "2").unwrap();
        assert_eq!(outcome.applied, 2);
    }

    #[test]
    fn surplus_adults_stay_unallocated() {
        let controller = AllocationController::new(
            Guest::new(16, 0),
            vec![
                RoomTemplate::new(500, 500, 300, 4),
                RoomTemplate::new(500, 500, 300, 4),
                RoomTemplate::new(0, 500, 300, 8),
                RoomTemplate::new(500, 1000, 600, 2),
            ],
            WidgetConfig::default(),
        );
        assert_eq!(controller.state().assigned(GuestKind::Adult), 4);
        assert_eq!(controller.remaining(GuestKind::Adult), 12);
    }

    #[test]
    fn capacity_holds_across_edit_sequences() {
        let edits: [(usize, GuestKind, i64); 10] = [
            (0, GuestKind::Child, 2),
            (0, GuestKind::Adult, 4),
            (1, GuestKind::Adult, 3),
            (1, GuestKind::Child, 4),
            (2, GuestKind::Adult, 0),
            (2, GuestKind::Child, 5),
            (0, GuestKind::Child, 0),
            (2, GuestKind::Adult, 4),
            (1, GuestKind::Adult, -1),
            (0, GuestKind::Adult, 9),
        ];
        for policy in [
            ValidationPolicy::ClampToBoundary,
            ValidationPolicy::FallbackToDefault,
        ] {
            let mut controller = controller(policy);
            for (room, kind, value) in edits {
                controller.propose(room, kind, value).unwrap();
                assert_capacity_respected(&controller);
                let seated = controller.state().assigned(GuestKind::Adult)
                    + controller.remaining(GuestKind::Adult);
                assert_eq!(seated, 4, "adults must be conserved");
            }
        }
    }

    #[test]
    fn typed_zero_adults_vacates_the_room() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        let outcome = controller.propose_text(2, GuestKind::Adult, "0").unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(controller.rooms()[2].occupants(), 0);
        assert_eq!(controller.remaining(GuestKind::Adult), 2);
    }

    #[test]
    fn apply_cannot_overfill_a_room() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        assert_eq!(controller.apply(0, GuestKind::Adult, 100).unwrap(), 2);
        assert_capacity_respected(&controller);
        assert_eq!(controller.rooms()[0].adults, 2);
        assert_eq!(controller.remaining(GuestKind::Adult), 0);

        let mut controller = self::controller(ValidationPolicy::FallbackToDefault);
        assert_eq!(controller.apply(1, GuestKind::Child, 100).unwrap(), 0);
        assert_capacity_respected(&controller);
        assert_eq!(controller.remaining(GuestKind::Child), 2);
    }

    #[test]
    fn stepper_bounds_follow_remaining_guests() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        let bounds = controller.stepper_bounds(0, GuestKind::Adult).unwrap();
        assert_eq!(bounds.min, 1);
        assert_eq!(bounds.max, 4);
        assert!(!bounds.disable_plus);
        assert!(!bounds.disable_minus);

        controller.propose(0, GuestKind::Adult, 2).unwrap();
        controller.propose(0, GuestKind::Child, 2).unwrap();
        let adult = controller.stepper_bounds(1, GuestKind::Adult).unwrap();
        assert!(adult.disable_plus);
        assert!(adult.disable_minus);
        let child = controller.stepper_bounds(0, GuestKind::Child).unwrap();
        assert_eq!(child.max, 2);
        assert!(child.disable_plus);
        assert!(!child.disable_minus);
    }

    #[test]
    fn observer_receives_sanitized_allocations() {
        let received: Arc<Mutex<Vec<Vec<AllocationSummary>>>> = Arc::default();
        let sink = Arc::clone(&received);
        let mut controller = controller(ValidationPolicy::ClampToBoundary)
            .with_observer(move |rooms: &[AllocationSummary]| {
                if let Ok(mut guard) = sink.lock() {
                    guard.push(rooms.to_vec());
                }
            });
        controller.propose(0, GuestKind::Adult, 2).unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(
            received[1][0],
            AllocationSummary {
                adults: 2,
                children: 0,
                price: 1400,
                capacity: 4,
            }
        );
    }

    #[test]
    fn update_inputs_recomputes_only_on_change() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        controller.propose(0, GuestKind::Adult, 2).unwrap();
        assert!(!controller.update_inputs(Guest::new(4, 2), sample_rooms()));
        assert_eq!(controller.rooms()[0].adults, 2);

        assert!(controller.update_inputs(Guest::new(2, 1), sample_rooms()));
        let adults: Vec<_> = controller.rooms().iter().map(|room| room.adults).collect();
        assert_eq!(adults, vec![1, 1, 0]);
        assert_eq!(controller.remaining(GuestKind::Adult), 0);
        assert_eq!(controller.remaining(GuestKind::Child), 1);
    }

    #[test]
    fn out_of_range_room_is_an_error() {
        let mut controller = controller(ValidationPolicy::ClampToBoundary);
        assert_eq!(
            controller.propose(7, GuestKind::Adult, 1),
            Err(AllocationError::RoomOutOfRange { index: 7, len: 3 })
        );
    }

    #[test]
    fn corrections_are_logged_and_counted() {
        let sink = MemorySink::new();
        let metrics = Arc::new(Mutex::new(WidgetMetrics::new()));
        let mut controller = AllocationController::new(
            Guest::new(4, 2),
            sample_rooms(),
            WidgetConfig::default()
                .with_logger(Logger::new(sink.clone()))
                .with_metrics(Arc::clone(&metrics)),
        );
        controller.propose(0, GuestKind::Adult, 9).unwrap();
        controller.propose(1, GuestKind::Child, 1).unwrap();

        let messages = sink.messages();
        assert_eq!(messages[0], "allocation_recomputed");
        assert_eq!(sink.events()[0].field("guests"), Some(&json!(6)));
        assert!(messages.contains(&"allocation_corrected".to_string()));
        assert_eq!(
            messages
                .iter()
                .filter(|message| *message == "allocation_applied")
                .count(),
            2
        );

        let snapshot = metrics.lock().unwrap().snapshot(Duration::ZERO);
        assert_eq!(snapshot.edits, 2);
        assert_eq!(snapshot.corrections, 1);
        assert_eq!(snapshot.recomputes, 1);
    }
}
