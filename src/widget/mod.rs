//! The room allocation widget as a runtime plugin.
//!
//! Zones, top to bottom: guest header, unallocated banner, one block per room
//! (title plus an adult and a child stepper), filler, key hints, status line.
//! Focus walks the steppers in room order, adult before child.

pub mod labels;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::allocation::{AllocationController, Guest, GuestKind, RoomTemplate};
use crate::layout::{Constraint, Direction, LayoutNode, LayoutTree};
use crate::runtime::focus::{FocusMove, FocusRing};
use crate::runtime::{EventFlow, RoomPlugin, RuntimeContext, RuntimeEvent};
use crate::stepper::{StepperChange, StepperInput};
use crate::width::fit_to_width;
use crate::Result;

pub const HEADER_ZONE: &str = "app:allocation.header";
pub const REMAINING_ZONE: &str = "app:allocation.remaining";
pub const HINTS_ZONE: &str = "app:allocation.hints";
pub const STATUS_ZONE: &str = "app:allocation.status";
const FILLER_ZONE: &str = "app:allocation.filler";

/// Title, adult row, child row, separator.
pub const ROOM_ZONE_HEIGHT: u16 = 4;
const LABEL_WIDTH: usize = 16;
const SEPARATOR_WIDTH: usize = 36;
const HINTS_TEXT: &str = "↑/↓ move · ←/→ or -/+ adjust · digits type · Enter confirm · q quit";

pub fn room_zone(index: usize) -> String {
    format!("app:allocation.room.{index}")
}

/// Column layout holding every zone the widget paints for `room_count` rooms.
pub fn allocation_layout(room_count: usize) -> LayoutTree {
    let mut constraints = vec![Constraint::Fixed(1), Constraint::Fixed(1)];
    let mut children = vec![LayoutNode::leaf(HEADER_ZONE), LayoutNode::leaf(REMAINING_ZONE)];

    for index in 0..room_count {
        constraints.push(Constraint::Fixed(ROOM_ZONE_HEIGHT));
        children.push(LayoutNode::leaf(room_zone(index)));
    }

    constraints.extend([Constraint::Flex(1), Constraint::Fixed(1), Constraint::Fixed(1)]);
    children.extend([
        LayoutNode::leaf(FILLER_ZONE),
        LayoutNode::leaf(HINTS_ZONE),
        LayoutNode::leaf(STATUS_ZONE),
    ]);

    LayoutTree::new(LayoutNode::container(
        "app:allocation",
        Direction::Column,
        constraints,
        children,
    ))
}

fn slot_index(room: usize, kind: GuestKind) -> usize {
    room * 2
        + match kind {
            GuestKind::Adult => 0,
            GuestKind::Child => 1,
        }
}

fn slot_target(slot: usize) -> (usize, GuestKind) {
    let kind = if slot % 2 == 0 {
        GuestKind::Adult
    } else {
        GuestKind::Child
    };
    (slot / 2, kind)
}

/// Renders an [`AllocationController`] and feeds key presses into it.
pub struct RoomAllocationPlugin {
    controller: AllocationController,
    steppers: Vec<StepperInput>,
    focus: FocusRing,
}

impl RoomAllocationPlugin {
    pub fn new(controller: AllocationController) -> Self {
        let mut plugin = Self {
            controller,
            steppers: Vec::new(),
            focus: FocusRing::default(),
        };
        plugin.rebuild_steppers();
        plugin
    }

    pub fn controller(&self) -> &AllocationController {
        &self.controller
    }

    /// Swap in a new party or room list. Rooms without a zone in the layout
    /// are kept in the allocation but not drawn.
    pub fn update_inputs(&mut self, guest: Guest, rooms: Vec<RoomTemplate>) {
        if self.controller.update_inputs(guest, rooms) {
            self.rebuild_steppers();
        }
    }

    pub fn stepper(&self, room: usize, kind: GuestKind) -> Option<&StepperInput> {
        self.steppers.get(slot_index(room, kind))
    }

    fn rebuild_steppers(&mut self) {
        let mut steppers = Vec::with_capacity(self.controller.rooms().len() * 2);
        for (room, allocation) in self.controller.rooms().iter().enumerate() {
            for kind in GuestKind::ALL {
                let name = format!("{}-{room}", kind.as_str());
                let value = allocation.count(kind) as i64;
                let stepper = match self.controller.stepper_bounds(room, kind) {
                    Ok(bounds) => {
                        StepperInput::new(name, bounds.min, bounds.max, value).with_bounds(bounds)
                    }
                    Err(_) => StepperInput::new(name, 0, 0, value),
                };
                steppers.push(stepper);
            }
        }
        self.focus.resize(steppers.len());
        self.steppers = steppers;
    }

    fn sync_steppers(&mut self) {
        for (slot, stepper) in self.steppers.iter_mut().enumerate() {
            let (room, kind) = slot_target(slot);
            let Ok(bounds) = self.controller.stepper_bounds(room, kind) else {
                continue;
            };
            let value = self.controller.rooms()[room].count(kind) as i64;
            stepper.sync(value, bounds);
        }
    }

    fn apply_change(&mut self, slot: usize, change: Option<StepperChange>) -> Result<()> {
        let Some(change) = change else {
            return Ok(());
        };
        let (room, kind) = slot_target(slot);
        match change {
            StepperChange::Value(value) => {
                self.controller.propose(room, kind, value)?;
            }
            StepperChange::Edited(parsed) => {
                let value = parsed.unwrap_or(kind.fallback() as i64);
                self.controller.propose(room, kind, value)?;
            }
            StepperChange::Blur => {
                self.controller.finalize(room, kind)?;
            }
        }
        self.sync_steppers();
        Ok(())
    }

    /// Move focus and commit whatever the stepper it left was holding.
    fn move_focus(&mut self, step: fn(&mut FocusRing) -> Option<FocusMove>) -> Result<()> {
        if let Some(FocusMove { from, .. }) = step(&mut self.focus) {
            let blur = self.steppers[from].blur();
            self.apply_change(from, Some(blur))?;
        }
        Ok(())
    }

    fn handle_key(&mut self, ctx: &mut RuntimeContext<'_>, key: &KeyEvent) -> Result<EventFlow> {
        if key.kind != KeyEventKind::Press
            || key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return Ok(EventFlow::Continue);
        }

        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            ctx.request_exit();
            return Ok(EventFlow::Consumed);
        }

        let Some(slot) = self.focus.current() else {
            return Ok(EventFlow::Continue);
        };

        match key.code {
            KeyCode::Down | KeyCode::Tab => self.move_focus(FocusRing::next)?,
            KeyCode::Up | KeyCode::BackTab => self.move_focus(FocusRing::prev)?,
            KeyCode::Left | KeyCode::Char('-') => {
                let change = self.steppers[slot].decrement();
                self.apply_change(slot, change)?;
            }
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                let change = self.steppers[slot].increment();
                self.apply_change(slot, change)?;
            }
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                let change = self.steppers[slot].push_digit(ch);
                self.apply_change(slot, change)?;
            }
            KeyCode::Backspace => {
                let change = self.steppers[slot].pop_char();
                self.apply_change(slot, Some(change))?;
            }
            KeyCode::Enter => {
                let change = self.steppers[slot].blur();
                self.apply_change(slot, Some(change))?;
            }
            _ => return Ok(EventFlow::Continue),
        }

        self.render(ctx);
        Ok(EventFlow::Consumed)
    }

    fn room_text(&self, room: usize) -> String {
        let allocation = &self.controller.rooms()[room];
        let mut lines = vec![labels::room_title(allocation.occupants())];

        for kind in GuestKind::ALL {
            let slot = slot_index(room, kind);
            let marker = if self.focus.current() == Some(slot) {
                '>'
            } else {
                ' '
            };
            let mut label = labels::kind_label(kind).to_string();
            if let Some(hint) = labels::kind_hint(kind) {
                label.push_str("  ");
                label.push_str(hint);
            }
            lines.push(format!(
                "{marker} {} {}",
                fit_to_width(&label, LABEL_WIDTH),
                self.steppers[slot].render()
            ));
        }

        if room + 1 < self.controller.rooms().len() {
            lines.push("─".repeat(SEPARATOR_WIDTH));
        }
        lines.join("\n")
    }

    fn status_text(&self) -> String {
        let focus = self
            .focus
            .current()
            .map(|slot| {
                let (room, kind) = slot_target(slot);
                format!("room {} {}", room + 1, labels::kind_label(kind))
            })
            .unwrap_or_else(|| "none".to_string());
        format!(
            "Status · focus:{} · total:{}",
            focus,
            self.controller.total_price()
        )
    }

    fn render(&self, ctx: &mut RuntimeContext<'_>) {
        let state = self.controller.state();
        let mut updates = vec![
            (
                HEADER_ZONE.to_string(),
                labels::guest_header(self.controller.guest(), state.rooms.len()),
            ),
            (
                REMAINING_ZONE.to_string(),
                labels::remaining_banner(state.remaining_adults, state.remaining_children),
            ),
            (HINTS_ZONE.to_string(), HINTS_TEXT.to_string()),
            (STATUS_ZONE.to_string(), self.status_text()),
        ];
        for room in 0..state.rooms.len() {
            updates.push((room_zone(room), self.room_text(room)));
        }

        for (zone, content) in updates {
            if ctx.has_zone(&zone) {
                ctx.set_zone(zone, content);
            }
        }
    }
}

impl RoomPlugin for RoomAllocationPlugin {
    fn name(&self) -> &str {
        "room::allocation.widget"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.render(ctx);
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Key(key) => self.handle_key(ctx, key),
            RuntimeEvent::Paste(data) => {
                let Some(slot) = self.focus.current() else {
                    return Ok(EventFlow::Continue);
                };
                let change = self.steppers[slot].edit(data.trim());
                self.apply_change(slot, Some(change))?;
                self.render(ctx);
                Ok(EventFlow::Consumed)
            }
            RuntimeEvent::FocusLost => {
                if let Some(slot) = self.focus.current() {
                    let blur = self.steppers[slot].blur();
                    self.apply_change(slot, Some(blur))?;
                    self.render(ctx);
                }
                Ok(EventFlow::Continue)
            }
            RuntimeEvent::Resize(_) => {
                self.render(ctx);
                Ok(EventFlow::Continue)
            }
            _ => Ok(EventFlow::Continue),
        }
    }

    fn before_render(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.render(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AllocationSummary;
    use crate::config::{AllocationScenario, ValidationPolicy, WidgetConfig};
    use crate::{AnsiRenderer, RoomRuntime, Size};
    use std::sync::{Arc, Mutex};

    fn key(code: KeyCode) -> RuntimeEvent {
        RuntimeEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn session(
        policy: ValidationPolicy,
        events: Vec<RuntimeEvent>,
    ) -> (RoomRuntime, Arc<Mutex<Vec<Vec<AllocationSummary>>>>) {
        let scenario = AllocationScenario::sample();
        let emitted: Arc<Mutex<Vec<Vec<AllocationSummary>>>> = Arc::default();
        let sink = Arc::clone(&emitted);
        let controller = AllocationController::new(
            scenario.guest,
            scenario.rooms.clone(),
            WidgetConfig::default().with_policy(policy),
        )
        .with_observer(move |rooms: &[AllocationSummary]| {
            if let Ok(mut guard) = sink.lock() {
                guard.push(rooms.to_vec());
            }
        });

        let layout = allocation_layout(scenario.rooms.len());
        let mut runtime =
            RoomRuntime::new(layout, AnsiRenderer::with_default(), Size::new(60, 24)).unwrap();
        runtime.config_mut().metrics_interval = std::time::Duration::ZERO;
        runtime.register_plugin(RoomAllocationPlugin::new(controller));

        let mut output = Vec::new();
        runtime.run_scripted(&mut output, events).unwrap();
        (runtime, emitted)
    }

    #[test]
    fn first_frame_shows_default_allocation() {
        let (runtime, emitted) = session(ValidationPolicy::ClampToBoundary, Vec::new());
        assert_eq!(
            runtime.zone_content(HEADER_ZONE),
            Some("住客人數：4 位大人，2 位小孩 / 3 房")
        );
        assert_eq!(
            runtime.zone_content(REMAINING_ZONE),
            Some("尚未分配人數：1 位大人，2 位小孩")
        );
        let room = runtime.zone_content(&room_zone(0)).unwrap();
        assert!(room.starts_with("房間：1 人"));
        assert!(room.contains("> 大人  年齡 20+"));
        assert_eq!(emitted.lock().unwrap().len(), 1);
    }

    #[test]
    fn plus_moves_a_guest_into_the_focused_room() {
        let (runtime, emitted) = session(
            ValidationPolicy::ClampToBoundary,
            vec![key(KeyCode::Char('+')), key(KeyCode::Char('+'))],
        );
        assert_eq!(
            runtime.zone_content(REMAINING_ZONE),
            Some("尚未分配人數：0 位大人，2 位小孩")
        );
        assert!(runtime.zone_content(&room_zone(0)).unwrap().starts_with("房間：2 人"));

        // the second press hits the disabled button and emits nothing
        let emitted = emitted.lock().unwrap();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1][0].adults, 2);
        assert_eq!(emitted[1][0].price, 1400);
    }

    #[test]
    fn typed_counts_are_clamped_on_entry() {
        let (runtime, _) = session(
            ValidationPolicy::ClampToBoundary,
            vec![
                key(KeyCode::Down),
                key(KeyCode::Down),
                key(KeyCode::Down),
                key(KeyCode::Char('9')),
                key(KeyCode::Enter),
            ],
        );
        assert!(runtime.zone_content(&room_zone(1)).unwrap().starts_with("房間：3 人"));
        assert_eq!(
            runtime.zone_content(REMAINING_ZONE),
            Some("尚未分配人數：1 位大人，0 位小孩")
        );
        assert!(runtime.zone_content(STATUS_ZONE).unwrap().contains("room 2 小孩"));
    }

    #[test]
    fn clamped_typing_shows_the_stored_count() {
        let (runtime, _) = session(
            ValidationPolicy::ClampToBoundary,
            vec![key(KeyCode::Down), key(KeyCode::Char('9'))],
        );
        let room = runtime.zone_content(&room_zone(0)).unwrap();
        assert!(room.starts_with("房間：3 人"));
        assert!(!room.contains("9_"));
        assert!(room.contains("[-]  2   [ ]"));

        let (runtime, _) = session(
            ValidationPolicy::ClampToBoundary,
            vec![key(KeyCode::Down), key(KeyCode::Char('9')), key(KeyCode::Char('1'))],
        );
        let room = runtime.zone_content(&room_zone(0)).unwrap();
        assert!(room.starts_with("房間：2 人"));
        assert!(room.contains("1_"));
    }

    #[test]
    fn leaving_a_stepper_commits_its_draft() {
        let (runtime, emitted) = session(
            ValidationPolicy::ClampToBoundary,
            vec![key(KeyCode::Down), key(KeyCode::Char('1')), key(KeyCode::Up)],
        );
        let room = runtime.zone_content(&room_zone(0)).unwrap();
        assert!(room.starts_with("房間：2 人"));
        assert!(!room.contains("1_"));
        assert!(room.contains("> 大人"));
        // mount, blur of the adult field, the typed digit, blur of the child field
        assert_eq!(emitted.lock().unwrap().len(), 4);
    }

    #[test]
    fn typed_counts_fall_back_under_fallback_policy() {
        let (runtime, _) = session(
            ValidationPolicy::FallbackToDefault,
            vec![key(KeyCode::Char('5')), key(KeyCode::Enter)],
        );
        assert!(runtime.zone_content(&room_zone(0)).unwrap().starts_with("房間：1 人"));
        assert_eq!(
            runtime.zone_content(REMAINING_ZONE),
            Some("尚未分配人數：1 位大人，2 位小孩")
        );
    }

    #[test]
    fn child_count_cannot_go_below_zero() {
        let (runtime, emitted) = session(
            ValidationPolicy::ClampToBoundary,
            vec![key(KeyCode::Down), key(KeyCode::Left), key(KeyCode::Char('-'))],
        );
        // one emission for mount, one for the blur when focus moved
        assert_eq!(emitted.lock().unwrap().len(), 2);
        assert!(runtime.zone_content(&room_zone(0)).unwrap().contains("小孩"));
        assert_eq!(
            runtime.zone_content(REMAINING_ZONE),
            Some("尚未分配人數：1 位大人，2 位小孩")
        );
    }

    #[test]
    fn quit_key_stops_the_session() {
        let (runtime, _) = session(
            ValidationPolicy::ClampToBoundary,
            vec![key(KeyCode::Char('q')), key(KeyCode::Char('+'))],
        );
        assert_eq!(
            runtime.zone_content(REMAINING_ZONE),
            Some("尚未分配人數：1 位大人，2 位小孩")
        );
    }

    #[test]
    fn slots_map_rooms_and_kinds() {
        assert_eq!(slot_target(slot_index(2, GuestKind::Child)), (2, GuestKind::Child));
        assert_eq!(slot_target(0), (0, GuestKind::Adult));
    }
}
