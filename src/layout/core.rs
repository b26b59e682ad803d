use std::collections::HashMap;

use crate::error::{Result, WidgetError};
use crate::geometry::{Rect, Size};

/// Main axis of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// How a child claims space along its parent's main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Exactly this many cells, shrunk only when the parent is too small.
    Fixed(u16),
    /// At least this many cells, plus a flex share of weight 1.
    Min(u16),
    /// A weighted share of the leftover cells.
    Flex(u16),
}

pub type NodeId = String;

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub direction: Direction,
    pub constraints: Vec<Constraint>,
    pub children: Vec<LayoutNode>,
    pub gap: u16,
    pub padding: u16,
}

impl LayoutNode {
    pub fn leaf(id: impl Into<NodeId>) -> Self {
        Self::container(id, Direction::Row, Vec::new(), Vec::new())
    }

    pub fn container(
        id: impl Into<NodeId>,
        direction: Direction,
        constraints: Vec<Constraint>,
        children: Vec<LayoutNode>,
    ) -> Self {
        Self {
            id: id.into(),
            direction,
            constraints,
            children,
            gap: 0,
            padding: 0,
        }
    }

    pub fn with_gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_padding(mut self, padding: u16) -> Self {
        self.padding = padding;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub root: LayoutNode,
}

impl LayoutTree {
    pub fn new(root: LayoutNode) -> Self {
        Self { root }
    }

    /// Resolve every node for a terminal of `size`, keyed by node id.
    pub fn solve(&self, size: Size) -> Result<HashMap<NodeId, Rect>> {
        if self.root.is_leaf() {
            return Err(WidgetError::EmptyLayout);
        }

        let mut rects = HashMap::new();
        solve_node(
            &self.root,
            Rect::new(0, 0, size.width, size.height),
            &mut rects,
        );
        Ok(rects)
    }
}

fn solve_node(node: &LayoutNode, rect: Rect, accum: &mut HashMap<NodeId, Rect>) {
    accum.insert(node.id.clone(), rect);
    if node.is_leaf() {
        return;
    }

    let inner = rect.inset(node.padding);
    let axis = match node.direction {
        Direction::Row => inner.width,
        Direction::Column => inner.height,
    };
    let gaps = node
        .gap
        .saturating_mul(node.children.len().saturating_sub(1) as u16);
    let spans = distribute(axis.saturating_sub(gaps), node.children.len(), &node.constraints);

    let mut cursor = match node.direction {
        Direction::Row => inner.x,
        Direction::Column => inner.y,
    };
    for (child, span) in node.children.iter().zip(spans) {
        let child_rect = match node.direction {
            Direction::Row => Rect::new(cursor, inner.y, span, inner.height),
            Direction::Column => Rect::new(inner.x, cursor, inner.width, span),
        };
        solve_node(child, child_rect, accum);
        cursor = cursor.saturating_add(span).saturating_add(node.gap);
    }
}

/// Split `available` cells between `count` children. Children without an
/// explicit constraint behave as `Flex(1)`.
fn distribute(available: u16, count: usize, constraints: &[Constraint]) -> Vec<u16> {
    let resolved: Vec<Constraint> = (0..count)
        .map(|idx| constraints.get(idx).copied().unwrap_or(Constraint::Flex(1)))
        .collect();

    let mut spans: Vec<u16> = resolved
        .iter()
        .map(|constraint| match constraint {
            Constraint::Fixed(len) | Constraint::Min(len) => *len,
            Constraint::Flex(_) => 0,
        })
        .collect();

    let claimed: u32 = spans.iter().map(|span| *span as u32).sum();
    if claimed > available as u32 {
        shrink_from_end(&mut spans, claimed - available as u32);
        return spans;
    }

    let leftover = available - claimed as u16;
    let weights: Vec<u32> = resolved
        .iter()
        .map(|constraint| match constraint {
            Constraint::Fixed(_) => 0,
            Constraint::Min(_) => 1,
            Constraint::Flex(weight) => (*weight).max(1) as u32,
        })
        .collect();
    let total_weight: u32 = weights.iter().sum();
    if total_weight == 0 || leftover == 0 {
        return spans;
    }

    let mut handed_out = 0u16;
    let mut last_flexible = 0usize;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight == 0 {
            continue;
        }
        let share = (leftover as u32 * weight / total_weight) as u16;
        spans[idx] += share;
        handed_out += share;
        last_flexible = idx;
    }
    spans[last_flexible] += leftover - handed_out;
    spans
}

/// Take cells back starting with the last child, so headers keep their rows.
fn shrink_from_end(spans: &mut [u16], mut over: u32) {
    for span in spans.iter_mut().rev() {
        if over == 0 {
            break;
        }
        let cut = (*span as u32).min(over);
        *span -= cut as u16;
        over -= cut;
    }
}
