use serde::{Deserialize, Serialize};

/// Party size requested by the host page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    #[serde(alias = "adult")]
    pub adults: u32,
    #[serde(alias = "child", default)]
    pub children: u32,
}

impl Guest {
    pub const fn new(adults: u32, children: u32) -> Self {
        Self { adults, children }
    }

    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    pub fn count(&self, kind: GuestKind) -> u32 {
        match kind {
            GuestKind::Adult => self.adults,
            GuestKind::Child => self.children,
        }
    }
}

/// Pricing and capacity of a bookable room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTemplate {
    pub room_price: u64,
    pub adult_price: u64,
    pub child_price: u64,
    pub capacity: u32,
}

impl RoomTemplate {
    pub const fn new(room_price: u64, adult_price: u64, child_price: u64, capacity: u32) -> Self {
        Self {
            room_price,
            adult_price,
            child_price,
            capacity,
        }
    }

    /// Price of the room holding `adults` and `children`.
    pub fn price_for(&self, adults: u32, children: u32) -> u64 {
        self.room_price
            .saturating_add(self.adult_price.saturating_mul(adults as u64))
            .saturating_add(self.child_price.saturating_mul(children as u64))
    }
}

/// Which side of the party a count refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    Adult,
    Child,
}

impl GuestKind {
    pub const ALL: [GuestKind; 2] = [GuestKind::Adult, GuestKind::Child];

    pub fn other(self) -> Self {
        match self {
            GuestKind::Adult => GuestKind::Child,
            GuestKind::Child => GuestKind::Adult,
        }
    }

    /// Count substituted when an edit is rejected or unparseable.
    pub fn fallback(self) -> u32 {
        match self {
            GuestKind::Adult => 1,
            GuestKind::Child => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GuestKind::Adult => "adults",
            GuestKind::Child => "children",
        }
    }
}

/// One room's assignment together with the template it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomAllocation {
    pub template: RoomTemplate,
    pub adults: u32,
    pub children: u32,
    pub price: u64,
}

impl RoomAllocation {
    /// Empty room: nobody assigned, base price only.
    pub fn vacant(template: RoomTemplate) -> Self {
        Self {
            template,
            adults: 0,
            children: 0,
            price: template.room_price,
        }
    }

    pub fn count(&self, kind: GuestKind) -> u32 {
        match kind {
            GuestKind::Adult => self.adults,
            GuestKind::Child => self.children,
        }
    }

    pub fn set_count(&mut self, kind: GuestKind, value: u32) {
        match kind {
            GuestKind::Adult => self.adults = value,
            GuestKind::Child => self.children = value,
        }
        self.reprice();
    }

    pub fn occupants(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    pub fn capacity(&self) -> u32 {
        self.template.capacity
    }

    /// Seats left for `kind` once the other kind is seated.
    pub fn max_for(&self, kind: GuestKind) -> u32 {
        self.template
            .capacity
            .saturating_sub(self.count(kind.other()))
    }

    pub fn reprice(&mut self) {
        self.price = self.template.price_for(self.adults, self.children);
    }

    pub fn summary(&self) -> AllocationSummary {
        AllocationSummary {
            adults: self.adults,
            children: self.children,
            price: self.price,
            capacity: self.template.capacity,
        }
    }
}

/// Allocation as reported to the host; unit prices are not exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub adults: u32,
    pub children: u32,
    pub price: u64,
    pub capacity: u32,
}

/// Rooms plus the guests not yet seated anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationState {
    pub rooms: Vec<RoomAllocation>,
    pub remaining_adults: u32,
    pub remaining_children: u32,
}

impl AllocationState {
    /// Build the state around `rooms`, deriving what is left of `guest`.
    pub fn seeded(guest: Guest, rooms: Vec<RoomAllocation>) -> Self {
        let assigned_adults: u32 = rooms.iter().map(|room| room.adults).sum();
        let assigned_children: u32 = rooms.iter().map(|room| room.children).sum();
        Self {
            remaining_adults: guest.adults.saturating_sub(assigned_adults),
            remaining_children: guest.children.saturating_sub(assigned_children),
            rooms,
        }
    }

    pub fn remaining(&self, kind: GuestKind) -> u32 {
        match kind {
            GuestKind::Adult => self.remaining_adults,
            GuestKind::Child => self.remaining_children,
        }
    }

    pub(crate) fn remaining_mut(&mut self, kind: GuestKind) -> &mut u32 {
        match kind {
            GuestKind::Adult => &mut self.remaining_adults,
            GuestKind::Child => &mut self.remaining_children,
        }
    }

    pub fn assigned(&self, kind: GuestKind) -> u32 {
        self.rooms.iter().map(|room| room.count(kind)).sum()
    }

    pub fn total_price(&self) -> u64 {
        self.rooms
            .iter()
            .fold(0u64, |acc, room| acc.saturating_add(room.price))
    }

    pub fn summaries(&self) -> Vec<AllocationSummary> {
        self.rooms.iter().map(RoomAllocation::summary).collect()
    }
}
