use super::model::{Guest, RoomAllocation, RoomTemplate};

/// Initial allocation: one adult per room, in room order, until adults run out.
///
/// Children are left for the user to place and capacity is not consulted; any
/// adults beyond the room count stay unallocated.
pub fn default_allocation(guest: Guest, rooms: &[RoomTemplate]) -> Vec<RoomAllocation> {
    let mut remaining_adults = guest.adults;

    rooms
        .iter()
        .map(|template| {
            let mut room = RoomAllocation::vacant(*template);
            if remaining_adults > 0 {
                room.adults = 1;
                room.price = room.price.saturating_add(template.adult_price);
                remaining_adults -= 1;
            }
            room
        })
        .collect()
}
