//! Fixed traditional-Chinese copy shown by the widget.

use crate::allocation::{Guest, GuestKind};

pub const ADULT_LABEL: &str = "大人";
pub const ADULT_HINT: &str = "年齡 20+";
pub const CHILD_LABEL: &str = "小孩";

/// `住客人數：4 位大人，2 位小孩 / 3 房`
pub fn guest_header(guest: Guest, rooms: usize) -> String {
    format!(
        "住客人數：{} 位大人，{} 位小孩 / {} 房",
        guest.adults, guest.children, rooms
    )
}

/// `尚未分配人數：1 位大人，2 位小孩`
pub fn remaining_banner(adults: u32, children: u32) -> String {
    format!("尚未分配人數：{adults} 位大人，{children} 位小孩")
}

/// `房間：3 人`
pub fn room_title(occupants: u32) -> String {
    format!("房間：{occupants} 人")
}

pub fn kind_label(kind: GuestKind) -> &'static str {
    match kind {
        GuestKind::Adult => ADULT_LABEL,
        GuestKind::Child => CHILD_LABEL,
    }
}

/// Secondary caption under the row label, if any.
pub fn kind_hint(kind: GuestKind) -> Option<&'static str> {
    match kind {
        GuestKind::Adult => Some(ADULT_HINT),
        GuestKind::Child => None,
    }
}
