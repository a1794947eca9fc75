//! Data collection: uptime statistics and hosting statistics, rendered into banner slots.

pub mod hosting;
mod slot_map;
mod uptime;

pub use slot_map::{SENTINEL, Slot, SlotMap};
pub use uptime::{UptimeStats, compute_uptime};
