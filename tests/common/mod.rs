//! Shared test utilities.
//!
//! Fixtures for the standard event scenarios plus invariant checks used
//! across the integration suites.

pub mod fixtures;

use std::collections::HashSet;

use tracing_subscriber::{fmt, EnvFilter};
use u_meeting::models::Meeting;

pub use fixtures::TestFixtures;

/// Installs a debug-level subscriber that writes through the test harness.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Asserts no buyer slot, vendor slot, or vendor-buyer pair is used twice.
pub fn assert_no_double_booking(meetings: &[Meeting]) {
    let mut buyer_slots = HashSet::new();
    let mut vendor_slots = HashSet::new();
    let mut pairs = HashSet::new();

    for m in meetings {
        assert!(
            buyer_slots.insert((m.buyer_id.as_str(), m.time_slot.datetime.as_str())),
            "buyer {} double-booked at {}",
            m.buyer_id,
            m.time_slot.datetime
        );
        assert!(
            vendor_slots.insert((m.vendor_id.as_str(), m.time_slot.datetime.as_str())),
            "vendor {} double-booked at {}",
            m.vendor_id,
            m.time_slot.datetime
        );
        assert!(
            pairs.insert((m.vendor_id.as_str(), m.buyer_id.as_str())),
            "{} meets {} twice",
            m.vendor_id,
            m.buyer_id
        );
    }
}
