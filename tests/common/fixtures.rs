//! Event fixtures.

use u_meeting::models::{Buyer, DailySchedule, SchedulerConfig, SectorPriority, Vendor};
use u_meeting::ScheduleRequest;

/// Standard test data.
pub struct TestFixtures;

impl TestFixtures {
    pub const DAY_1: &'static str = "2025-01-15";
    pub const DAY_2: &'static str = "2025-01-16";

    /// One day, one window, 30-minute meetings.
    pub fn one_day_config(window_end: &str, min: usize, max: usize) -> SchedulerConfig {
        SchedulerConfig::new(Self::DAY_1, Self::DAY_1)
            .with_daily_schedule(DailySchedule::new(Self::DAY_1).with_window("09:00", window_end))
            .with_meetings_per_vendor(min, max)
    }

    /// 3 vendors, 2 buyers, one 2-hour window, min 2 / max 3, everyone
    /// available.
    pub fn three_by_two() -> ScheduleRequest {
        let vendors = vec![
            Vendor::new("V1")
                .with_name("Acme Devices")
                .with_sector("tech")
                .with_available_date(Self::DAY_1),
            Vendor::new("V2")
                .with_name("Shelf Co")
                .with_sector("retail")
                .with_available_date(Self::DAY_1),
            Vendor::new("V3")
                .with_name("Omni Labs")
                .with_sector("tech")
                .with_sector("retail")
                .with_available_date(Self::DAY_1),
        ];
        let buyers = vec![
            Buyer::new("B1")
                .with_sector_priority(SectorPriority::new("tech", 1))
                .with_sector_priority(SectorPriority::new("retail", 2))
                .with_available_date(Self::DAY_1),
            Buyer::new("B2")
                .with_sector_priority(SectorPriority::new("retail", 1))
                .with_available_date(Self::DAY_1),
        ];
        ScheduleRequest::new(Self::one_day_config("11:00", 2, 3), vendors, buyers)
    }

    /// One vendor needing 5 meetings; each buyer shares exactly one slot
    /// with it.
    pub fn starved_vendor() -> ScheduleRequest {
        let config = SchedulerConfig::new(Self::DAY_1, Self::DAY_2)
            .with_daily_schedule(DailySchedule::new(Self::DAY_1).with_window("09:00", "09:30"))
            .with_daily_schedule(DailySchedule::new(Self::DAY_2).with_window("09:00", "09:30"))
            .with_meetings_per_vendor(5, 5);
        let vendors = vec![Vendor::new("V1")
            .with_sector("tech")
            .with_available_date(Self::DAY_1)
            .with_available_date(Self::DAY_2)];
        let buyers = vec![
            Buyer::new("B1")
                .with_sector_priority(SectorPriority::new("tech", 1))
                .with_available_date(Self::DAY_1),
            Buyer::new("B2").with_available_date(Self::DAY_2),
        ];
        ScheduleRequest::new(config, vendors, buyers)
    }

    /// Vendors and buyers attend on different days.
    pub fn disjoint_dates() -> ScheduleRequest {
        let config = SchedulerConfig::new(Self::DAY_1, Self::DAY_2)
            .with_daily_schedule(DailySchedule::new(Self::DAY_1).with_window("09:00", "10:00"))
            .with_daily_schedule(DailySchedule::new(Self::DAY_2).with_window("09:00", "10:00"))
            .with_meetings_per_vendor(1, 2);
        let vendors = vec![
            Vendor::new("V1").with_available_date(Self::DAY_1),
            Vendor::new("V2").with_available_date(Self::DAY_1),
        ];
        let buyers = vec![
            Buyer::new("B1").with_available_date(Self::DAY_2),
            Buyer::new("B2").with_available_date(Self::DAY_2),
        ];
        ScheduleRequest::new(config, vendors, buyers)
    }
}
