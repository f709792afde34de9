//! Vendor model.
//!
//! A vendor is the proposing side of Phase 1: it offers meetings to buyers
//! and must reach a configured minimum number of them.

use serde::{Deserialize, Serialize};

/// A vendor attending the event.
///
/// Immutable once constructed; the engine only borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    /// Unique vendor identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Sector tags the vendor serves.
    pub sectors: Vec<String>,
    /// Sub-sector tags the vendor serves.
    pub sub_sectors: Vec<String>,
    /// Product names.
    pub products: Vec<String>,
    /// Dates (`YYYY-MM-DD`) the vendor attends, in order.
    pub available_dates: Vec<String>,
}

impl Vendor {
    /// Creates a vendor with the given ID and no interests.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            sectors: Vec::new(),
            sub_sectors: Vec::new(),
            products: Vec::new(),
            available_dates: Vec::new(),
        }
    }

    /// Sets the vendor name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a served sector.
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sectors.push(sector.into());
        self
    }

    /// Adds a served sub-sector.
    pub fn with_sub_sector(mut self, sub_sector: impl Into<String>) -> Self {
        self.sub_sectors.push(sub_sector.into());
        self
    }

    /// Adds a product.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.products.push(product.into());
        self
    }

    /// Adds an attendance date.
    pub fn with_available_date(mut self, date: impl Into<String>) -> Self {
        self.available_dates.push(date.into());
        self
    }

    /// Whether the vendor serves a sector.
    pub fn serves_sector(&self, sector: &str) -> bool {
        self.sectors.iter().any(|s| s == sector)
    }

    /// Whether the vendor attends on a date.
    pub fn is_available_on(&self, date: &str) -> bool {
        self.available_dates.iter().any(|d| d == date)
    }
}
