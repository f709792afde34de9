//! Buyer model.
//!
//! Buyers rank the sectors they are interested in. Lower `priority` numbers
//! mean stronger interest (1 = first choice).

use serde::{Deserialize, Serialize};

/// A buyer attending the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    /// Unique buyer identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Ranked sector interests.
    pub sector_priorities: Vec<SectorPriority>,
    /// Product names of interest.
    pub products: Vec<String>,
    /// Dates (`YYYY-MM-DD`) the buyer attends, in order.
    pub available_dates: Vec<String>,
}

/// A ranked sector interest, optionally refined by ranked sub-sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPriority {
    /// Sector tag.
    pub sector: String,
    /// Rank (1 = highest).
    pub priority: u32,
    /// Ranked sub-sectors within this sector.
    #[serde(default)]
    pub sub_sectors: Vec<SubSectorPriority>,
}

/// A ranked sub-sector interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSectorPriority {
    /// Sub-sector tag.
    pub sub_sector: String,
    /// Rank (1 = highest).
    pub priority: u32,
}

impl Buyer {
    /// Creates a buyer with the given ID and no interests.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            sector_priorities: Vec::new(),
            products: Vec::new(),
            available_dates: Vec::new(),
        }
    }

    /// Sets the buyer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a ranked sector interest.
    pub fn with_sector_priority(mut self, priority: SectorPriority) -> Self {
        self.sector_priorities.push(priority);
        self
    }

    /// Adds a product of interest.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.products.push(product.into());
        self
    }

    /// Adds an attendance date.
    pub fn with_available_date(mut self, date: impl Into<String>) -> Self {
        self.available_dates.push(date.into());
        self
    }

    /// Whether the buyer attends on a date.
    pub fn is_available_on(&self, date: &str) -> bool {
        self.available_dates.iter().any(|d| d == date)
    }
}

impl SectorPriority {
    /// Creates a sector interest without sub-sector refinement.
    pub fn new(sector: impl Into<String>, priority: u32) -> Self {
        Self {
            sector: sector.into(),
            priority,
            sub_sectors: Vec::new(),
        }
    }

    /// Adds a ranked sub-sector.
    pub fn with_sub_sector(mut self, sub_sector: impl Into<String>, priority: u32) -> Self {
        self.sub_sectors.push(SubSectorPriority {
            sub_sector: sub_sector.into(),
            priority,
        });
        self
    }
}
