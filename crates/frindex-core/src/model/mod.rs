//! Value types the aggregation pipeline works over.

pub mod agency;
pub mod entry;
pub mod entry_type;
pub mod regulatory_plan;
