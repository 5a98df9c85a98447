//! City join and hotspot scoring.
//!
//! Observations gathered from the sources are joined per city, facility
//! counts are turned into densities, and every matched city gets a weighted
//! hotspot score and tier.

pub mod footprint;
pub mod join;
pub mod score;
pub mod tier;
pub mod types;
pub mod utility;
