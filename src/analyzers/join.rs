use tracing::{debug, warn};

use crate::analyzers::footprint::density_per_100km2;
use crate::analyzers::score::{Measurements, hotspot_score};
use crate::analyzers::tier::HotspotTier;
use crate::analyzers::types::{CityObservation, CityRecord, Exclusion};
use crate::config::StudyConfig;

/// Matched records in configured order, plus the cities left out.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub records: Vec<CityRecord>,
    pub excluded: Vec<Exclusion>,
}

/// Keeps the cities that have PM2.5, CO₂ and a facility footprint, and scores them.
///
/// A city missing any of the three is excluded and reported; it never
/// appears in the outputs with placeholder values.
pub fn join(observations: Vec<CityObservation>, config: &StudyConfig) -> JoinOutcome {
    let mut outcome = JoinOutcome::default();

    for obs in observations {
        let (Some((pm25, pm25_source)), Some(co2), Some(footprint)) =
            (obs.pm25, obs.co2, obs.footprint)
        else {
            let missing = obs.missing_sources();
            warn!(city = %obs.city.name, missing = ?missing, "City excluded from outputs");
            outcome.excluded.push(Exclusion {
                city: obs.city.name,
                missing,
            });
            continue;
        };

        let facility_density = density_per_100km2(footprint.facilities, footprint.area_km2);
        let measurements = Measurements {
            pm25,
            co2,
            facility_density,
        };
        let hotspot_score = hotspot_score(&measurements, &config.weights, &config.references);
        let tier = HotspotTier::from_score(hotspot_score);

        debug!(city = %obs.city.name, hotspot_score, %tier, "City scored");

        outcome.records.push(CityRecord {
            city: obs.city.name,
            latitude: obs.city.latitude,
            longitude: obs.city.longitude,
            pm25,
            pm25_source,
            co2,
            tri_facilities: footprint.facilities,
            footprint: footprint.kind,
            facility_density,
            hotspot_score,
            tier,
        });
    }

    outcome
}
