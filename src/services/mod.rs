pub mod air_quality;
