//! Níveis de trip – avaliação da temperatura contra os limiares da zona.

use crate::types::{TripPoints, UNKNOWN_TRIP, ZoneInfo};

/// Nível de trip atingido por uma zona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TripLevel {
    Normal,
    Trip0,
    Trip1,
    Trip2,
}

/// Retorna o [`TripLevel`] atual da zona.
pub fn trip_level(zone: &ZoneInfo) -> TripLevel {
    level_for_value(zone.temperature, &zone.trips())
}

/// Retorna o [`TripLevel`] para um valor dado os limiares.
///
/// Limiares desconhecidos nunca disparam.
pub fn level_for_value(value: u32, trips: &TripPoints) -> TripLevel {
    let reached = |trip: u32| trip != UNKNOWN_TRIP && value >= trip;
    if reached(trips.trip2) {
        TripLevel::Trip2
    } else if reached(trips.trip1) {
        TripLevel::Trip1
    } else if reached(trips.trip0) {
        TripLevel::Trip0
    } else {
        TripLevel::Normal
    }
}
