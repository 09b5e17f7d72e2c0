//! Classificação de zonas a partir do label textual do sensor.
//!
//! Match por substring, case-sensitive, na ordem CPU → BATTERY → UNKNOWN.
//! GPU e SKIN existem no protocolo mas nenhum label é mapeado para eles.

use crate::types::{TripPoints, ZoneKind};

/// Substring que identifica o pacote da CPU.
pub const CPU_LABEL: &str = "x86_pkg_temp";

/// Substring que identifica a bateria.
pub const BATTERY_LABEL: &str = "battery";

/// Trip points fixos do pacote da CPU.
pub const CPU_TRIPS: TripPoints = TripPoints {
    trip0: 85000,
    trip1: 95000,
    trip2: 99000,
};

/// Resultado da classificação: tipo + limiares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneClass {
    pub kind: ZoneKind,
    pub trips: TripPoints,
}

impl ZoneClass {
    pub const UNKNOWN: ZoneClass = ZoneClass {
        kind: ZoneKind::Unknown,
        trips: TripPoints::UNKNOWN,
    };
}

/// Mapeia um label de sensor para [`ZoneClass`].
pub fn classify(label: &str) -> ZoneClass {
    if label.contains(CPU_LABEL) {
        ZoneClass {
            kind: ZoneKind::Cpu,
            trips: CPU_TRIPS,
        }
    } else if label.contains(BATTERY_LABEL) {
        ZoneClass {
            kind: ZoneKind::Battery,
            trips: TripPoints::UNKNOWN,
        }
    } else {
        ZoneClass::UNKNOWN
    }
}
