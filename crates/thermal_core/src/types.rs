//! Definição de tipos/structs das zonas térmicas.
//!
//! [`ZoneInfo`] é o estado de uma zona durante uma sessão. [`ZoneRecord`] e
//! [`DeltaEntry`] são as formas de tamanho fixo que vão para o fio.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trip point desconhecido: `-1` visto como `u32` (todos os bits em 1).
pub const UNKNOWN_TRIP: u32 = u32::MAX;

// ──────────────────────────────────────────────
// Tipo de zona
// ──────────────────────────────────────────────

/// Classe de uma zona térmica, como o guest a entende.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    Cpu,
    Gpu,
    Battery,
    Skin,
    Unknown,
}

impl ZoneKind {
    /// Código de 16 bits usado no fio.
    pub const fn code(self) -> u16 {
        match self {
            ZoneKind::Cpu => 0,
            ZoneKind::Gpu => 1,
            ZoneKind::Battery => 2,
            ZoneKind::Skin => 3,
            ZoneKind::Unknown => 65535,
        }
    }

    /// Converte um código do fio. Códigos fora da tabela retornam `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(ZoneKind::Cpu),
            1 => Some(ZoneKind::Gpu),
            2 => Some(ZoneKind::Battery),
            3 => Some(ZoneKind::Skin),
            65535 => Some(ZoneKind::Unknown),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ZoneKind::Cpu => "CPU",
            ZoneKind::Gpu => "GPU",
            ZoneKind::Battery => "BATTERY",
            ZoneKind::Skin => "SKIN",
            ZoneKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ──────────────────────────────────────────────
// Trip points
// ──────────────────────────────────────────────

/// Os três limiares de uma zona (milligraus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripPoints {
    pub trip0: u32,
    pub trip1: u32,
    pub trip2: u32,
}

impl TripPoints {
    /// Zona sem limiares conhecidos.
    pub const UNKNOWN: TripPoints = TripPoints {
        trip0: UNKNOWN_TRIP,
        trip1: UNKNOWN_TRIP,
        trip2: UNKNOWN_TRIP,
    };

    pub const fn as_array(&self) -> [u32; 3] {
        [self.trip0, self.trip1, self.trip2]
    }
}

// ──────────────────────────────────────────────
// Estado da zona
// ──────────────────────────────────────────────

/// Uma zona térmica descoberta no início da sessão.
///
/// `kind` e os trip points são fixados na construção; só a temperatura
/// muda depois disso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneInfo {
    number: u16,
    kind: ZoneKind,
    trips: TripPoints,
    /// Última leitura (milligraus ou unidade nativa do sensor)
    pub temperature: u32,
}

impl ZoneInfo {
    pub fn new(number: u16, kind: ZoneKind, trips: TripPoints, temperature: u32) -> Self {
        Self {
            number,
            kind,
            trips,
            temperature,
        }
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn trips(&self) -> TripPoints {
        self.trips
    }

    /// Registro completo enviado no snapshot.
    pub fn record(&self) -> ZoneRecord {
        ZoneRecord {
            temperature: self.temperature,
            trip0: self.trips.trip0,
            trip1: self.trips.trip1,
            trip2: self.trips.trip2,
            number: self.number,
            kind: self.kind.code(),
        }
    }

    /// Par (kind, temperatura) enviado a cada tick.
    pub fn delta_entry(&self) -> DeltaEntry {
        DeltaEntry {
            kind: self.kind.code(),
            temperature: self.temperature,
        }
    }
}

// ──────────────────────────────────────────────
// Registros do fio
// ──────────────────────────────────────────────

/// Registro de zona no frame de snapshot (20 bytes, ordem dos campos = ordem no fio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub temperature: u32,
    pub trip0: u32,
    pub trip1: u32,
    pub trip2: u32,
    pub number: u16,
    pub kind: u16,
}

/// Entrada do frame delta (6 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub kind: u16,
    pub temperature: u32,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
