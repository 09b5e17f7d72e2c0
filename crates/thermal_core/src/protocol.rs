//! Protocolo de comunicação binário host → guest.
//!
//! Todo frame tem exatamente [`FRAME_SIZE`] bytes. O header vem primeiro e
//! o payload logo atrás; o resto do buffer vai junto, seja o que for.
//!
//! ```text
//! ┌──────────────────┬─────────────┬───────────┬──────────────┬─────────┐
//! │ ProtocolId(8)    │ NotifyId(2) │ Length(2) │ Payload (N)  │ resto   │
//! └──────────────────┴─────────────┴───────────┴──────────────┴─────────┘
//! ```
//!
//! - Snapshot (`notify_id = 1`): N = zonas × 20 bytes ([`ZoneRecord`])
//! - Delta (`notify_id = 2`): N = 4 (contagem) + zonas × 6 bytes ([`DeltaEntry`])
//!
//! Layout canônico: packed, little-endian, campos na ordem declarada.
//! É o que o bincode 1.x produz com as opções padrão, e coincide com o
//! layout nativo x86-64 das structs de referência (nenhuma tem padding).

use crate::types::{DeltaEntry, ZoneInfo, ZoneRecord};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::io::Cursor;

/// Tag fixa que abre todo frame.
pub const PROTOCOL_ID: [u8; 8] = *b"INTELIPC";

/// Tamanho fixo de todo frame transmitido.
pub const FRAME_SIZE: usize = 1024;

/// Tamanho do header (protocol_id + notify_id + length).
pub const HEADER_SIZE: usize = 12;

/// Tamanho de um [`ZoneRecord`] no fio.
pub const ZONE_RECORD_SIZE: usize = 20;

/// Tamanho de um [`DeltaEntry`] no fio (kind + temperatura).
pub const DELTA_ENTRY_SIZE: usize = 6;

/// Tamanho do campo de contagem de zonas no frame delta.
pub const ZONE_COUNT_SIZE: usize = 4;

/// Maior número de zonas que cabe num snapshot.
pub const MAX_ZONES: usize = (FRAME_SIZE - HEADER_SIZE) / ZONE_RECORD_SIZE;

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Frame muito curto ({0} bytes, mínimo {HEADER_SIZE})")]
    TooShort(usize),

    #[error("Protocol id inválido: {0:?} (esperado \"INTELIPC\")")]
    InvalidProtocolId([u8; 8]),

    #[error("NotifyId desconhecido: {0}")]
    UnknownNotifyId(u16),

    #[error("Length declarado ({declared}) excede o frame ({available} bytes de payload)")]
    Truncated { declared: usize, available: usize },

    #[error("Length declarado ({declared}) não bate com o esperado ({expected})")]
    LengthMismatch { declared: usize, expected: usize },

    #[error("{count} zonas não cabem no frame (máximo {MAX_ZONES})")]
    TooManyZones { count: usize },

    #[error("Erro de serialização: {0}")]
    Serialize(String),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),
}

// ──────────────────────────────────────────────
// Header
// ──────────────────────────────────────────────

/// Discriminador do tipo de frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum NotifyId {
    Snapshot = 1,
    Delta = 2,
}

impl NotifyId {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(NotifyId::Snapshot),
            2 => Some(NotifyId::Delta),
            _ => None,
        }
    }
}

/// Envelope de todo frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub protocol_id: [u8; 8],
    pub notify_id: u16,
    /// Bytes de payload após o header (informativo para o receptor)
    pub length: u16,
}

impl Header {
    fn new(notify: NotifyId, zone_count: usize) -> Result<Self, ProtocolError> {
        if zone_count > MAX_ZONES {
            return Err(ProtocolError::TooManyZones { count: zone_count });
        }
        let length = match notify {
            NotifyId::Snapshot => snapshot_length(zone_count),
            NotifyId::Delta => delta_length(zone_count),
        };
        let length = u16::try_from(length)
            .map_err(|_| ProtocolError::TooManyZones { count: zone_count })?;
        Ok(Self {
            protocol_id: PROTOCOL_ID,
            notify_id: notify as u16,
            length,
        })
    }

    pub fn notify(&self) -> Option<NotifyId> {
        NotifyId::from_raw(self.notify_id)
    }
}

/// Payload de um snapshot com `zone_count` zonas.
pub const fn snapshot_length(zone_count: usize) -> usize {
    zone_count * ZONE_RECORD_SIZE
}

/// Payload de um delta com `zone_count` zonas.
pub const fn delta_length(zone_count: usize) -> usize {
    zone_count * DELTA_ENTRY_SIZE + ZONE_COUNT_SIZE
}

// ──────────────────────────────────────────────
// Encode
// ──────────────────────────────────────────────

/// Buffer de transmissão reutilizado durante toda a sessão.
///
/// Cada encode sobrescreve só o começo do buffer. Os bytes após o payload
/// guardam o conteúdo de frames anteriores e são transmitidos assim mesmo:
/// o receptor espera um frame de tamanho fixo, não um frame delimitado.
pub struct FrameBuffer {
    bytes: [u8; FRAME_SIZE],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0; FRAME_SIZE],
        }
    }

    /// Frame completo a transmitir.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Escreve um snapshot: header + um [`ZoneRecord`] por zona, em ordem.
    pub fn encode_snapshot(&mut self, zones: &[ZoneInfo]) -> Result<Header, ProtocolError> {
        let header = Header::new(NotifyId::Snapshot, zones.len())?;
        let mut cursor = Cursor::new(&mut self.bytes[..]);
        write_value(&mut cursor, &header)?;
        for zone in zones {
            write_value(&mut cursor, &zone.record())?;
        }
        debug_assert_eq!(
            cursor.position() as usize,
            HEADER_SIZE + usize::from(header.length)
        );
        Ok(header)
    }

    /// Escreve um delta: header + contagem (u32) + (kind, temperatura) por zona.
    pub fn encode_delta(&mut self, zones: &[ZoneInfo]) -> Result<Header, ProtocolError> {
        let header = Header::new(NotifyId::Delta, zones.len())?;
        let mut cursor = Cursor::new(&mut self.bytes[..]);
        write_value(&mut cursor, &header)?;
        write_value(&mut cursor, &(zones.len() as u32))?;
        for zone in zones {
            write_value(&mut cursor, &zone.delta_entry())?;
        }
        debug_assert_eq!(
            cursor.position() as usize,
            HEADER_SIZE + usize::from(header.length)
        );
        Ok(header)
    }
}

fn write_value<T: Serialize>(
    cursor: &mut Cursor<&mut [u8]>,
    value: &T,
) -> Result<(), ProtocolError> {
    bincode::serialize_into(cursor, value).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Decode (lado guest)
// ──────────────────────────────────────────────

/// Frame decodificado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Snapshot(Vec<ZoneRecord>),
    Delta(Vec<DeltaEntry>),
}

impl Frame {
    pub fn notify(&self) -> NotifyId {
        match self {
            Frame::Snapshot(_) => NotifyId::Snapshot,
            Frame::Delta(_) => NotifyId::Delta,
        }
    }

    pub fn zone_count(&self) -> usize {
        match self {
            Frame::Snapshot(records) => records.len(),
            Frame::Delta(entries) => entries.len(),
        }
    }
}

/// Lê só o header de um frame.
pub fn decode_header(data: &[u8]) -> Result<Header, ProtocolError> {
    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::TooShort(data.len()));
    }
    let header: Header = read_value(&data[..HEADER_SIZE])?;
    if header.protocol_id != PROTOCOL_ID {
        return Err(ProtocolError::InvalidProtocolId(header.protocol_id));
    }
    Ok(header)
}

/// Decodifica um frame recebido do host.
///
/// Valida protocol id, notify id e o `length` declarado antes de ler os
/// registros. Bytes após o payload são ignorados.
pub fn decode_frame(data: &[u8]) -> Result<Frame, ProtocolError> {
    let header = decode_header(data)?;
    let declared = usize::from(header.length);
    let available = data.len() - HEADER_SIZE;
    if declared > available {
        return Err(ProtocolError::Truncated {
            declared,
            available,
        });
    }
    let payload = &data[HEADER_SIZE..HEADER_SIZE + declared];

    match header.notify() {
        Some(NotifyId::Snapshot) => {
            let expected = snapshot_length(declared / ZONE_RECORD_SIZE);
            if expected != declared {
                return Err(ProtocolError::LengthMismatch { declared, expected });
            }
            payload
                .chunks_exact(ZONE_RECORD_SIZE)
                .map(read_value::<ZoneRecord>)
                .collect::<Result<Vec<_>, _>>()
                .map(Frame::Snapshot)
        }
        Some(NotifyId::Delta) => {
            if declared < ZONE_COUNT_SIZE {
                return Err(ProtocolError::LengthMismatch {
                    declared,
                    expected: ZONE_COUNT_SIZE,
                });
            }
            let count: u32 = read_value(&payload[..ZONE_COUNT_SIZE])?;
            let expected = delta_length(count as usize);
            if expected != declared {
                return Err(ProtocolError::LengthMismatch { declared, expected });
            }
            payload[ZONE_COUNT_SIZE..]
                .chunks_exact(DELTA_ENTRY_SIZE)
                .map(read_value::<DeltaEntry>)
                .collect::<Result<Vec<_>, _>>()
                .map(Frame::Delta)
        }
        None => Err(ProtocolError::UnknownNotifyId(header.notify_id)),
    }
}

fn read_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    bincode::deserialize(bytes).map_err(|e| ProtocolError::Deserialize(e.to_string()))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
