//! Sessão por peer: snapshot inicial seguido de deltas periódicos.
//!
//! Uma [`Session`] nasce a cada accept e morre na primeira falha de envio.
//! Zonas, buffer de frame e níveis de trip não sobrevivem entre sessões.

use crate::server::PeerStream;
use crate::sysfs::ThermalSysfs;
use std::convert::Infallible;
use std::io::{self, Write};
use thermal_core::config::POLL_INTERVAL;
use thermal_core::protocol::{FrameBuffer, MAX_ZONES, ProtocolError};
use thermal_core::trips::{TripLevel, trip_level};
use thermal_core::types::ZoneInfo;
use tracing::{debug, info, warn};

/// Motivos pelos quais uma sessão termina.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Erro ao enviar frame: {0}")]
    Send(#[from] io::Error),

    #[error("Envio parcial: {written} de {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Erro ao montar frame: {0}")]
    Encode(#[from] ProtocolError),
}

/// Estado de uma conexão com o guest.
pub struct Session<'a, S> {
    sysfs: &'a ThermalSysfs,
    stream: S,
    peer: String,
    zones: Vec<ZoneInfo>,
    levels: Vec<TripLevel>,
    frame: FrameBuffer,
    ticks: u64,
}

impl<'a, S: PeerStream> Session<'a, S> {
    /// Coloca o socket em modo não bloqueante e descobre as zonas.
    ///
    /// O número de zonas fica fixo até o fim da sessão.
    pub fn open(sysfs: &'a ThermalSysfs, stream: S, peer: String) -> Result<Self, SessionError> {
        stream.enable_nonblocking()?;
        let zones = discover_zones(sysfs);
        let levels = zones.iter().map(trip_level).collect();
        Ok(Self {
            sysfs,
            stream,
            peer,
            zones,
            levels,
            frame: FrameBuffer::new(),
            ticks: 0,
        })
    }

    /// Envia o snapshot e depois um delta por [`POLL_INTERVAL`] até o envio falhar.
    pub fn run(mut self) -> Result<Infallible, SessionError> {
        let header = self.frame.encode_snapshot(&self.zones)?;
        self.transmit()?;
        info!(
            "Snapshot → {}: {} zonas, {} bytes de payload",
            self.peer,
            self.zones.len(),
            header.length
        );

        // TODO: enviar só as zonas cuja temperatura mudou desde o último tick
        loop {
            std::thread::sleep(POLL_INTERVAL);

            for zone in &mut self.zones {
                self.sysfs.refresh_temperature(zone);
            }
            self.log_trip_changes();

            let header = self.frame.encode_delta(&self.zones)?;
            self.transmit()?;
            self.ticks += 1;
            debug!(
                "Delta #{} → {}: {} zonas, {} bytes de payload",
                self.ticks,
                self.peer,
                self.zones.len(),
                header.length
            );
        }
    }

    /// Envia o buffer inteiro numa única escrita não bloqueante.
    fn transmit(&mut self) -> Result<(), SessionError> {
        let bytes = self.frame.as_bytes();
        let written = self.stream.write(bytes)?;
        if written != bytes.len() {
            return Err(SessionError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }

    fn log_trip_changes(&mut self) {
        for (zone, last) in self.zones.iter().zip(self.levels.iter_mut()) {
            let level = trip_level(zone);
            if level == *last {
                continue;
            }
            if level > *last {
                warn!(
                    "Zona {} ({}) subiu para {:?}: {} m°C",
                    zone.number(),
                    zone.kind(),
                    level,
                    zone.temperature
                );
            } else {
                info!(
                    "Zona {} ({}) voltou para {:?}: {} m°C",
                    zone.number(),
                    zone.kind(),
                    level,
                    zone.temperature
                );
            }
            *last = level;
        }
    }
}

/// Varre o sysfs e carrega todas as zonas, limitado ao que cabe num frame.
pub fn discover_zones(sysfs: &ThermalSysfs) -> Vec<ZoneInfo> {
    let mut count = sysfs.count_zones();
    if count > MAX_ZONES {
        warn!("{count} zonas encontradas, apenas {MAX_ZONES} cabem no frame");
        count = MAX_ZONES;
    }
    info!("{count} zonas térmicas em {}", sysfs.root().display());
    (0..count as u16).map(|i| sysfs.load_zone(i)).collect()
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
