//! # Thermal Core
//!
//! Crate compartilhada que define o modelo de zonas térmicas, o protocolo
//! binário de frame fixo (bincode), a classificação de zonas e a
//! configuração TOML do forwarder de temperatura host → guest.
//!
//! ## Módulos
//! - [`types`] – Zonas, tipos e registros do fio
//! - [`classify`] – Label do sensor → tipo + trip points
//! - [`protocol`] – Encode/decode dos frames snapshot e delta
//! - [`config`] – Configuração via TOML e constantes fixas
//! - [`trips`] – Níveis de trip para diagnóstico

pub mod types;
pub mod classify;
pub mod protocol;
pub mod config;
pub mod trips;

// Re-exports convenientes
pub use types::{ZoneInfo, ZoneKind};
pub use classify::classify;
pub use protocol::{FrameBuffer, decode_frame, FRAME_SIZE, PROTOCOL_ID};
pub use config::{AppConfig, SenderConfig};
