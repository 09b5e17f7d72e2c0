//! # Thermal Sender
//!
//! Lê as zonas térmicas do host e envia as temperaturas para o guest via
//! vsock: um snapshot completo por conexão e depois um delta por segundo.
//!
//! ## Uso
//! ```bash
//! thermal_sender                          # config.toml ao lado do executável
//! thermal_sender --config /etc/thermal.toml
//! ```

#[cfg(unix)]
mod acpid;
mod server;
mod session;
mod sysfs;

use std::path::PathBuf;
use sysfs::ThermalSysfs;
use thermal_core::config::{AppConfig, POLL_INTERVAL, VSOCK_PORT};
use thermal_core::protocol::FRAME_SIZE;
use tracing::{error, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = config_path_from_args().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Config inválida: {e}");
        }
        std::process::exit(1);
    }

    let sender_cfg = &config.sender;
    let sysfs = ThermalSysfs::new(&sender_cfg.sysfs_root);
    let acpid_socket = sender_cfg
        .acpid
        .enabled
        .then(|| PathBuf::from(&sender_cfg.acpid.socket_path));

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🌡 THERMAL SENDER – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  vsock:     cid({}) port({})", sender_cfg.listen_cid, VSOCK_PORT);
    println!("  Zonas:     {}", sysfs.root().display());
    println!("  Frame:     {FRAME_SIZE} bytes a cada {:.1}s", POLL_INTERVAL.as_secs_f64());
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop de accept ──
    #[cfg(target_os = "linux")]
    {
        let listener = match server::VsockPeerListener::bind(sender_cfg.listen_cid, VSOCK_PORT) {
            Ok(listener) => listener,
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        };
        let mut server = server::Server::new(listener, sysfs, acpid_socket);
        let Err(e) = server.serve_forever();
        error!("{e}");
        std::process::exit(1);
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (sysfs, acpid_socket);
        error!("Sockets vsock só existem no Linux");
        std::process::exit(1);
    }
}

/// `--config <caminho>` ou `--config=<caminho>`.
fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}
