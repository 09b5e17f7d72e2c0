//! Socket auxiliar de eventos ACPI (acpid).
//!
//! Aberto a cada sessão e mantido até ela acabar. Nada é lido dele; se o
//! acpid não estiver rodando, a sessão segue normalmente.

use std::os::unix::net::UnixStream;
use std::path::Path;
use tracing::{debug, warn};

/// Conecta ao socket do acpid. Falha só gera um aviso.
pub fn connect(path: &Path) -> Option<UnixStream> {
    match UnixStream::connect(path) {
        Ok(stream) => {
            debug!("✓ acpid conectado em {}", path.display());
            Some(stream)
        }
        Err(e) => {
            warn!("✗ acpid indisponível em {}: {e}", path.display());
            None
        }
    }
}
