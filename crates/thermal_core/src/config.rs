//! Configuração via TOML.
//!
//! Porta vsock e intervalo de envio são fixos pelo protocolo e não fazem
//! parte do arquivo; o guest espera sempre os mesmos valores.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Porta vsock em que o host escuta.
pub const VSOCK_PORT: u32 = 1235;

/// Intervalo entre frames delta.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// `VMADDR_CID_ANY`: aceita conexões de qualquer guest.
pub const CID_ANY: u32 = u32::MAX;

/// Socket opcional de eventos ACPI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcpidConfig {
    /// Conectar ao acpid a cada sessão
    pub enabled: bool,
    /// Caminho do socket Unix do acpid
    pub socket_path: String,
}

impl Default for AcpidConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            socket_path: "/var/run/acpid.socket".into(),
        }
    }
}

/// Configuração do Sender (host).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Diretório com as entradas `thermal_zoneN`
    pub sysfs_root: String,
    /// CID vsock para bind (4294967295 = qualquer)
    pub listen_cid: u32,
    /// Socket de eventos ACPI
    pub acpid: AcpidConfig,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            sysfs_root: "/sys/class/thermal".into(),
            listen_cid: CID_ANY,
            acpid: AcpidConfig::default(),
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sender.sysfs_root.trim().is_empty() {
            errors.push("sysfs_root não pode ser vazio".into());
        }
        if self.sender.acpid.enabled && self.sender.acpid.socket_path.trim().is_empty() {
            errors.push("acpid.socket_path vazio com acpid habilitado".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.sender.sysfs_root, parsed.sender.sysfs_root);
        assert_eq!(config.sender.listen_cid, parsed.sender.listen_cid);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[sender.acpid]
enabled = false
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert!(!config.sender.acpid.enabled);
        // Outros campos devem ter valor padrão
        assert_eq!(config.sender.acpid.socket_path, "/var/run/acpid.socket");
        assert_eq!(config.sender.sysfs_root, "/sys/class/thermal");
        assert_eq!(config.sender.listen_cid, CID_ANY);
    }

    #[test]
    fn empty_paths_are_rejected() {
        let mut config = AppConfig::default();
        config.sender.sysfs_root = " ".into();
        config.sender.acpid.socket_path.clear();
        assert_eq!(config.validate().len(), 2);

        config.sender.acpid.enabled = false;
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.sender.sysfs_root = "/tmp/fake-thermal".into();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.sender.sysfs_root, "/tmp/fake-thermal");
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sender\nsysfs_root = ").unwrap();
        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.sender.sysfs_root, "/sys/class/thermal");
    }
}
