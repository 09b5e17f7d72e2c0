//! Zonas térmicas via sysfs (`/sys/class/thermal/thermal_zoneN`).
//!
//! Cada zona é um diretório com um atributo textual (`type`) e um numérico
//! (`temp`). A descoberta assume índices contíguos a partir de 0: o primeiro
//! índice sem `type` legível encerra a varredura, mesmo que existam zonas
//! com índice maior.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thermal_core::classify::classify;
use thermal_core::types::ZoneInfo;
use tracing::{debug, warn};

/// Atributo com a temperatura atual.
pub const TEMPERATURE_ATTR: &str = "temp";

/// Atributo com o label da zona.
pub const TYPE_ATTR: &str = "type";

/// Bytes lidos, no máximo, de um atributo textual.
pub const MAX_LABEL_LEN: usize = 50;

/// Raiz do sysfs térmico.
#[derive(Debug, Clone)]
pub struct ThermalSysfs {
    root: PathBuf,
}

impl ThermalSysfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Diretório da zona `index`.
    pub fn zone_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("thermal_zone{index}"))
    }

    /// Conta as zonas presentes a partir do índice 0.
    pub fn count_zones(&self) -> usize {
        let mut count = 0;
        while File::open(self.zone_path(count).join(TYPE_ATTR)).is_ok() {
            debug!("Zona {count} encontrada");
            count += 1;
        }
        count
    }

    /// Lê label e temperatura da zona `index` e a classifica.
    ///
    /// Label ilegível classifica como UNKNOWN; temperatura ilegível começa em 0.
    pub fn load_zone(&self, index: u16) -> ZoneInfo {
        let path = self.zone_path(usize::from(index));
        let label = read_text(&path, TYPE_ATTR).unwrap_or_default();
        let temperature = read_numeric(&path, TEMPERATURE_ATTR).unwrap_or(0);
        let class = classify(&label);
        debug!(
            "Zona {index}: label {:?} → {} ({} m°C)",
            label.trim_end(),
            class.kind,
            temperature
        );
        ZoneInfo::new(index, class.kind, class.trips, temperature)
    }

    /// Atualiza a temperatura da zona.
    ///
    /// Se a leitura falhar o valor anterior fica como está: o guest continua
    /// vendo a última leitura boa em vez de zero.
    pub fn refresh_temperature(&self, zone: &mut ZoneInfo) {
        let path = self.zone_path(usize::from(zone.number()));
        if let Some(value) = read_numeric(&path, TEMPERATURE_ATTR) {
            zone.temperature = value;
        }
    }
}

// ──────────────────────────────────────────────
// Leitura de atributos
// ──────────────────────────────────────────────

/// Lê um atributo decimal. Valores negativos são reinterpretados como `u32`.
pub fn read_numeric(zone_path: &Path, attribute: &str) -> Option<u32> {
    let path = zone_path.join(attribute);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Falha ao abrir {} para leitura: {e}", path.display());
            return None;
        }
    };
    match content.trim().parse::<i32>() {
        Ok(value) => Some(value as u32),
        Err(e) => {
            warn!("Valor inválido em {}: {:?} ({e})", path.display(), content.trim());
            None
        }
    }
}

/// Lê até [`MAX_LABEL_LEN`] bytes de um atributo textual.
pub fn read_text(zone_path: &Path, attribute: &str) -> Option<String> {
    let path = zone_path.join(attribute);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Falha ao abrir {} para leitura: {e}", path.display());
            return None;
        }
    };
    let mut buf = Vec::with_capacity(MAX_LABEL_LEN);
    if let Err(e) = file.take(MAX_LABEL_LEN as u64).read_to_end(&mut buf) {
        warn!("Falha ao ler {}: {e}", path.display());
        return None;
    }
    Some(String::from_utf8_lossy(&buf).into_owned())
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use thermal_core::types::{TripPoints, ZoneKind};

    /// Cria `thermal_zone{index}` com `type` e, opcionalmente, `temp`.
    pub(crate) fn fake_zone(root: &Path, index: usize, label: &str, temp: Option<i64>) {
        let dir = root.join(format!("thermal_zone{index}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(TYPE_ATTR), format!("{label}\n")).unwrap();
        if let Some(temp) = temp {
            std::fs::write(dir.join(TEMPERATURE_ATTR), format!("{temp}\n")).unwrap();
        }
    }

    #[test]
    fn counts_contiguous_zones() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            fake_zone(dir.path(), i, "acpitz", Some(40000));
        }
        assert_eq!(ThermalSysfs::new(dir.path()).count_zones(), 3);
    }

    #[test]
    fn no_zones_counts_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ThermalSysfs::new(dir.path()).count_zones(), 0);
        assert_eq!(ThermalSysfs::new(dir.path().join("missing")).count_zones(), 0);
    }

    #[test]
    fn gap_truncates_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fake_zone(dir.path(), 0, "x86_pkg_temp", Some(50000));
        fake_zone(dir.path(), 1, "battery", Some(30000));
        fake_zone(dir.path(), 3, "acpitz", Some(45000));
        assert_eq!(ThermalSysfs::new(dir.path()).count_zones(), 2);
    }

    #[test]
    fn zone_without_temp_still_counts() {
        let dir = tempfile::tempdir().unwrap();
        fake_zone(dir.path(), 0, "acpitz", None);
        assert_eq!(ThermalSysfs::new(dir.path()).count_zones(), 1);
    }

    #[test]
    fn numeric_parsing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok"), "47000\n").unwrap();
        std::fs::write(dir.path().join("neg"), "-5\n").unwrap();
        std::fs::write(dir.path().join("junk"), "hot\n").unwrap();

        assert_eq!(read_numeric(dir.path(), "ok"), Some(47000));
        assert_eq!(read_numeric(dir.path(), "neg"), Some(-5i32 as u32));
        assert_eq!(read_numeric(dir.path(), "junk"), None);
        assert_eq!(read_numeric(dir.path(), "absent"), None);
    }

    #[test]
    fn text_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("long"), "a".repeat(200)).unwrap();
        let text = read_text(dir.path(), "long").unwrap();
        assert_eq!(text.len(), MAX_LABEL_LEN);
        assert_eq!(read_text(dir.path(), "absent"), None);
    }

    #[test]
    fn load_zone_classifies_label() {
        let dir = tempfile::tempdir().unwrap();
        fake_zone(dir.path(), 0, "x86_pkg_temp", Some(52000));
        fake_zone(dir.path(), 1, "battery", Some(31000));
        let sysfs = ThermalSysfs::new(dir.path());

        let cpu = sysfs.load_zone(0);
        assert_eq!(cpu.number(), 0);
        assert_eq!(cpu.kind(), ZoneKind::Cpu);
        assert_eq!(cpu.temperature, 52000);
        assert_eq!(cpu.trips().as_array(), [85000, 95000, 99000]);

        let battery = sysfs.load_zone(1);
        assert_eq!(battery.kind(), ZoneKind::Battery);
        assert_eq!(battery.trips(), TripPoints::UNKNOWN);
    }

    #[test]
    fn unreadable_label_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let sysfs = ThermalSysfs::new(dir.path());
        let zone = sysfs.load_zone(7);
        assert_eq!(zone.kind(), ZoneKind::Unknown);
        assert_eq!(zone.temperature, 0);
    }

    #[test]
    fn failed_read_keeps_previous_temperature() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            fake_zone(dir.path(), i, "acpitz", Some(42000));
        }
        let sysfs = ThermalSysfs::new(dir.path());
        let mut zone = sysfs.load_zone(2);
        sysfs.refresh_temperature(&mut zone);
        assert_eq!(zone.temperature, 42000);

        std::fs::remove_file(sysfs.zone_path(2).join(TEMPERATURE_ATTR)).unwrap();
        sysfs.refresh_temperature(&mut zone);
        assert_eq!(zone.temperature, 42000);
    }
}
