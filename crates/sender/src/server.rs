//! Gerenciador de conexão: LISTENING → CONNECTED → LISTENING.
//!
//! Um peer por vez. Falha de envio encerra só a sessão e volta ao accept;
//! falha de bind ou de accept é fatal e sobe até o `main`.

use crate::session::{Session, SessionError};
use crate::sysfs::ThermalSysfs;
use std::convert::Infallible;
use std::io::{self, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use tracing::info;

/// Erros fatais do servidor.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Falha ao criar listener em {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Falha no accept: {0}")]
    Accept(#[source] io::Error),
}

// ──────────────────────────────────────────────
// Transporte
// ──────────────────────────────────────────────

/// Socket conectado a um peer.
pub trait PeerStream: Write {
    fn enable_nonblocking(&self) -> io::Result<()>;
}

/// Socket que aceita peers.
pub trait PeerListener {
    type Stream: PeerStream;

    /// Bloqueia até um peer conectar. Retorna o stream e a identidade do peer.
    fn accept_peer(&self) -> io::Result<(Self::Stream, String)>;

    fn describe(&self) -> String;
}

impl PeerStream for TcpStream {
    fn enable_nonblocking(&self) -> io::Result<()> {
        self.set_nonblocking(true)
    }
}

/// TCP local, útil para depurar sem VM.
impl PeerListener for TcpListener {
    type Stream = TcpStream;

    fn accept_peer(&self) -> io::Result<(TcpStream, String)> {
        let (stream, addr) = self.accept()?;
        Ok((stream, addr.to_string()))
    }

    fn describe(&self) -> String {
        match self.local_addr() {
            Ok(addr) => format!("tcp {addr}"),
            Err(_) => "tcp".into(),
        }
    }
}

#[cfg(target_os = "linux")]
pub use self::vsock_transport::VsockPeerListener;

#[cfg(target_os = "linux")]
mod vsock_transport {
    use super::{PeerListener, PeerStream, ServerError};
    use std::io;
    use vsock::{VsockListener, VsockStream};

    impl PeerStream for VsockStream {
        fn enable_nonblocking(&self) -> io::Result<()> {
            self.set_nonblocking(true)
        }
    }

    /// Listener vsock (guest → host).
    pub struct VsockPeerListener {
        inner: VsockListener,
        cid: u32,
        port: u32,
    }

    impl VsockPeerListener {
        pub fn bind(cid: u32, port: u32) -> Result<Self, ServerError> {
            let inner =
                VsockListener::bind_with_cid_port(cid, port).map_err(|source| ServerError::Bind {
                    addr: format!("vsock cid({cid}) port({port})"),
                    source,
                })?;
            Ok(Self { inner, cid, port })
        }
    }

    impl PeerListener for VsockPeerListener {
        type Stream = VsockStream;

        fn accept_peer(&self) -> io::Result<(VsockStream, String)> {
            let (stream, addr) = self.inner.accept()?;
            Ok((stream, format!("guest cid({})", addr.cid())))
        }

        fn describe(&self) -> String {
            format!("vsock cid({}) port({})", self.cid, self.port)
        }
    }
}

// ──────────────────────────────────────────────
// Loop de accept
// ──────────────────────────────────────────────

/// Servidor de um peer por vez.
pub struct Server<L> {
    listener: L,
    sysfs: ThermalSysfs,
    acpid_socket: Option<PathBuf>,
    sessions: u64,
}

impl<L: PeerListener> Server<L> {
    pub fn new(listener: L, sysfs: ThermalSysfs, acpid_socket: Option<PathBuf>) -> Self {
        Self {
            listener,
            sysfs,
            acpid_socket,
            sessions: 0,
        }
    }

    /// Aceita um peer e o atende até a sessão cair.
    ///
    /// Retorna o motivo do fim da sessão; só o accept falha de verdade.
    pub fn serve_next(&mut self) -> Result<SessionError, ServerError> {
        let (stream, peer) = self.listener.accept_peer().map_err(ServerError::Accept)?;
        self.sessions += 1;
        info!("Conectado: {peer} (sessão #{})", self.sessions);

        #[cfg(unix)]
        let _events = self
            .acpid_socket
            .as_deref()
            .and_then(crate::acpid::connect);

        let end = match Session::open(&self.sysfs, stream, peer.clone()) {
            Ok(session) => {
                let Err(end) = session.run();
                end
            }
            Err(e) => e,
        };
        info!("Sessão com {peer} encerrada ({end}), voltando a escutar");
        Ok(end)
    }

    /// Atende peers em sequência, para sempre.
    pub fn serve_forever(&mut self) -> Result<Infallible, ServerError> {
        info!("Escutando em {}", self.listener.describe());
        loop {
            self.serve_next()?;
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::tests::fake_zone;
    use std::io::Read;
    use std::time::{Duration, Instant};
    use thermal_core::config::POLL_INTERVAL;
    use thermal_core::protocol::{FRAME_SIZE, Frame, decode_frame};
    use thermal_core::types::ZoneKind;

    fn read_frame(stream: &mut TcpStream) -> Frame {
        let mut buf = [0u8; FRAME_SIZE];
        stream.read_exact(&mut buf).unwrap();
        decode_frame(&buf).unwrap()
    }

    fn connect(addr: std::net::SocketAddr) -> TcpStream {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        stream
    }

    #[test]
    fn end_to_end_snapshot_delta_and_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        fake_zone(dir.path(), 0, "x86_pkg_temp", Some(55000));
        fake_zone(dir.path(), 1, "battery", Some(31000));
        fake_zone(dir.path(), 2, "acpitz", Some(40000));
        fake_zone(dir.path(), 3, "pch_skylake", Some(45000));
        let sysfs = ThermalSysfs::new(dir.path());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut server = Server::new(listener, sysfs, None);
            let _ = server.serve_forever();
        });

        // Primeira sessão: snapshot
        let mut first = connect(addr);
        let Frame::Snapshot(records) = read_frame(&mut first) else {
            panic!("primeiro frame deveria ser snapshot");
        };
        let snapshot_at = Instant::now();
        assert_eq!(records.len(), 4);
        let kinds: Vec<_> = records
            .iter()
            .map(|r| ZoneKind::from_code(r.kind).unwrap())
            .collect();
        assert_eq!(
            kinds,
            [ZoneKind::Cpu, ZoneKind::Battery, ZoneKind::Unknown, ZoneKind::Unknown]
        );
        assert_eq!(
            [records[0].trip0, records[0].trip1, records[0].trip2],
            [85000, 95000, 99000]
        );
        assert!(records.iter().enumerate().all(|(i, r)| r.number == i as u16));

        // Temperaturas novas antes do primeiro tick
        for (i, temp) in [60000, 32000, 41000, 46000].iter().enumerate() {
            let path = dir.path().join(format!("thermal_zone{i}")).join("temp");
            std::fs::write(path, format!("{temp}\n")).unwrap();
        }

        let Frame::Delta(entries) = read_frame(&mut first) else {
            panic!("segundo frame deveria ser delta");
        };
        let elapsed = snapshot_at.elapsed();
        assert!(elapsed >= POLL_INTERVAL - Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < POLL_INTERVAL * 3, "{elapsed:?}");
        let pairs: Vec<_> = entries
            .iter()
            .map(|e| (ZoneKind::from_code(e.kind).unwrap(), e.temperature))
            .collect();
        assert_eq!(
            pairs,
            [
                (ZoneKind::Cpu, 60000),
                (ZoneKind::Battery, 32000),
                (ZoneKind::Unknown, 41000),
                (ZoneKind::Unknown, 46000),
            ]
        );

        // Desconecta: a próxima sessão começa de novo com snapshot
        drop(first);
        let mut second = connect(addr);
        let frame = read_frame(&mut second);
        assert!(matches!(frame, Frame::Snapshot(ref records) if records.len() == 4));
    }

    #[test]
    fn accept_failure_is_fatal() {
        struct BrokenListener;

        impl PeerListener for BrokenListener {
            type Stream = TcpStream;

            fn accept_peer(&self) -> io::Result<(TcpStream, String)> {
                Err(io::Error::other("boom"))
            }

            fn describe(&self) -> String {
                "quebrado".into()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut server = Server::new(BrokenListener, ThermalSysfs::new(dir.path()), None);
        let Err(err) = server.serve_forever();
        assert!(matches!(err, ServerError::Accept(_)));
    }
}
