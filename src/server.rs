use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::commands::executable::Executable;
use crate::commands::{arity_error, lookup, Command, MULTI};
use crate::config::Config;
use crate::connection::Connection;
use crate::db::{now_micros, Db};
use crate::frame::Frame;
use crate::persistence::{aof, Aof, Rdb, RdbError};

/// Shared server context: the database, both persistence engines, the
/// configuration, and the shutdown channel. Cheap to clone; one copy is
/// handed to every connection task and command handler.
#[derive(Clone)]
pub struct Server {
    pub db: Db,
    pub config: Arc<Config>,
    pub aof: Arc<Mutex<Option<Aof>>>,
    pub rdb: Arc<Rdb>,
    shutdown: Arc<watch::Sender<bool>>,
    clients: Arc<AtomicUsize>,
}

impl Server {
    pub fn new(config: Config) -> crate::Result<Server> {
        let db = Db::new(config.workerid, config.slowlogmaxlen);
        let rdb = Arc::new(Rdb::new(config.rdb_path(), config.rdbchecksum));
        let aof = if config.appendonly {
            Some(Aof::open(
                config.aof_path(),
                config.appendfsync,
                config.aofbuffersize,
            )?)
        } else {
            None
        };
        let (shutdown, _) = watch::channel(false);
        Ok(Server {
            db,
            config: Arc::new(config),
            aof: Arc::new(Mutex::new(aof)),
            rdb,
            shutdown: Arc::new(shutdown),
            clients: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// A context with persistence disabled and files pointed at the temp
    /// directory; used by command unit tests.
    #[cfg(test)]
    pub fn for_tests() -> Server {
        let mut config = Config::default();
        config.dir = std::env::temp_dir();
        config.appendonly = false;
        Server::new(config).unwrap()
    }

    pub fn request_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Run the server: recover persisted state, bind the listener, start the
/// expiration cron, and accept clients until SHUTDOWN.
pub async fn run(config: Config) -> crate::Result<()> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let server = Server::new(config)?;
    recover(&server)?;

    let listener = TcpListener::bind(("127.0.0.1", server.config.port)).await?;
    info!("rudis server listening on {}", listener.local_addr()?);

    spawn_expire_cron(&server);

    let mut shutdown = server.shutdown_signal();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        error!(%err, "accept failed");
                        continue;
                    }
                };
                let connected = server.clients.load(Ordering::Acquire);
                if connected >= server.config.maxclients {
                    warn!(%peer, connected, "max clients reached, dropping connection");
                    continue;
                }
                server.clients.fetch_add(1, Ordering::AcqRel);
                info!(%peer, "accepted connection");

                let server = server.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(server.clone(), socket).await {
                        error!(%err, %peer, "connection closed on error");
                    }
                    server.clients.fetch_sub(1, Ordering::AcqRel);
                });
            }
        }
    }

    if let Some(aof) = server.aof.lock().unwrap().as_mut() {
        if let Err(err) = aof.flush() {
            error!(%err, "final aof flush failed");
        }
    }
    info!("server stopped");
    Ok(())
}

/// On start the AOF wins when enabled; otherwise the RDB file is loaded if
/// present.
fn recover(server: &Server) -> crate::Result<()> {
    if server.config.appendonly {
        aof::replay(server, &server.config.aof_path())?;
        return Ok(());
    }
    match server.rdb.load(&server.db) {
        Ok(_) => Ok(()),
        Err(RdbError::FileNotExist) => Ok(()),
        Err(err) => {
            error!(%err, "rdb load failed");
            Err(err.into())
        }
    }
}

/// Periodic expiration: every 100 ms sample the expire dictionary and
/// evict overdue keys.
fn spawn_expire_cron(server: &Server) {
    let db = server.db.clone();
    let mut shutdown = server.shutdown_signal();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tick.tick() => {
                    let removed = db.lock().expire_cycle();
                    if removed > 0 {
                        debug!(removed, "expired keys evicted");
                    }
                }
            }
        }
    });
}

async fn handle_connection(server: Server, socket: TcpStream) -> crate::Result<()> {
    let mut conn = Connection::new(socket);
    let mut shutdown = server.shutdown_signal();

    loop {
        let argv = tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            argv = conn.read_command() => argv?,
        };
        let Some(argv) = argv else {
            info!("connection closed");
            return Ok(());
        };
        if argv.is_empty() {
            continue;
        }
        if argv[0].eq_ignore_ascii_case(b"quit") {
            conn.write_frame(&Frame::Simple("OK".to_string())).await?;
            return Ok(());
        }

        let reply = execute(&server, argv);
        conn.write_frame(&reply).await?;
    }
}

/// The dispatch pipeline for a live client: lookup, arity, handler, slow
/// log, AOF propagation.
pub fn execute(server: &Server, argv: Vec<Bytes>) -> Frame {
    process(server, argv, true)
}

/// Dispatch during AOF replay: same pipeline, no re-propagation and no
/// slow-log accounting. A logged EXPIRE carries the absolute deadline from
/// the append-time rewrite, so it is installed directly instead of being
/// re-offset from the current clock.
pub(crate) fn replay_command(server: &Server, argv: Vec<Bytes>) {
    if argv.len() == 3 && argv[0].eq_ignore_ascii_case(b"expire") {
        match crate::commands::parse_i64(&argv[2]) {
            Some(deadline) => {
                server.db.lock().set_expire(&argv[1], deadline);
            }
            None => warn!("replayed expire with a malformed deadline"),
        }
        return;
    }
    let reply = process(server, argv, false);
    if let Frame::Error(message) = reply {
        warn!(%message, "replayed command failed");
    }
}

fn process(server: &Server, argv: Vec<Bytes>, propagate: bool) -> Frame {
    let name = String::from_utf8_lossy(&argv[0]).to_ascii_lowercase();
    let Some(spec) = lookup(&name) else {
        return Frame::Error(format!(
            "ERR unknown command '{}'",
            String::from_utf8_lossy(&argv[0])
        ));
    };
    if spec.arity != MULTI && spec.arity as usize != argv.len() {
        return arity_error(&name);
    }
    let command = match Command::from_argv(&name, &argv) {
        Ok(command) => command,
        Err(err) => {
            error!(%err, command = %name, "command parse failed");
            return Frame::Error("ERR internal error".to_string());
        }
    };

    let start = now_micros();
    let outcome = match command.exec(server.clone()) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%err, command = %name, "command execution failed");
            return Frame::Error("ERR internal error".to_string());
        }
    };
    let duration = now_micros() - start;

    if propagate {
        let threshold = server.config.slowlogslowerthan;
        if threshold >= 0 && duration > threshold {
            server
                .db
                .lock()
                .slowlog
                .record(start, duration, argv.clone());
        }
        if spec.mutator && outcome.dirty {
            if let Some(aof) = server.aof.lock().unwrap().as_mut() {
                let appended = if name == "expire" {
                    aof.append_expire(&argv)
                } else {
                    aof.append(&argv)
                };
                if let Err(err) = appended {
                    error!(%err, command = %name, "aof append failed");
                }
            }
        }
    }
    outcome.reply
}
