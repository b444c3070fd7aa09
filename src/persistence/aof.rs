use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use thiserror::Error as ThisError;
use tracing::{error, info};

use crate::commands::parse_i64;
use crate::config::FsyncPolicy;
use crate::db::now_secs;
use crate::frame::{encode_argv, RequestParser};
use crate::server::{self, Server};

#[derive(Debug, ThisError)]
pub enum AofError {
    #[error("failed to open aof file: {0}")]
    Open(std::io::Error),
    #[error("aof buffer write error")]
    BufferWrite,
    #[error("aof flush error: {0}")]
    Flush(std::io::Error),
}

/// The append-only log. Every dirty mutator is written in wire framing;
/// the chosen fsync policy decides when the buffer hits the disk.
pub struct Aof {
    writer: BufWriter<File>,
    fsync: FsyncPolicy,
    /// Second of the last explicit flush, for the everysec policy.
    last_flush: i64,
    path: PathBuf,
}

impl Aof {
    /// Open (or create) the log file for appending.
    pub fn open(
        path: PathBuf,
        fsync: FsyncPolicy,
        buffer_size: usize,
    ) -> Result<Aof, AofError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(AofError::Open)?;
        Ok(Aof {
            writer: BufWriter::with_capacity(buffer_size, file),
            fsync,
            last_flush: 0,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one command in bulk framing and apply the fsync policy.
    pub fn append(&mut self, argv: &[Bytes]) -> Result<(), AofError> {
        self.write(&encode_argv(argv))?;
        self.maybe_flush()
    }

    /// Append an EXPIRE with the relative seconds replaced by the absolute
    /// deadline, so a replay gives back the same expire dictionary no
    /// matter when it runs.
    pub fn append_expire(&mut self, argv: &[Bytes]) -> Result<(), AofError> {
        let Some(seconds) = parse_i64(&argv[2]) else {
            // The handler already rejected this; nothing to persist.
            return Ok(());
        };
        let deadline = now_secs() + seconds;
        let rewritten = vec![
            argv[0].clone(),
            argv[1].clone(),
            Bytes::from(deadline.to_string()),
        ];
        self.write(&encode_argv(&rewritten))?;
        self.maybe_flush()
    }

    fn write(&mut self, encoded: &[u8]) -> Result<(), AofError> {
        self.writer
            .write_all(encoded)
            .map_err(|_| AofError::BufferWrite)
    }

    fn maybe_flush(&mut self) -> Result<(), AofError> {
        match self.fsync {
            FsyncPolicy::Always => self.flush(),
            FsyncPolicy::EverySec => {
                if now_secs() - self.last_flush >= 1 {
                    self.flush()
                } else {
                    Ok(())
                }
            }
            FsyncPolicy::No => Ok(()),
        }
    }

    /// Push the buffer to the OS and fsync.
    pub fn flush(&mut self) -> Result<(), AofError> {
        self.writer.flush().map_err(AofError::Flush)?;
        self.writer.get_ref().sync_all().map_err(AofError::Flush)?;
        self.last_flush = now_secs();
        Ok(())
    }
}

/// Rebuild the keyspace by feeding the log through the regular parser and
/// dispatch pipeline, with replies discarded and persistence suppressed.
/// A missing file is an empty database. Returns how many commands were
/// applied.
pub fn replay(server: &Server, path: &Path) -> Result<usize, AofError> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(AofError::Open(err)),
    };

    let mut parser = RequestParser::new();
    let mut buf = BytesMut::from(&data[..]);
    let mut applied = 0;
    loop {
        match parser.parse(&mut buf) {
            Ok(Some(argv)) => {
                if !argv.is_empty() {
                    server::replay_command(server, argv);
                    applied += 1;
                }
            }
            Ok(None) => break,
            Err(err) => {
                // A torn tail from a crash mid-append; keep what loaded.
                error!(%err, "aof replay stopped at a malformed frame");
                break;
            }
        }
    }
    info!(applied, "aof replay finished");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Value;

    fn argv(parts: &[&str]) -> Vec<Bytes> {
        parts
            .iter()
            .map(|p| Bytes::copy_from_slice(p.as_bytes()))
            .collect()
    }

    fn aof_in(dir: &Path, fsync: FsyncPolicy) -> Aof {
        Aof::open(dir.join("appendonly.aof"), fsync, 16 * 1024).unwrap()
    }

    #[test]
    fn append_writes_wire_framing() {
        let dir = tempfile::tempdir().unwrap();
        let mut aof = aof_in(dir.path(), FsyncPolicy::Always);
        aof.append(&argv(&["SET", "foo", "bar"])).unwrap();

        let contents = std::fs::read(aof.path()).unwrap();
        assert_eq!(contents, b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
    }

    #[test]
    fn expire_is_rewritten_to_an_absolute_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let mut aof = aof_in(dir.path(), FsyncPolicy::Always);
        let before = now_secs();
        aof.append_expire(&argv(&["expire", "k", "100"])).unwrap();

        let contents = String::from_utf8(std::fs::read(aof.path()).unwrap()).unwrap();
        let deadline: i64 = contents
            .lines()
            .last()
            .and_then(|line| line.parse().ok())
            .unwrap();
        assert!(deadline >= before + 100);
        assert!(deadline <= now_secs() + 100);
    }

    #[test]
    fn no_policy_keeps_bytes_in_the_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut aof = aof_in(dir.path(), FsyncPolicy::No);
        aof.append(&argv(&["SET", "foo", "bar"])).unwrap();
        // Not flushed yet.
        assert_eq!(std::fs::read(aof.path()).unwrap(), b"");
        aof.flush().unwrap();
        assert_ne!(std::fs::read(aof.path()).unwrap(), b"");
    }

    #[tokio::test]
    async fn replay_rebuilds_the_keyspace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appendonly.aof");
        {
            let mut aof = Aof::open(path.clone(), FsyncPolicy::Always, 1024).unwrap();
            aof.append(&argv(&["SET", "foo", "bar"])).unwrap();
            aof.append(&argv(&["LPUSH", "l", "a", "b"])).unwrap();
            aof.append(&argv(&["DEL", "foo"])).unwrap();
        }

        let mut config = Config::default();
        config.dir = dir.path().to_path_buf();
        let server = Server::new(config).unwrap();
        let applied = replay(&server, &path).unwrap();
        assert_eq!(applied, 3);

        let mut state = server.db.lock();
        assert!(state.get(b"foo").is_none());
        let Some(Value::List(list)) = state.get_mut(b"l") else {
            panic!("expected a list");
        };
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn replayed_expire_restores_the_absolute_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appendonly.aof");
        let before = now_secs();
        {
            let mut aof = Aof::open(path.clone(), FsyncPolicy::Always, 1024).unwrap();
            aof.append(&argv(&["SET", "k", "v"])).unwrap();
            aof.append_expire(&argv(&["expire", "k", "500"])).unwrap();
        }

        let mut config = Config::default();
        config.dir = dir.path().to_path_buf();
        let server = Server::new(config).unwrap();
        replay(&server, &path).unwrap();

        let deadline = server.db.lock().expire_deadline(b"k").unwrap();
        assert!(deadline >= before + 500);
        assert!(deadline <= now_secs() + 500);
    }

    #[tokio::test]
    async fn replay_of_a_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.dir = dir.path().to_path_buf();
        let server = Server::new(config).unwrap();
        let applied = replay(&server, &dir.path().join("nope.aof")).unwrap();
        assert_eq!(applied, 0);
        assert!(server.db.lock().is_empty());
    }
}
