use std::path::{Path, PathBuf};

use tracing::warn;

/// How often the AOF buffer is pushed to disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FsyncPolicy {
    /// Flush after every command.
    Always,
    /// Flush at most once per second; commands in between only hit the buffer.
    #[default]
    EverySec,
    /// Never flush explicitly; the OS decides.
    No,
}

impl FsyncPolicy {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Some(FsyncPolicy::Always),
            "everysec" => Some(FsyncPolicy::EverySec),
            "no" => Some(FsyncPolicy::No),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Worker id folded into slow-log entry ids.
    pub workerid: u16,
    pub appendonly: bool,
    /// Directory holding both persistence files.
    pub dir: PathBuf,
    pub appendfilename: String,
    pub appendfsync: FsyncPolicy,
    /// Capacity of the AOF write-behind buffer, in bytes.
    pub aofbuffersize: usize,
    /// Reserved; accepted but not implemented.
    pub rdbcompression: bool,
    pub rdbchecksum: bool,
    pub dbfilename: String,
    /// Commands slower than this many microseconds land in the slow log.
    /// Negative disables the slow log.
    pub slowlogslowerthan: i64,
    pub slowlogmaxlen: usize,
    pub maxclients: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 6379,
            workerid: 0,
            appendonly: false,
            dir: PathBuf::from("./"),
            appendfilename: "appendonly.aof".to_string(),
            appendfsync: FsyncPolicy::default(),
            aofbuffersize: 16 * 1024,
            rdbcompression: false,
            rdbchecksum: true,
            dbfilename: "dump.rdb".to_string(),
            slowlogslowerthan: 10_000,
            slowlogmaxlen: 128,
            maxclients: 10_000,
        }
    }
}

impl Config {
    /// Load a `key value` configuration file. Lines starting with `#` and
    /// blank lines are skipped; unknown keys are logged and ignored so an
    /// old server can read a newer file.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default().trim();
            config.apply(key, value);
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key.to_ascii_lowercase().as_str() {
            "port" => self.set_or_warn(value, |c, v| c.port = v),
            "workerid" => self.set_or_warn(value, |c, v| c.workerid = v),
            "appendonly" => self.set_bool_or_warn(value, |c, v| c.appendonly = v),
            "dir" => self.dir = PathBuf::from(value),
            "appendfilename" => self.appendfilename = value.to_string(),
            "appendfsync" => match FsyncPolicy::from_str(value) {
                Some(policy) => self.appendfsync = policy,
                None => warn!(value, "invalid appendfsync policy, keeping default"),
            },
            "aofbuffersize" => self.set_or_warn(value, |c, v| c.aofbuffersize = v),
            "rdbcompression" => self.set_bool_or_warn(value, |c, v| c.rdbcompression = v),
            "rdbchecksum" => self.set_bool_or_warn(value, |c, v| c.rdbchecksum = v),
            "dbfilename" => self.dbfilename = value.to_string(),
            "slowlogslowerthan" => self.set_or_warn(value, |c, v| c.slowlogslowerthan = v),
            "slowlogmaxlen" => self.set_or_warn(value, |c, v| c.slowlogmaxlen = v),
            "maxclients" => self.set_or_warn(value, |c, v| c.maxclients = v),
            _ => warn!(key, "unknown configuration key"),
        }
    }

    fn set_or_warn<T: std::str::FromStr>(&mut self, value: &str, set: impl FnOnce(&mut Self, T)) {
        match value.parse::<T>() {
            Ok(parsed) => set(self, parsed),
            Err(_) => warn!(value, "invalid configuration value, keeping default"),
        }
    }

    fn set_bool_or_warn(&mut self, value: &str, set: impl FnOnce(&mut Self, bool)) {
        match value.to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => set(self, true),
            "no" | "false" | "0" => set(self, false),
            _ => warn!(value, "invalid boolean configuration value, keeping default"),
        }
    }

    pub fn aof_path(&self) -> PathBuf {
        self.dir.join(&self.appendfilename)
    }

    pub fn rdb_path(&self) -> PathBuf {
        self.dir.join(&self.dbfilename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_correct() {
        let config = Config::default();
        assert_eq!(config.port, 6379);
        assert!(!config.appendonly);
        assert_eq!(config.appendfsync, FsyncPolicy::EverySec);
        assert_eq!(config.dbfilename, "dump.rdb");
        assert_eq!(config.slowlogmaxlen, 128);
    }

    #[test]
    fn parses_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# test configuration").unwrap();
        writeln!(file, "port 7000").unwrap();
        writeln!(file, "appendonly yes").unwrap();
        writeln!(file, "appendfsync always").unwrap();
        writeln!(file, "dir /tmp/rudis").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "slowlogslowerthan -1").unwrap();
        writeln!(file, "some-future-key 42").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.port, 7000);
        assert!(config.appendonly);
        assert_eq!(config.appendfsync, FsyncPolicy::Always);
        assert_eq!(config.dir, PathBuf::from("/tmp/rudis"));
        assert_eq!(config.slowlogslowerthan, -1);
        // Untouched keys keep their defaults.
        assert_eq!(config.maxclients, 10_000);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port not-a-number").unwrap();
        writeln!(file, "appendfsync sometimes").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.port, 6379);
        assert_eq!(config.appendfsync, FsyncPolicy::EverySec);
    }

    #[test]
    fn paths_join_dir() {
        let mut config = Config::default();
        config.dir = PathBuf::from("/var/lib/rudis");
        assert_eq!(config.aof_path(), PathBuf::from("/var/lib/rudis/appendonly.aof"));
        assert_eq!(config.rdb_path(), PathBuf::from("/var/lib/rudis/dump.rdb"));
    }
}
