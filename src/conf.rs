//! The Serializable configuration data structures used for setup.
use std::{os::fd::RawFd, path::PathBuf};

use log::LevelFilter;
use pollmux::{Interest, PollerKind};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InterestConf {
    Read,
    Write,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevelConf {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelConf> for LevelFilter {
    fn from(level: LogLevelConf) -> Self {
        match level {
            LogLevelConf::Off => LevelFilter::Off,
            LogLevelConf::Error => LevelFilter::Error,
            LogLevelConf::Warn => LevelFilter::Warn,
            LogLevelConf::Info => LevelFilter::Info,
            LogLevelConf::Debug => LevelFilter::Debug,
            LogLevelConf::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WatchConf {
    pub fd: RawFd,

    #[serde(default = "default_interest")]
    pub interest: Vec<InterestConf>,
}

impl WatchConf {
    pub fn interest(&self) -> Interest {
        self.interest
            .iter()
            .fold(Interest::NONE, |acc, i| match i {
                InterestConf::Read => acc | Interest::READ,
                InterestConf::Write => acc | Interest::WRITE,
                InterestConf::Error => acc | Interest::ERROR,
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_poller")]
    pub poller: PollerKind,

    #[serde(default = "default_capacity")]
    pub capacity: i32,

    #[serde(default = "default_max_events")]
    pub max_events: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i32,

    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default = "default_log_level")]
    pub log_level: LogLevelConf,

    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default = "default_watch")]
    pub watch: Vec<WatchConf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poller: default_poller(),
            capacity: default_capacity(),
            max_events: default_max_events(),
            timeout_ms: default_timeout_ms(),
            rounds: default_rounds(),
            log_level: default_log_level(),
            log_file: None,
            watch: default_watch(),
        }
    }
}

fn default_poller() -> PollerKind {
    if cfg!(any(target_os = "linux", target_os = "android")) {
        PollerKind::Epoll
    } else {
        PollerKind::Poll
    }
}

fn default_capacity() -> i32 {
    10
}

fn default_max_events() -> usize {
    1
}

fn default_timeout_ms() -> i32 {
    8000
}

fn default_rounds() -> u32 {
    1
}

fn default_log_level() -> LogLevelConf {
    LogLevelConf::Info
}

fn default_interest() -> Vec<InterestConf> {
    vec![InterestConf::Read]
}

fn default_watch() -> Vec<WatchConf> {
    vec![WatchConf {
        fd: 0,
        interest: default_interest(),
    }]
}
