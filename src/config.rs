use crate::simulator::{HeapSearch, MemoryFaults, Options};
use clap::error::ErrorKind;
use clap::Parser;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Read from the working directory, if it exists
pub const CONFIG_FILE: &str = "riskvm.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Args(#[from] clap::Error),

    #[error("Failed to parse {CONFIG_FILE}: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to read {CONFIG_FILE}: {0}")]
    Io(#[from] io::Error),

    #[error("No file specified")]
    NoInputFile,
}

#[derive(Parser, Deserialize, Debug, Default, PartialEq, Eq)]
#[command(author, version, about)]
#[clap(disable_help_flag = true)]
#[serde(default, rename_all = "snake_case")]
pub struct OptionalConfig {
    #[clap(long, action = clap::ArgAction::HelpLong)]
    #[serde(skip)]
    help: Option<bool>,

    /// Logs every instruction executed to stderr
    #[arg(long)]
    pub trace: bool,

    /// Prints a listing of the instruction memory instead of running it
    #[arg(long)]
    pub disassemble: bool,

    /// What to do on a load or store outside memory. Defaults to strict
    #[arg(long, value_enum)]
    pub memory_faults: Option<MemoryFaults>,

    /// How malloc looks for free banks. Defaults to first-fit
    #[arg(long, value_enum)]
    pub heap_search: Option<HeapSearch>,

    /// The program image to run, exactly 2048 bytes
    pub file: Option<PathBuf>,
}

impl OptionalConfig {
    pub fn get_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    pub fn get_toml() -> Result<Self, ConfigError> {
        Self::read_toml(CONFIG_FILE)
    }

    /// An absent file is an empty config
    pub fn read_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(config) => Ok(toml::from_str(&config)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Fields set in `self` win over the ones in `rhs`
    pub fn merge(self, rhs: Self) -> Self {
        Self {
            help: self.help.or(rhs.help),
            trace: self.trace || rhs.trace,
            disassemble: self.disassemble || rhs.disassemble,
            memory_faults: self.memory_faults.or(rhs.memory_faults),
            heap_search: self.heap_search.or(rhs.heap_search),
            file: self.file.or(rhs.file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub trace: bool,
    pub disassemble: bool,
    pub memory_faults: MemoryFaults,
    pub heap_search: HeapSearch,
    pub file: PathBuf,
}

impl TryFrom<OptionalConfig> for Config {
    type Error = ConfigError;

    fn try_from(config: OptionalConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            trace: config.trace,
            disassemble: config.disassemble,
            memory_faults: config.memory_faults.unwrap_or_default(),
            heap_search: config.heap_search.unwrap_or_default(),
            file: config.file.ok_or(ConfigError::NoInputFile)?,
        })
    }
}

impl From<&Config> for Options {
    fn from(config: &Config) -> Self {
        Options {
            memory_faults: config.memory_faults,
            heap_search: config.heap_search,
            trace: config.trace,
        }
    }
}

impl Config {
    /// Reads the command line, then fills the gaps from [`CONFIG_FILE`]. `--help` and
    /// `--version` print and exit here.
    pub fn get() -> Result<Self, ConfigError> {
        let args = match OptionalConfig::get_args() {
            Ok(args) => args,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => return Err(e.into()),
        };

        args.merge(OptionalConfig::get_toml()?).try_into()
    }
}
