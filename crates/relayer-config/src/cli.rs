// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command line surface of the `gov-relayer` binary.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use directories_next::ProjectDirs;
use gov_relayer_store::SledStore;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use crate::GovRelayerConfig;

/// Qualifier, organization and application used for the platform directories.
pub const PACKAGE_ID: [&str; 3] = ["tools", "webb", "gov-relayer"];

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored output for a terminal.
    Pretty,
    /// One JSON object per event, for log shippers and test harnesses.
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("unknown log format `{other}`")),
        }
    }
}

/// Relays signed governance votes and delegations, and serves the proposal cache.
///
/// $ gov-relayer -vv -c config/local
#[derive(Debug, StructOpt)]
#[structopt(name = "gov-relayer")]
pub struct Opts {
    /// Raise the log level, once per occurrence (-v warn .. -vvvv trace).
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: i32,
    /// Directory holding the toml/json configuration files.
    #[structopt(
        short = "c",
        long = "config-dir",
        value_name = "PATH",
        parse(from_os_str)
    )]
    pub config_dir: Option<PathBuf>,
    /// Where the action log and proposal cache are kept.
    #[structopt(long = "store-dir", value_name = "PATH", parse(from_os_str))]
    pub store_dir: Option<PathBuf>,
    /// Keep the store in a temporary location, dropped on exit.
    #[structopt(long, conflicts_with = "store-dir")]
    pub tmp: bool,
    /// `pretty` or `json`.
    #[structopt(long = "log-format", default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Where the binary reads its configuration and keeps its store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayerDirs {
    /// Directory the configuration files are read from.
    pub config: PathBuf,
    /// Directory of the sled database.
    pub store: PathBuf,
}

impl RelayerDirs {
    /// Explicit flags win. A given config dir puts the store beside it,
    /// otherwise the platform dirs are used.
    pub fn resolve(opts: &Opts) -> anyhow::Result<Self> {
        let platform = || {
            ProjectDirs::from(PACKAGE_ID[0], PACKAGE_ID[1], PACKAGE_ID[2])
                .context("no home directory to derive the relayer dirs from")
        };
        let config = match &opts.config_dir {
            Some(dir) => dir.clone(),
            None => platform()?.config_dir().to_path_buf(),
        };
        let store = match (&opts.store_dir, &opts.config_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(config_dir)) => sibling_store_dir(config_dir),
            (None, None) => platform()?.data_local_dir().join("store"),
        };
        Ok(Self { config, store })
    }
}

// `config/local` keeps its data in `config/store`.
fn sibling_store_dir(config_dir: &Path) -> PathBuf {
    match config_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("store"),
        _ => config_dir.join("store"),
    }
}

/// Loads and verifies the configuration found in `dir`.
pub fn load_config(dir: &Path) -> anyhow::Result<GovRelayerConfig> {
    anyhow::ensure!(dir.is_dir(), "{} is not a directory", dir.display());
    tracing::trace!(dir = %dir.display(), "Loading config");
    let config = crate::utils::load(dir)?;
    Ok(config)
}

/// The filter applied on top of `RUST_LOG`: `verbosity` sets the level for
/// `crate_prefix` and the structured event target.
pub fn log_filter(verbosity: i32, crate_prefix: &str) -> anyhow::Result<EnvFilter> {
    let level = match verbosity {
        i32::MIN..=0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let mut filter = EnvFilter::from_default_env();
    for target in [crate_prefix, gov_relayer_utils::probe::TARGET] {
        let directive = format!("{target}={level}")
            .parse::<tracing_subscriber::filter::Directive>()
            .with_context(|| format!("invalid log target `{target}`"))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Installs the global subscriber.
pub fn setup_logger(
    verbosity: i32,
    crate_prefix: &str,
    format: LogFormat,
) -> anyhow::Result<()> {
    let filter = log_filter(verbosity, crate_prefix)?;
    let builder = tracing_subscriber::fmt().with_target(true).with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("logger already installed: {e}"))
}

/// Opens the sled store, or a temporary one with `--tmp`.
pub fn create_store(opts: &Opts, dirs: &RelayerDirs) -> anyhow::Result<SledStore> {
    if opts.tmp {
        tracing::debug!("Using a temporary store");
        return Ok(SledStore::temporary()?);
    }
    tracing::debug!(path = %dirs.store.display(), "Opening store");
    let store = SledStore::open(&dirs.store)
        .with_context(|| format!("failed to open {}", dirs.store.display()))?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(args: &[&str]) -> Opts {
        Opts::from_iter_safe(std::iter::once("gov-relayer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn store_sits_beside_the_config_dir() {
        let dirs = RelayerDirs::resolve(&opts(&["-c", "config/local"])).unwrap();
        assert_eq!(dirs.config, PathBuf::from("config/local"));
        assert_eq!(dirs.store, PathBuf::from("config/store"));

        let bare = RelayerDirs::resolve(&opts(&["-c", "local"])).unwrap();
        assert_eq!(bare.store, PathBuf::from("local/store"));
    }

    #[test]
    fn explicit_store_dir_wins() {
        let dirs = RelayerDirs::resolve(&opts(&[
            "-c",
            "config/local",
            "--store-dir",
            "/var/lib/gov-relayer",
        ]))
        .unwrap();
        assert_eq!(dirs.store, PathBuf::from("/var/lib/gov-relayer"));
    }

    #[test]
    fn tmp_and_store_dir_are_exclusive() {
        let parsed = Opts::from_iter_safe([
            "gov-relayer",
            "--tmp",
            "--store-dir",
            "/tmp/x",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn flags_parse() {
        let parsed = opts(&["-vvv", "--log-format", "json", "--tmp"]);
        assert_eq!(parsed.verbose, 3);
        assert_eq!(parsed.log_format, LogFormat::Json);
        assert!(parsed.tmp);
        assert_eq!(opts(&[]).log_format, LogFormat::Pretty);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn verbosity_sets_the_crate_and_event_target_levels() {
        let filter = log_filter(2, "gov_relayer").unwrap().to_string().to_lowercase();
        assert!(filter.contains("gov_relayer=info"));
        assert!(filter.contains(&format!("{}=info", gov_relayer_utils::probe::TARGET)));
        let loud = log_filter(9, "gov_relayer").unwrap().to_string().to_lowercase();
        assert!(loud.contains("gov_relayer=trace"));
    }

    #[test]
    fn missing_config_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(&tmp.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn store_opens_at_the_resolved_dir() {
        use gov_relayer_store::ProposalCacheStore;

        let tmp = tempfile::tempdir().unwrap();
        let dirs = RelayerDirs {
            config: tmp.path().join("local"),
            store: tmp.path().join("store"),
        };
        let store = create_store(&opts(&[]), &dirs).unwrap();
        assert_eq!(store.cached_proposals_count().unwrap(), 0);
        assert!(dirs.store.exists());
        drop(store);

        let unused = RelayerDirs {
            store: tmp.path().join("never"),
            ..dirs
        };
        create_store(&opts(&["--tmp"]), &unused).unwrap();
        assert!(!unused.store.exists());
    }
}
