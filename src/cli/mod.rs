//! `oli`, the OpenDAL command line

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use opendal_common::Scheme;
use opendal_core::Operator;
use opendal_core::layers::{LoggingLayer, RetryLayer};
use tracing::debug;

use crate::config::Profiles;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "oli", version, about = "OpenDAL command line interface")]
pub struct Cli {
    /// Config file holding the profiles
    #[arg(short, long, env = "OLI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a file to stdout
    Cat { target: String },
    /// Show metadata of a file or directory
    Stat { target: String },
    /// List a directory
    Ls {
        /// Walk into sub directories
        #[arg(short, long)]
        recursive: bool,
        target: String,
    },
    /// Remove a file or an empty directory
    Rm { target: String },
    /// Copy a file, `dst` ending with `/` keeps the source name
    Cp { src: String, dst: String },
    /// Create a directory
    Mkdir { target: String },
}

/// A parsed `profile:/path` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub profile: Option<String>,
    pub path: String,
}

impl Target {
    /// `cache:/a/b` addresses `/a/b` in profile `cache`, anything else is a
    /// local path.
    pub fn parse(s: &str) -> Self {
        if let Some((profile, path)) = s.split_once(':') {
            let valid = !profile.is_empty()
                && profile
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if valid {
                return Target {
                    profile: Some(profile.to_string()),
                    path: path.to_string(),
                };
            }
        }

        Target {
            profile: None,
            path: s.to_string(),
        }
    }

    /// Build the operator behind this target and the path inside it.
    pub fn resolve(&self, profiles: &Profiles) -> Result<(Operator, String)> {
        let (builder, path) = match &self.profile {
            Some(name) => {
                let profile = profiles.get(name)?;
                debug!(profile = %name, scheme = %profile.scheme, "using profile");
                (
                    opendal_services::build(profile.scheme, profile.options)?,
                    self.path.clone(),
                )
            }
            None => {
                let root = if self.path.starts_with('/') {
                    "/".to_string()
                } else {
                    std::env::current_dir()
                        .context("get current dir")?
                        .to_string_lossy()
                        .into_owned()
                };
                let map = HashMap::from([("root".to_string(), root)]);
                (opendal_services::build(Scheme::Fs, map)?, self.path.clone())
            }
        };

        let op = builder
            .layer(RetryLayer::new().with_max_times(3))
            .layer(LoggingLayer)
            .finish();
        Ok((op, path))
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(Profiles::default_path);
    let profiles = Profiles::load(&path)?;

    match cli.command {
        Command::Cat { target } => commands::cat(&profiles, &target).await,
        Command::Stat { target } => commands::stat(&profiles, &target).await,
        Command::Ls { recursive, target } => commands::ls(&profiles, &target, recursive).await,
        Command::Rm { target } => commands::rm(&profiles, &target).await,
        Command::Cp { src, dst } => commands::cp(&profiles, &src, &dst).await,
        Command::Mkdir { target } => commands::mkdir(&profiles, &target).await,
    }
}
