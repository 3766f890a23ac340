//! ez-changelog - prepend a release to the project changelog

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use ez_changelog::{changelog::DEFAULT_BUILD_NUMBER, Changelog};

/// Generate a Markdown changelog or build log from conventional git commits
#[derive(Debug, Parser)]
#[command(name = "ez-changelog", version, about)]
struct Cli {
    /// Write a build log of the commits since the last logged build
    #[arg(short, long)]
    incremental: bool,

    /// Changelog file to prepend to
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Version label for the release (defaults to the previous tag)
    #[arg(short = 'v', long = "label", value_name = "LABEL")]
    label: Option<String>,

    /// Build number used in incremental labels
    #[arg(short, long, env = "BUILD_NUMBER", default_value = DEFAULT_BUILD_NUMBER)]
    build: String,

    /// Config file to use instead of searching for .ez-changelog.toml
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Project directory to run in
    #[arg(short = 'C', long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Print the new release instead of writing the file
    #[arg(long)]
    stdout: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let changelog = cli.changelog()?;

    if cli.stdout {
        changelog.print_changelog()?;
    } else {
        changelog
            .write_changelog()
            .with_context(|| format!("failed to write {}", changelog.get_outfile().display()))?;
    }

    Ok(())
}

impl Cli {
    fn changelog(&self) -> anyhow::Result<Changelog> {
        let mut changelog = match (&self.config, &self.directory) {
            (Some(cfg), _) => Changelog::from_file(cfg)
                .with_context(|| format!("failed to load {}", cfg.display()))?,
            (None, Some(dir)) => Changelog::with_dir(dir)?,
            (None, None) => Changelog::new()?,
        };

        if let Some(ref dir) = self.directory {
            changelog = changelog.work_tree(dir);
        }
        if let Some(ref label) = self.label {
            changelog = changelog.version(label);
        }
        if let Some(ref outfile) = self.outfile {
            changelog = changelog.outfile(outfile);
        }

        Ok(changelog
            .incremental(self.incremental)
            .build_number(&self.build))
    }
}

/// Console logging on stderr, controlled by RUST_LOG (default: info)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}
