use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    link_style::{LinkStyle, Links},
    DEFAULT_CONFIG_FILE,
};

/// The section type which collects breaking change notes
pub const BREAKING_SECTION: &str = "breaks";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCfg {
    pub project: RawProjectCfg,
    pub changelog: RawChangelogCfg,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProjectCfg {
    pub name: Option<String>,
    pub repository: Option<String>,
    pub bugs: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RawChangelogCfg {
    pub override_defaults: bool,
    pub link_style: Option<LinkStyle>,
    pub changelog: Option<PathBuf>,
    pub buildlog: Option<PathBuf>,
    pub sections: Vec<RawSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawSection {
    #[serde(rename = "type")]
    pub commit_type: String,
    pub title: Option<String>,
    pub print_links: Option<bool>,
}

/// How a single section of the changelog is printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDetails {
    pub title: String,
    /// Whether entries get a commit link and closed issue links
    pub print_links: bool,
}

/// Maps commit types to the sections they are listed under, in the order the
/// sections are printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionConfig {
    sections: IndexMap<String, SectionDetails>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        let mut sections = SectionConfig::empty();
        sections.insert(BREAKING_SECTION, "Breaking Changes", false);
        sections.insert("feat", "Features", true);
        sections.insert("fix", "Bug Fixes", true);
        sections.insert("perf", "Performance Improvements", true);
        sections
    }
}

impl SectionConfig {
    pub fn empty() -> Self {
        SectionConfig {
            sections: IndexMap::new(),
        }
    }

    /// Builds the sections from custom definitions. They replace the defaults
    /// when `override_defaults` is set and at least one is given, otherwise
    /// they're added after them.
    pub fn with_custom(custom: &[RawSection], override_defaults: bool) -> Self {
        let mut sections = if override_defaults && !custom.is_empty() {
            SectionConfig::empty()
        } else {
            SectionConfig::default()
        };
        for sec in custom {
            sections.insert(
                sec.commit_type.as_str(),
                sec.title.as_deref().unwrap_or(sec.commit_type.as_str()),
                sec.print_links.unwrap_or(true),
            );
        }
        sections
    }

    /// Adds a section. Re-declaring a type updates it without moving it.
    pub fn insert<S: Into<String>>(&mut self, commit_type: S, title: S, print_links: bool) {
        self.sections.insert(
            commit_type.into(),
            SectionDetails {
                title: title.into(),
                print_links,
            },
        );
    }

    pub fn get(&self, commit_type: &str) -> Option<&SectionDetails> {
        self.sections.get(commit_type)
    }

    pub fn contains(&self, commit_type: &str) -> bool {
        self.sections.contains_key(commit_type)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionDetails)> {
        self.sections.iter().map(|(t, d)| (t.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Everything read from the project's `.ez-changelog.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// The project name, used to label incremental builds
    pub name: Option<String>,
    pub links: Links,
    pub sections: SectionConfig,
    /// The directory holding the config file
    pub root: Option<PathBuf>,
    /// The changelog to write to in normal mode
    pub changelog: Option<PathBuf>,
    /// The build log to write to in incremental mode
    pub buildlog: Option<PathBuf>,
}

impl Config {
    /// Resolves raw configuration values, warning once about each missing
    /// link base.
    pub fn from_raw(raw: RawCfg) -> Config {
        let repository = raw.project.repository.unwrap_or_default();
        if repository.is_empty() {
            warn!("no repository specified in {DEFAULT_CONFIG_FILE}");
        }
        let bugs = raw.project.bugs.unwrap_or_default();
        if bugs.is_empty() {
            warn!("no bugs url specified in {DEFAULT_CONFIG_FILE}");
        }

        Config {
            name: raw.project.name.filter(|n| !n.is_empty()),
            links: Links::from_repository(&repository, &bugs, raw.changelog.link_style),
            sections: SectionConfig::with_custom(
                &raw.changelog.sections,
                raw.changelog.override_defaults,
            ),
            root: None,
            changelog: raw.changelog.changelog,
            buildlog: raw.changelog.buildlog,
        }
    }

    /// Parses the contents of a config file, `path` is only used for errors
    pub fn parse<P: AsRef<Path>>(contents: &str, path: P) -> Result<Config> {
        let raw: RawCfg = toml::from_str(contents)
            .map_err(|e| Error::ConfigParse(path.as_ref().to_path_buf(), e))?;
        Ok(Config::from_raw(raw))
    }

    /// Reads a specific config file. Relative output files in it are
    /// resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Config> {
        debug!("Reading config from {:?}", file.as_ref());
        let contents = fs::read_to_string(file.as_ref())?;
        let mut cfg = Config::parse(&contents, file.as_ref())?;
        cfg.root = file.as_ref().parent().map(Path::to_path_buf);
        Ok(cfg)
    }

    /// Looks for `.ez-changelog.toml` in `dir` and each of its ancestors,
    /// falling back to the defaults when none exists.
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Config> {
        match dir
            .as_ref()
            .ancestors()
            .map(|d| d.join(DEFAULT_CONFIG_FILE))
            .find(|f| f.is_file())
        {
            Some(file) => Config::from_file(file),
            None => {
                warn!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                Ok(Config::from_raw(RawCfg::default()))
            }
        }
    }

    /// The configured output file for the given mode, if any
    pub fn outfile(&self, incremental: bool) -> Option<PathBuf> {
        let file = if incremental {
            self.buildlog.as_ref()
        } else {
            self.changelog.as_ref()
        }?;
        Some(match self.root {
            Some(ref root) if file.is_relative() => root.join(file),
            _ => file.clone(),
        })
    }
}
