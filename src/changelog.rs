use std::{
    env,
    fs::{self, File},
    io::{self, stdout, BufWriter, ErrorKind, Write},
    iter,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use log::{debug, info, warn};

use crate::{
    config::{Config, BREAKING_SECTION},
    date,
    error::{Error, Result},
    fmt::{FormatWriter, MarkdownWriter, Release},
    git::{CommitParser, Commits, COMMIT_FORMAT},
    sectionmap::SectionMap,
};

/// The file written to when nothing else is configured
pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";
/// The file written to in incremental mode when nothing else is configured
pub const DEFAULT_BUILDLOG: &str = "BUILDLOG.md";
/// The build number used in incremental labels unless one is given
pub const DEFAULT_BUILD_NUMBER: &str = "SNAPSHOT";

// What `git describe` says when there is no tag to describe from
const NO_TAG_MESSAGES: [&str; 3] = ["No names found", "No tags can describe", "cannot describe"];

/// The base struct used to set options and interact with the library.
#[derive(Debug, Clone)]
pub struct Changelog {
    /// Sections, links and output files read from `.ez-changelog.toml`
    pub config: Config,
    /// Build log mode: only commits after the last logged build are listed
    /// and the heading carries the time of day
    pub incremental: bool,
    /// The version label for the release (Defaults to the previous tag, or
    /// the short hash of HEAD when there is none)
    pub version: Option<String>,
    /// The build number used in incremental labels
    pub build: String,
    /// The file to prepend the new release to
    pub outfile: Option<PathBuf>,
    /// The directory `git` runs in (Defaults to the current directory)
    pub work_tree: Option<PathBuf>,
    parser: CommitParser,
}

impl Changelog {
    /// Creates a `Changelog` for the current working directory, searching it
    /// and its parents for `.ez-changelog.toml`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        debug!("Creating changelog for the current directory");
        Changelog::with_dir(env::current_dir()?)
    }

    /// Creates a `Changelog` for a project directory, searching it and its
    /// parents for `.ez-changelog.toml`. Git runs in `dir`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::with_dir("/myproject").unwrap();
    /// ```
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        debug!("Creating changelog with dir: {:?}", dir.as_ref());
        let cfg = Config::discover(dir.as_ref())?;
        Ok(Changelog::with_config(cfg)?.work_tree(dir))
    }

    /// Creates a `Changelog` from a specific config file. Git runs in the
    /// directory holding the file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::from_file("/myproject/changelog.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        debug!("Creating changelog with file: {:?}", file.as_ref());
        let cfg = Config::from_file(file)?;
        let root = cfg.root.clone();
        let changelog = Changelog::with_config(cfg)?;
        Ok(match root {
            Some(root) => changelog.work_tree(root),
            None => changelog,
        })
    }

    /// Creates a `Changelog` from an already loaded configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Changelog {
            config,
            incremental: false,
            version: None,
            build: DEFAULT_BUILD_NUMBER.to_owned(),
            outfile: None,
            work_tree: None,
            parser: CommitParser::new(true)?,
        })
    }

    /// Sets incremental (build log) mode
    pub fn incremental(mut self, i: bool) -> Changelog {
        self.incremental = i;
        self
    }

    /// Sets the version label for the release
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::new().unwrap().version("v0.2.1-beta3");
    /// ```
    pub fn version<S: Into<String>>(mut self, v: S) -> Changelog {
        self.version = Some(v.into());
        self
    }

    /// Sets the build number used in incremental labels
    pub fn build_number<S: Into<String>>(mut self, b: S) -> Changelog {
        self.build = b.into();
        self
    }

    /// Sets the changelog file to prepend to
    ///
    /// **NOTE:** Anything set here will override anything in a configuration
    /// TOML file
    pub fn outfile<P: AsRef<Path>>(mut self, o: P) -> Changelog {
        self.outfile = Some(o.as_ref().to_path_buf());
        self
    }

    /// Sets the directory `git` runs in
    pub fn work_tree<P: AsRef<Path>>(mut self, d: P) -> Changelog {
        self.work_tree = Some(d.as_ref().to_path_buf());
        self
    }

    /// The file the release will be prepended to: the one set explicitly,
    /// else the configured one, else `CHANGELOG.md` (`BUILDLOG.md` in
    /// incremental mode) in the work tree.
    pub fn get_outfile(&self) -> PathBuf {
        if let Some(ref o) = self.outfile {
            return o.clone();
        }
        if let Some(o) = self.config.outfile(self.incremental) {
            return o;
        }
        let name = if self.incremental {
            DEFAULT_BUILDLOG
        } else {
            DEFAULT_CHANGELOG
        };
        match self.work_tree {
            Some(ref wt) => wt.join(name),
            None => PathBuf::from(name),
        }
    }

    /// The `git log --grep` pattern matching every configured type, plus
    /// breaking changes
    ///
    /// # Example
    ///
    /// ```
    /// # use ez_changelog::{Changelog, config::Config};
    /// let changelog = Changelog::with_config(Config::default()).unwrap();
    /// assert_eq!("^feat|^fix|^perf|BREAKING", changelog.grep_pattern());
    /// ```
    pub fn grep_pattern(&self) -> String {
        self.config
            .sections
            .types()
            .filter(|&t| t != BREAKING_SECTION)
            .map(|t| format!("^{}", regex::escape(t)))
            .chain(iter::once("BREAKING".to_owned()))
            .collect::<Vec<_>>()
            .join("|")
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        debug!("Running: git {}", args.join(" "));
        let mut cmd = Command::new("git");
        if let Some(ref wt) = self.work_tree {
            cmd.current_dir(wt);
        }
        Ok(cmd.args(args).output()?)
    }

    fn git_stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args)?;
        if !output.status.success() {
            return Err(Error::Git {
                cmd: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Retrieves the most recent tag, or `None` when the repository has no
    /// tags yet
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::new().unwrap();
    /// let tag = changelog.previous_tag().unwrap();
    /// ```
    pub fn previous_tag(&self) -> Result<Option<String>> {
        let args = ["describe", "--tags", "--abbrev=0"];
        let output = self.git(&args)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            let tag = String::from_utf8_lossy(&output.stdout).trim().to_owned();
            Ok(Some(tag).filter(|t| !t.is_empty()))
        } else if NO_TAG_MESSAGES.iter().any(|m| stderr.contains(m)) {
            warn!("no previous tag found");
            Ok(None)
        } else {
            Err(Error::Git {
                cmd: args.join(" "),
                stderr: stderr.trim().to_owned(),
            })
        }
    }

    /// Retrieves the hash of the most recent commit (i.e. HEAD)
    pub fn last_commit(&self) -> Result<String> {
        Ok(self.git_stdout(&["rev-parse", "HEAD"])?.trim().to_owned())
    }

    /// Retrieves the commits we care about since `from` (a tag or hash), or
    /// the whole history when `from` is `None`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::new().unwrap();
    /// let commits = changelog.get_commits(Some("v1.0.0")).unwrap();
    /// ```
    pub fn get_commits(&self, from: Option<&str>) -> Result<Commits> {
        let range = match from {
            Some(from) => format!("{from}..HEAD"),
            None => "HEAD".to_owned(),
        };

        let output = self.git_stdout(&[
            "log",
            "-E",
            &format!("--grep={}", self.grep_pattern()),
            "--date=local",
            &format!("--format={COMMIT_FORMAT}"),
            &range,
        ])?;

        let commits = self.parser.parse_log(&output);
        info!("Parsed {} commits", commits.len());
        Ok(commits)
    }

    /// The label shown in the release heading: the version set explicitly,
    /// else the tag (or short HEAD hash), prefixed with the project name and
    /// suffixed with the build number in incremental mode.
    pub fn version_label(&self, tag: Option<&str>) -> Result<String> {
        if let Some(ref v) = self.version {
            return Ok(v.clone());
        }
        let tag = match tag {
            Some(tag) => tag.to_owned(),
            None => self.last_commit()?.chars().take(8).collect(),
        };
        Ok(version_label(
            self.incremental,
            &tag,
            &self.build,
            self.config.name.as_deref(),
        ))
    }

    /// Writes the changelog using whatever options have been specified thus
    /// far, prepending the new release to the output file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use ez_changelog::Changelog;
    /// let changelog = Changelog::new().unwrap();
    /// changelog.write_changelog().unwrap();
    /// ```
    pub fn write_changelog(&self) -> Result<()> {
        let outfile = self.get_outfile();
        let previous = previous_changelog(&outfile)?;

        let mut new = Vec::with_capacity(256);
        self.write_changelog_with(&mut MarkdownWriter::new(&mut new), &previous)?;

        info!("Generating changelog to {}", outfile.display());
        write_document(&outfile, &String::from_utf8_lossy(&new), &previous)
    }

    /// Writes only the new release to `stdout`
    pub fn print_changelog(&self) -> Result<()> {
        let previous = previous_changelog(self.get_outfile())?;
        let out = stdout();
        let mut out_buf = BufWriter::new(out.lock());
        let mut writer = MarkdownWriter::new(&mut out_buf);
        self.write_changelog_with(&mut writer, &previous)
    }

    /// Writes a release with a specified `FormatWriter` format. `previous`
    /// is the existing log, which supplies the last build date in
    /// incremental mode.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use ez_changelog::{Changelog, fmt::MarkdownWriter};
    /// # use std::io;
    /// let changelog = Changelog::new().unwrap();
    ///
    /// let out = io::stdout();
    /// let mut out_buf = io::BufWriter::new(out.lock());
    /// let mut writer = MarkdownWriter::new(&mut out_buf);
    ///
    /// changelog.write_changelog_with(&mut writer, "").unwrap();
    /// ```
    pub fn write_changelog_with<W>(&self, writer: &mut W, previous: &str) -> Result<()>
    where
        W: FormatWriter,
    {
        let tag = self.previous_tag()?;
        info!(
            "Reading git log since {}",
            tag.as_deref().unwrap_or("the first commit")
        );
        let commits = self.get_commits(tag.as_deref())?;

        let cutoff = if self.incremental {
            let cutoff = date::last_build_date(previous);
            debug!("Last build: {cutoff:?}");
            cutoff
        } else {
            None
        };
        let sm = SectionMap::from_commits(
            &commits,
            &self.config.sections,
            &self.config.links,
            cutoff,
        );

        let version = self.version_label(tag.as_deref())?;
        let date = date::release_date(date::now(), self.incremental)?;
        let release = Release {
            version: &version,
            date: &date,
            sections: &self.config.sections,
            links: &self.config.links,
        };

        writer.write_changelog(&release, &sm)
    }
}

/// Builds an incremental label, `NAME-TAG.BUILD`. Outside incremental mode,
/// or without a project name, the tag is used as is.
///
/// # Example
///
/// ```
/// # use ez_changelog::changelog::version_label;
/// assert_eq!("ez-changelog-v1.2.0.33", version_label(true, "v1.2.0", "33", Some("ez-changelog")));
/// assert_eq!("v1.2.0", version_label(false, "v1.2.0", "33", Some("ez-changelog")));
/// ```
pub fn version_label(incremental: bool, tag: &str, build: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if incremental => format!("{name}-{tag}.{build}"),
        _ => tag.to_owned(),
    }
}

/// Reads the existing log. A missing file is an empty log.
pub fn previous_changelog<P: AsRef<Path>>(path: P) -> Result<String> {
    match fs::read_to_string(path.as_ref()) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("No previous log found, creating new one");
            Ok(String::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes `new` followed by `previous` to `path`. The content goes to a
/// sibling temporary file first, so `path` is either fully replaced or left
/// alone.
pub fn write_document<P: AsRef<Path>>(path: P, new: &str, previous: &str) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("ez-changelog.tmp");
    debug!("Writing {} via {}", path.display(), tmp.display());

    let res = write_parts(&tmp, &[new, previous]).and_then(|_| fs::rename(&tmp, path));
    if res.is_err() {
        fs::remove_file(&tmp).ok();
    }
    res.map_err(Into::into)
}

fn write_parts(path: &Path, parts: &[&str]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    for part in parts {
        file.write_all(part.as_bytes())?;
    }
    file.into_inner()?.sync_all()
}
