use std::io;

use log::debug;

use crate::{
    config::SectionDetails,
    error::Result,
    fmt::{FormatWriter, Release},
    git::Commit,
    link_style::Links,
    sectionmap::{ComponentMap, SectionMap},
};

/// Wraps a `std::io::Write` object to write `ez-changelog` output in a
/// Markdown format
///
/// # Example
///
/// ```no_run
/// # use std::fs::File;
/// # use ez_changelog::{SectionMap, config::Config, fmt::{FormatWriter, MarkdownWriter, Release}};
/// let cfg = Config::discover(".").unwrap();
/// let sm = SectionMap::from_commits(&[], &cfg.sections, &cfg.links, None);
/// let release = Release {
///     version: "v1.0.0",
///     date: "2016-10-08",
///     sections: &cfg.sections,
///     links: &cfg.links,
/// };
///
/// // Create a file to hold our results, which the MarkdownWriter will wrap
/// let mut file = File::create("my_changelog.md").unwrap();
/// let mut writer = MarkdownWriter::new(&mut file);
///
/// writer.write_changelog(&release, &sm).unwrap();
/// ```
pub struct MarkdownWriter<'a>(&'a mut dyn io::Write);

impl<'a> MarkdownWriter<'a> {
    /// Creates a new instance of the `MarkdownWriter` struct using a
    /// `std::io::Write` object.
    pub fn new<T: io::Write + 'a>(writer: &'a mut T) -> MarkdownWriter<'a> {
        MarkdownWriter(writer)
    }

    fn write_header(&mut self, release: &Release) -> Result<()> {
        let version = release.version;
        write!(
            self.0,
            "<a name=\"{version}\"></a>\n# {version} ({})\n\n",
            release.date
        )
        .map_err(Into::into)
    }

    /// Writes a particular section of a changelog
    fn write_section(
        &mut self,
        links: &Links,
        details: &SectionDetails,
        section: &ComponentMap,
    ) -> Result<()> {
        if SectionMap::is_empty_section(section) {
            return Ok(());
        }

        write!(self.0, "\n## {}\n\n", details.title)?;

        for (component, entries) in section.iter().filter(|(_, e)| !e.is_empty()) {
            let prefix = match component {
                Some(name) if entries.len() > 1 => {
                    writeln!(self.0, "- **{name}:**")?;
                    "  -".to_owned()
                }
                Some(name) => format!("- **{name}:**"),
                None => "-".to_owned(),
            };

            self.write_commits(links, entries, &prefix, details.print_links)?;
        }

        writeln!(self.0).map_err(Into::into)
    }

    fn write_commits(
        &mut self,
        links: &Links,
        commits: &[Commit],
        prefix: &str,
        print_links: bool,
    ) -> Result<()> {
        for commit in commits {
            if !print_links {
                writeln!(self.0, "{prefix} {}", commit.subject)?;
                continue;
            }

            write!(
                self.0,
                "{prefix} {}\n  ({}",
                commit.subject,
                links.commit(&commit.hash)
            )?;
            if !commit.closes.is_empty() {
                let closes = commit
                    .closes
                    .iter()
                    .map(|&issue| links.issue(issue))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(self.0, ",\n   {closes}")?;
            }
            writeln!(self.0, ")")?;
        }

        Ok(())
    }
}

impl<'a> FormatWriter for MarkdownWriter<'a> {
    fn write_changelog(&mut self, release: &Release, sm: &SectionMap) -> Result<()> {
        self.write_header(release)?;

        if sm.nothing_to_log {
            debug!("No commits to log for {}", release.version);
            write!(self.0, "### Nothing important to note\n\n")?;
            return self.0.flush().map_err(Into::into);
        }

        // Keep the order the sections were configured in
        let s_it = release
            .sections
            .iter()
            .filter_map(|(sec, details)| sm.get(sec).map(|secmap| (details, secmap)));
        for (details, secmap) in s_it {
            self.write_section(release.links, details, secmap)?;
        }

        self.0.flush().map_err(Into::into)
    }
}
