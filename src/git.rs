use log::{debug, warn};
use regex::Regex;
use time::{macros::format_description, PrimitiveDateTime};

use crate::error::Result;

/// Separates commits in the `git log` output produced by `COMMIT_FORMAT`
pub const COMMIT_DELIMITER: &str = "\n==END==\n";

/// The `git log --format` used to read history: date, hash, subject, body
pub const COMMIT_FORMAT: &str = "%cd%n%H%n%s%n%b%n==END==";

/// The struct representation of a `Commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The 40 char hash
    pub hash: String,
    /// The commit date, when the log format carries one
    pub date: Option<PrimitiveDateTime>,
    /// The commit subject, without the `type(component): ` prefix
    pub subject: String,
    /// The commit type, i.e. `feat` or `fix`
    pub commit_type: String,
    /// The component (if any)
    pub component: Option<String>,
    /// Every line after the subject
    pub body: String,
    /// Any issues this commit closes
    pub closes: Vec<u64>,
    /// The text following a `BREAKING CHANGE:` footer
    pub breaking: Option<String>,
}

/// A convienience type for multiple commits
pub type Commits = Vec<Commit>;

/// Turns raw commit blocks into `Commit`s.
///
/// A block is the commit's fields joined by newlines: an optional date line
/// (only when the parser is `dated`), the hash, the subject and then the body.
///
/// # Example
///
/// ```
/// # use ez_changelog::git::CommitParser;
/// let parser = CommitParser::new(false).unwrap();
/// let commit = parser
///     .parse("9b1aff905b638aa274a5fc8f88662df446d374bd\nfix(parser): handle tabs\n")
///     .unwrap();
///
/// assert_eq!(commit.commit_type, "fix");
/// assert_eq!(commit.component.as_deref(), Some("parser"));
/// assert_eq!(commit.subject, "handle tabs");
/// ```
#[derive(Debug, Clone)]
pub struct CommitParser {
    dated: bool,
    /// The regex used to get the type, component and subject
    subject_regex: Regex,
    /// The regex used to get closed issue numbers
    closes_regex: Regex,
    /// The regex used to get breaking change notes
    breaking_regex: Regex,
}

impl CommitParser {
    /// Creates a parser. When `dated` is set every block is expected to start
    /// with a `git log --date=local` timestamp line.
    pub fn new(dated: bool) -> Result<Self> {
        Ok(CommitParser {
            dated,
            subject_regex: Regex::new(r"^(.*)\((.*)\):\s(.*)$")?,
            closes_regex: Regex::new(r"(?:Closes|Fixes)\s#(\d+)")?,
            breaking_regex: Regex::new(r"(?s)BREAKING CHANGE:(.*)")?,
        })
    }

    /// Parses a single raw commit block. Returns `None` for empty input and
    /// for subjects that don't follow `type(component): subject`.
    pub fn parse(&self, raw: &str) -> Option<Commit> {
        if raw.is_empty() {
            return None;
        }

        let mut lines = raw.split('\n');

        let date = if self.dated {
            lines.next().and_then(parse_git_date)
        } else {
            None
        };
        let hash = lines.next().unwrap_or_default().to_owned();
        let raw_subject = lines.next().unwrap_or_default();
        let body_lines = lines.collect::<Vec<_>>();

        let closes = body_lines
            .iter()
            .flat_map(|&line| self.closes_regex.captures_iter(line))
            .filter_map(|caps| caps.get(1))
            .filter_map(|issue| issue.as_str().parse::<u64>().ok())
            .collect();

        let breaking = self
            .breaking_regex
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|text| text.as_str().to_owned());

        let Some(caps) = self.subject_regex.captures(raw_subject) else {
            warn!("Incorrect message: {hash} {raw_subject}");
            return None;
        };
        let commit_type = caps.get(1).map_or("", |m| m.as_str());
        let subject = caps.get(3).map_or("", |m| m.as_str());
        if commit_type.is_empty() || subject.is_empty() {
            warn!("Incorrect message: {hash} {raw_subject}");
            return None;
        }
        let component = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|c| !c.is_empty())
            .map(ToOwned::to_owned);

        Some(Commit {
            hash,
            date,
            subject: subject.to_owned(),
            commit_type: commit_type.to_owned(),
            component,
            body: body_lines.join("\n"),
            closes,
            breaking,
        })
    }

    /// Splits the full output of `git log --format=COMMIT_FORMAT` and keeps
    /// every commit which parses.
    pub fn parse_log(&self, output: &str) -> Commits {
        output
            .split(COMMIT_DELIMITER)
            .filter_map(|raw| self.parse(raw))
            .collect()
    }
}

/// Parses the `--date=local` format, i.e. `Sat Feb 6 12:04:15 2016`
fn parse_git_date(line: &str) -> Option<PrimitiveDateTime> {
    match PrimitiveDateTime::parse(
        line.trim(),
        format_description!(
            "[weekday repr:short] [month repr:short] [day padding:none] [hour]:[minute]:[second] [year]"
        ),
    ) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Unable to parse commit date {line:?}: {e}");
            None
        }
    }
}
