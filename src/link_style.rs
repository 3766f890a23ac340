use std::{result::Result as StdResult, str::FromStr};

use strum::{Display, EnumString};

use crate::error::Error;

/// Determines the hyperlink style used in commit links, i.e. whether a
/// single commit lives under `/commit/<hash>` or `/commits/<hash>`.
///
/// # Example
///
/// ```
/// # use ez_changelog::LinkStyle;
/// assert_eq!(LinkStyle::detect("https://github.com/o/r"), LinkStyle::Github);
/// assert_eq!(LinkStyle::detect("https://stash.acme.io/projects/P/repos/r"), LinkStyle::Stash);
/// assert_eq!("bitbucket".parse::<LinkStyle>(), Ok(LinkStyle::Bitbucket));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum LinkStyle {
    Github,
    Gitlab,
    Bitbucket,
    #[default]
    Stash,
}

impl<'de> serde::de::Deserialize<'de> for LinkStyle {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(|_| serde::de::Error::custom(Error::LinkStyle(s.clone())))
    }
}

impl LinkStyle {
    /// Guesses the style from the host in a repository url. Unknown hosts are
    /// treated like Stash.
    pub fn detect(repo: &str) -> LinkStyle {
        if repo.contains("github.com") {
            LinkStyle::Github
        } else if repo.contains("gitlab.com") {
            LinkStyle::Gitlab
        } else if repo.contains("bitbucket.") {
            LinkStyle::Bitbucket
        } else {
            LinkStyle::Stash
        }
    }

    /// The path segment under which a single commit is shown
    pub fn commit_path(&self) -> &'static str {
        match *self {
            LinkStyle::Github | LinkStyle::Gitlab => "commit",
            LinkStyle::Bitbucket | LinkStyle::Stash => "commits",
        }
    }

    /// Turns a repository url into the base of every commit link. Anything
    /// from the first `/browse` on is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// # use ez_changelog::LinkStyle;
    /// let base = LinkStyle::Stash.commit_base("https://stash.acme.io/projects/P/repos/r/browse");
    /// assert_eq!("https://stash.acme.io/projects/P/repos/r/commits", base);
    /// ```
    pub fn commit_base(&self, repo: &str) -> String {
        let repo = repo.find("/browse").map_or(repo, |idx| &repo[..idx]);
        format!("{repo}/{}", self.commit_path())
    }
}

/// The link bases used when rendering a changelog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    /// Prefix of every commit link, i.e. `https://github.com/o/r/commit`
    pub commit_url: String,
    /// Prefix of every issue link, i.e. `https://github.com/o/r/issues`
    pub issue_url: String,
}

impl Links {
    pub fn new<S: Into<String>>(commit_url: S, issue_url: S) -> Links {
        Links {
            commit_url: commit_url.into(),
            issue_url: issue_url.into(),
        }
    }

    /// Builds the links from a repository url and an issue tracker url. The
    /// style is detected from the repository url unless one is given.
    pub fn from_repository(repo: &str, issues: &str, style: Option<LinkStyle>) -> Links {
        let commit_url = if repo.is_empty() {
            String::new()
        } else {
            style
                .unwrap_or_else(|| LinkStyle::detect(repo))
                .commit_base(repo)
        };
        Links::new(commit_url, issues.to_owned())
    }

    pub fn commit(&self, hash: &str) -> String {
        commit_link(&self.commit_url, hash)
    }

    pub fn issue(&self, issue: u64) -> String {
        issue_link(&self.issue_url, issue)
    }
}

/// Gets a Markdown link to a commit, showing the first 8 characters of the
/// hash. Without a hash the link is empty; without a base it's plain text.
///
/// # Example
///
/// ```
/// # use ez_changelog::link_style::commit_link;
/// let link = commit_link("some/repo/url/commit", "992faac888d81a8f18c8646be2a2b07eb36feed7");
///
/// assert_eq!(
///     "[992faac8](some/repo/url/commit/992faac888d81a8f18c8646be2a2b07eb36feed7)",
///     link
/// );
/// ```
pub fn commit_link(base: &str, hash: &str) -> String {
    if hash.is_empty() {
        return String::new();
    }
    let short = hash.char_indices().nth(8).map_or(hash, |(idx, _)| &hash[..idx]);
    match base {
        "" => short.to_owned(),
        base => format!("[{short}]({base}/{hash})"),
    }
}

/// Gets a Markdown link to an issue.
///
/// # Example
///
/// ```
/// # use ez_changelog::link_style::issue_link;
/// assert_eq!("[#333](some/repo/url/issues/333)", issue_link("some/repo/url/issues", 333));
/// ```
pub fn issue_link(base: &str, issue: u64) -> String {
    match base {
        "" => format!("#{issue}"),
        base => format!("[#{issue}]({base}/{issue})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_link_without_hash() {
        assert_eq!("", commit_link("some/repo/url/commit", ""));
    }

    #[test]
    fn commit_link_to_commit() {
        assert_eq!(
            "[992faac8](some/repo/url/commit/992faac888d81a8f18c8646be2a2b07eb36feed7)",
            commit_link(
                "some/repo/url/commit",
                "992faac888d81a8f18c8646be2a2b07eb36feed7"
            )
        );
    }

    #[test]
    fn commit_link_short_hash() {
        assert_eq!("[abc](base/abc)", commit_link("base", "abc"));
    }

    #[test]
    fn commit_link_without_base() {
        assert_eq!(
            "992faac8",
            commit_link("", "992faac888d81a8f18c8646be2a2b07eb36feed7")
        );
    }

    #[test]
    fn issue_link_to_issue() {
        assert_eq!(
            "[#333](some/repo/url/issues/333)",
            issue_link("some/repo/url/issues", 333)
        );
        assert_eq!("#333", issue_link("", 333));
    }

    #[test]
    fn repository_without_browse() {
        let links = Links::from_repository("some.url/browse", "", None);
        assert_eq!("some.url/commits", links.commit_url);
    }

    #[test]
    fn github_repository() {
        let links = Links::from_repository("github.com/some-repo", "github.com/some-repo/issues", None);
        assert_eq!("github.com/some-repo/commit", links.commit_url);
        assert_eq!("github.com/some-repo/issues", links.issue_url);
    }

    #[test]
    fn bitbucket_repository() {
        let links = Links::from_repository("bitbucket.com/some-repo", "", None);
        assert_eq!("bitbucket.com/some-repo/commits", links.commit_url);
    }

    #[test]
    fn forced_style_wins() {
        let links = Links::from_repository(
            "https://git.acme.io/o/r",
            "",
            Some(LinkStyle::Github),
        );
        assert_eq!("https://git.acme.io/o/r/commit", links.commit_url);
    }

    #[test]
    fn missing_repository() {
        assert_eq!(Links::default(), Links::from_repository("", "", None));
    }

    #[test]
    fn link_style_from_str() {
        assert_eq!(Ok(LinkStyle::Gitlab), "GitLab".parse::<LinkStyle>());
        assert!("sourceforge".parse::<LinkStyle>().is_err());
    }
}
