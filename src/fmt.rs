mod md_writer;

pub use self::md_writer::MarkdownWriter;
use crate::{config::SectionConfig, error::Result, link_style::Links, sectionmap::SectionMap};

/// Everything a `FormatWriter` needs to print one release, besides the
/// commits themselves
#[derive(Debug, Clone, Copy)]
pub struct Release<'a> {
    /// The version label, used for both the anchor and the heading
    pub version: &'a str,
    /// The release date as it should appear in the heading
    pub date: &'a str,
    /// Section titles and ordering
    pub sections: &'a SectionConfig,
    pub links: &'a Links,
}

/// A trait that allows writing the results of an `ez-changelog` run in an
/// arbitrary format. The single required function `write_changelog()`
/// accepts a `SectionMap` which can be thought of similiar to an "AST" of
/// sorts.
pub trait FormatWriter {
    /// Writes a changelog from a given `SectionMap`
    fn write_changelog(&mut self, release: &Release, section_map: &SectionMap) -> Result<()>;
}

/// Renders a release as Markdown. The same inputs always produce the same
/// text.
///
/// # Example
///
/// ```
/// # use ez_changelog::{SectionMap, config::SectionConfig, fmt::{render, Release}, link_style::Links};
/// let sections = SectionConfig::default();
/// let links = Links::default();
/// let sm = SectionMap::from_commits(&[], &sections, &links, None);
/// let release = Release { version: "v1.0.0", date: "2016-10-08", sections: &sections, links: &links };
///
/// assert_eq!(
///     "<a name=\"v1.0.0\"></a>\n# v1.0.0 (2016-10-08)\n\n### Nothing important to note\n\n",
///     render(&release, &sm).unwrap()
/// );
/// ```
pub fn render(release: &Release, section_map: &SectionMap) -> Result<String> {
    let mut buf = Vec::with_capacity(256);
    MarkdownWriter::new(&mut buf).write_changelog(release, section_map)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
