use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::debug;
use time::PrimitiveDateTime;

use crate::{
    config::{SectionConfig, BREAKING_SECTION},
    git::Commit,
    link_style::Links,
};

/// The second level of the changelog, i.e. the components -> commit
/// information. Commits without a component live under `None`.
pub type ComponentMap = BTreeMap<Option<String>, Vec<Commit>>;

/// A struct which holds sections to and components->commits map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    /// The top level map of the changelog, i.e. section types -> components,
    /// in configured order
    pub sections: IndexMap<String, ComponentMap>,
    /// Set when no commit ended up in any section
    pub nothing_to_log: bool,
}

impl SectionMap {
    /// Creates a section map from commits, which we can then iterate through
    /// and write. With a `cutoff`, only commits dated strictly after it are
    /// kept.
    ///
    /// # Example
    ///
    /// ```
    /// # use ez_changelog::{SectionMap, config::SectionConfig, git::CommitParser, link_style::Links};
    /// let parser = CommitParser::new(false).unwrap();
    /// let commits = parser.parse_log(
    ///     "298cffa6a7a36bcde5650323b5d6d0f6cec065e8\nfeat(readme): add initial docs\n\n==END==\n",
    /// );
    ///
    /// let sm = SectionMap::from_commits(&commits, &SectionConfig::default(), &Links::default(), None);
    ///
    /// assert!(!sm.nothing_to_log);
    /// assert_eq!(sm.sections["feat"][&Some("readme".to_owned())].len(), 1);
    /// ```
    pub fn from_commits(
        commits: &[Commit],
        config: &SectionConfig,
        links: &Links,
        cutoff: Option<PrimitiveDateTime>,
    ) -> SectionMap {
        let mut sections = config
            .types()
            .map(|t| (t.to_owned(), ComponentMap::new()))
            .collect::<IndexMap<_, _>>();
        sections
            .entry(BREAKING_SECTION.to_owned())
            .or_default()
            .insert(None, vec![]);

        let mut nothing_to_log = true;

        for commit in commits {
            if let Some(cutoff) = cutoff {
                if !commit.date.is_some_and(|date| date > cutoff) {
                    debug!("Skipping {} from before the last build", commit.hash);
                    continue;
                }
            }

            if config.contains(&commit.commit_type) {
                sections
                    .entry(commit.commit_type.clone())
                    .or_default()
                    .entry(commit.component.clone())
                    .or_default()
                    .push(commit.clone());
                nothing_to_log = false;
            }

            if let Some(ref breaking) = commit.breaking {
                sections
                    .entry(BREAKING_SECTION.to_owned())
                    .or_default()
                    .entry(commit.component.clone())
                    .or_default()
                    .push(Commit {
                        hash: commit.hash.clone(),
                        date: commit.date,
                        subject: format!("due to {},\n {breaking}", links.commit(&commit.hash)),
                        commit_type: BREAKING_SECTION.to_owned(),
                        component: commit.component.clone(),
                        body: String::new(),
                        closes: vec![],
                        breaking: None,
                    });
                nothing_to_log = false;
            }
        }

        SectionMap {
            sections,
            nothing_to_log,
        }
    }

    pub fn get(&self, commit_type: &str) -> Option<&ComponentMap> {
        self.sections.get(commit_type)
    }

    /// A section with no components, or only components without entries,
    /// has nothing to print
    pub fn is_empty_section(components: &ComponentMap) -> bool {
        components.values().all(Vec::is_empty)
    }
}
