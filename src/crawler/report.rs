use std::error::Error as StdError;

use crate::{incident::error_trace, Article};

/// What one site's crawl produced.
///
/// `Collected(vec![])` means the site was crawled and had nothing new;
/// `Failed` means it could not be crawled at all.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "status", content = "outcome", rename_all = "snake_case")]
pub enum SiteOutcome {
    Collected(Vec<Article>),
    Failed(SiteFailure),
}

impl SiteOutcome {
    pub fn articles(&self) -> &[Article] {
        match self {
            SiteOutcome::Collected(articles) => articles,
            SiteOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SiteOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SiteFailure {
    pub reason: String,
    pub trace: String,
}

impl SiteFailure {
    pub fn from_error(error: &dyn StdError) -> Self {
        Self {
            reason: error.to_string(),
            trace: error_trace(error),
        }
    }
}

/// Per-site outcomes of one run, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct CrawlReport {
    sites: Vec<(String, SiteOutcome)>,
}

impl CrawlReport {
    /// Records a site's outcome, replacing an earlier one for the same site
    /// in place.
    pub fn insert<S: Into<String>>(&mut self, site_id: S, outcome: SiteOutcome) {
        let site_id = site_id.into();
        match self.sites.iter_mut().find(|(id, _)| *id == site_id) {
            Some((_, existing)) => *existing = outcome,
            None => self.sites.push((site_id, outcome)),
        }
    }

    pub fn get(&self, site_id: &str) -> Option<&SiteOutcome> {
        self.sites
            .iter()
            .find(|(id, _)| id == site_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SiteOutcome)> {
        self.sites.iter().map(|(id, outcome)| (id.as_str(), outcome))
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.sites.iter().flat_map(|(_, outcome)| outcome.articles())
    }

    pub fn total_articles(&self) -> usize {
        self.sites.iter().map(|(_, outcome)| outcome.articles().len()).sum()
    }

    /// Every keyword matched by any article, in order of first appearance.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for keyword in self.articles().flat_map(|article| &article.keywords) {
            if !keywords.contains(keyword) {
                keywords.push(keyword.clone());
            }
        }
        keywords
    }

    pub fn failed_sites(&self) -> impl Iterator<Item = (&str, &SiteFailure)> {
        self.sites.iter().filter_map(|(id, outcome)| match outcome {
            SiteOutcome::Failed(failure) => Some((id.as_str(), failure)),
            SiteOutcome::Collected(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
