use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{crawler::CrawlReport, store::StoredArticle, Article, SiteCatalog};

/// Summary of one day's new articles, handed to whatever delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Digest {
    pub date: NaiveDate,
    pub total: usize,
    /// Keywords matched by any article, in order of first appearance.
    pub keywords: Vec<String>,
    pub sites: Vec<SiteDigest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteDigest {
    pub site_id: String,
    /// The site could not be crawled; `articles` is empty.
    pub failed: bool,
    pub articles: Vec<Article>,
}

impl Digest {
    pub fn from_report(report: &CrawlReport, date: NaiveDate) -> Self {
        let sites = report
            .iter()
            .map(|(site_id, outcome)| SiteDigest {
                site_id: site_id.to_string(),
                failed: outcome.is_failed(),
                articles: outcome.articles().to_vec(),
            })
            .collect();
        Self {
            date,
            total: report.total_articles(),
            keywords: report.keywords(),
            sites,
        }
    }

    /// Rebuilds a digest from stored articles, one entry per catalog site.
    /// Articles of sites no longer in the catalog are left out.
    pub fn from_stored(date: NaiveDate, catalog: &SiteCatalog, stored: &[StoredArticle]) -> Self {
        let sites: Vec<SiteDigest> = catalog
            .site_ids()
            .map(|site_id| SiteDigest {
                site_id: site_id.to_string(),
                failed: false,
                articles: stored
                    .iter()
                    .filter(|stored| stored.article.site_id == site_id)
                    .map(|stored| stored.article.clone())
                    .collect(),
            })
            .collect();

        let mut keywords: Vec<String> = Vec::new();
        for keyword in sites
            .iter()
            .flat_map(|site| &site.articles)
            .flat_map(|article| &article.keywords)
        {
            if !keywords.contains(keyword) {
                keywords.push(keyword.clone());
            }
        }

        Self {
            date,
            total: sites.iter().map(|site| site.articles.len()).sum(),
            keywords,
            sites,
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "[{}] {} new announcement{}",
            self.date.format("%Y-%m-%d"),
            self.total,
            if self.total == 1 { "" } else { "s" }
        )
    }
}
