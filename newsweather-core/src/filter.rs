//! Local narrowing of a fetched article set.

use crate::model::{Article, ArticleSet};

/// Articles whose title, description or source name contains `query`,
/// ignoring case. Input order is kept; an empty query keeps everything.
pub fn filter(articles: &[Article], query: &str) -> ArticleSet {
    if query.is_empty() {
        return articles.to_vec();
    }

    let needle = query.to_lowercase();
    articles.iter().filter(|a| matches(a, &needle)).cloned().collect()
}

fn matches(article: &Article, needle: &str) -> bool {
    [&article.title, &article.description, &article.source_name]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}
