use crate::model::{Article, Page, PageMeta, SortOrder};

/// Stable sort of the whole article set; ties keep their feed order.
pub fn sort_articles(articles: &[Article], sort: SortOrder) -> Vec<Article> {
    let mut sorted = articles.to_vec();
    match sort {
        SortOrder::Latest => sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        SortOrder::Hottest => sorted.sort_by(|a, b| b.popularity.cmp(&a.popularity)),
    }
    sorted
}

/// Sort `articles` and cut out the 1-indexed `page`.
///
/// Pages past the end (and page 0) are empty rather than an error.
pub fn paginate(articles: &[Article], sort: SortOrder, page: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total = articles.len();
    let total_pages = total.div_ceil(page_size);

    let start = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
        .map_or(total, |s| s.min(total));
    let end = start.saturating_add(page_size).min(total);

    let page_articles = if start < end {
        sort_articles(articles, sort).drain(start..end).collect()
    } else {
        Vec::new()
    };

    Page {
        articles: page_articles,
        meta: PageMeta {
            page,
            page_size,
            total,
            total_pages,
            has_more: end < total,
        },
    }
}
