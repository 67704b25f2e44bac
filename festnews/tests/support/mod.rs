#![allow(dead_code)]

use chrono::NaiveDate;
use festnews::{Article, ArticleSource, FetchError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub fn article(id: usize, day: u32, popularity: u32) -> Article {
    Article {
        id: format!("story-{}", id),
        title_original: format!("Festival story {}", id),
        title_translated: format!("电影节新闻 {}", id),
        summary_original: format!("Summary {}", id),
        summary_translated: format!("摘要 {}...", id),
        published_at: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        popularity,
        source_link: format!("https://example.com/story-{}", id),
    }
}

/// `n` articles spread over a few days so that dates tie.
pub fn articles(n: usize) -> Vec<Article> {
    (0..n)
        .map(|i| article(i, 1 + (i % 4) as u32, 1000 + ((i * 7919) % 500) as u32))
        .collect()
}

/// Hands out scripted fetch results in order, repeating the last one.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Article>, FetchError>>>,
    last: Mutex<Option<Result<Vec<Article>, FetchError>>>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Article>, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ArticleSource for ScriptedSource {
    async fn fetch(&self, _topic: &str) -> Result<Vec<Article>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().await.pop_front();
        let mut last = self.last.lock().await;
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or(Err(FetchError::Empty)),
        }
    }

    fn cache_key(&self, topic: &str) -> String {
        topic.to_ascii_lowercase()
    }
}
