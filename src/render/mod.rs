//! Article rendering - reading time, display dates and body markup

mod rich_text;

use serde::Serialize;

use crate::content::{Article, ArticleContentBlock};
use crate::helpers::{html_escape, DateFormatter};

pub use rich_text::{HtmlConverter, RichTextConverter};

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words in a block: its heading plus every body span
pub fn block_word_count(block: &ArticleContentBlock) -> usize {
    let body: usize = block.body.iter().map(|span| count_words(span.text())).sum();
    count_words(&block.heading) + body
}

/// Estimated reading time in whole minutes, rounded up
pub fn reading_time_minutes(content: &[ArticleContentBlock]) -> usize {
    let words: usize = content.iter().map(block_word_count).sum();
    words.div_ceil(WORDS_PER_MINUTE)
}

/// An article ready to be placed in a page template
#[derive(Debug, Clone, Serialize)]
pub struct RenderedArticle {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub published_at: String,
    pub published_at_iso: Option<String>,
    pub reading_time: usize,
    pub content: String,
}

/// Turns resolved articles into display data
pub struct ArticleRenderer<C = HtmlConverter> {
    converter: C,
    dates: DateFormatter,
}

impl ArticleRenderer<HtmlConverter> {
    pub fn new(dates: DateFormatter) -> Self {
        Self::with_converter(HtmlConverter, dates)
    }
}

impl<C: RichTextConverter> ArticleRenderer<C> {
    pub fn with_converter(converter: C, dates: DateFormatter) -> Self {
        Self { converter, dates }
    }

    pub fn format_publication_date(&self, published_at: Option<&str>) -> String {
        self.dates.format(published_at)
    }

    /// Heading element followed by the converted body
    pub fn render_block(&self, block: &ArticleContentBlock) -> String {
        format!(
            "<section class=\"block\">\n<h2>{}</h2>\n{}\n</section>",
            html_escape(&block.heading),
            self.converter.to_markup(&block.body)
        )
    }

    pub fn render(&self, article: &Article) -> RenderedArticle {
        let content = article
            .content
            .iter()
            .map(|block| self.render_block(block))
            .collect::<Vec<_>>()
            .join("\n");

        RenderedArticle {
            uid: article.uid.clone(),
            title: article.title.clone(),
            subtitle: article.subtitle.clone(),
            author: article.author.clone(),
            banner_url: article.banner_url.clone(),
            published_at: self.format_publication_date(article.published_at.as_deref()),
            published_at_iso: self.dates.date_xml(article.published_at.as_deref()),
            reading_time: reading_time_minutes(&article.content),
            content,
        }
    }
}
