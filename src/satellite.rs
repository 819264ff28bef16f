//! Content transforms applied to entries before rendering. Satellites run
//! in registration order and live outside the store: they only see the
//! read-only `Entry` records the generator feeds them.

use crate::entry::{Entry, EntryKind};

pub trait Satellite: Send + Sync {
    fn apply(&self, kind: EntryKind, entry: Entry) -> Entry;
}

/// An ordered list of satellites. `apply` threads the entry through every
/// registered transform, in order.
#[derive(Default)]
pub struct SatellitePipeline {
    satellites: Vec<Box<dyn Satellite>>,
}

impl SatellitePipeline {
    pub fn new() -> SatellitePipeline {
        SatellitePipeline { satellites: vec![] }
    }

    /// The transforms a stock blog runs: markdown, then word count,
    /// then sitemap annotations.
    pub fn with_defaults() -> SatellitePipeline {
        let mut pipeline = SatellitePipeline::new();
        pipeline.register(Box::new(MarkdownSatellite));
        pipeline.register(Box::new(WordCountSatellite));
        pipeline.register(Box::new(SitemapSatellite));
        pipeline
    }

    pub fn register(&mut self, satellite: Box<dyn Satellite>) {
        self.satellites.push(satellite);
    }

    pub fn apply(&self, kind: EntryKind, mut entry: Entry) -> Entry {
        for satellite in &self.satellites {
            entry = satellite.apply(kind, entry);
        }
        entry
    }
}

/// Renders the markdown body to HTML.
pub struct MarkdownSatellite;

impl Satellite for MarkdownSatellite {
    fn apply(&self, _kind: EntryKind, mut entry: Entry) -> Entry {
        entry.content = markdown::to_html(&entry.content);
        entry
    }
}

/// Annotates the entry with its word count and an estimated reading time
/// at 200 words per minute.
pub struct WordCountSatellite;

impl Satellite for WordCountSatellite {
    fn apply(&self, _kind: EntryKind, mut entry: Entry) -> Entry {
        let words = entry.content.split_whitespace().count();
        let reading_time = words.div_ceil(200);
        entry.extra.push(("wordcount".to_string(), words.to_string()));
        entry.extra.push(("readingtime".to_string(), reading_time.to_string()));
        entry
    }
}

/// Sitemap hints: posts change monthly at priority 0.8, pages yearly
/// at 0.6.
pub struct SitemapSatellite;

impl Satellite for SitemapSatellite {
    fn apply(&self, kind: EntryKind, mut entry: Entry) -> Entry {
        let (priority, frequency) = match kind {
            EntryKind::Post => ("0.8", "monthly"),
            EntryKind::Page => ("0.6", "yearly"),
        };
        entry.extra.push(("priority".to_string(), priority.to_string()));
        entry.extra.push(("frequency".to_string(), frequency.to_string()));
        entry
    }
}
