use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::header::{join_tags, HeaderValue};
use crate::text_utils::format_date_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Post,
    Page,
}

/// A loaded post or page. The slug doubles as the file stem and never
/// changes across an edit; the permalink is computed on load and never
/// persisted.
#[derive(Debug, Clone)]
pub struct Entry {
    pub slug: String,
    pub kind: EntryKind,
    pub title: String,
    pub tags: Vec<String>,
    pub date: NaiveDateTime,
    pub lastmod: NaiveDateTime,
    pub permalink: String,
    pub content: String,
    /// Scalar headers beyond the typed fields, in file order. They
    /// round-trip through an edit untouched.
    pub extra: Vec<(String, String)>,
}

impl Entry {
    /// `/YYYY/MM/slug` for posts (from the slug's date prefix), `/slug`
    /// for pages.
    pub fn permalink_for(kind: EntryKind, slug: &str) -> String {
        match kind {
            EntryKind::Page => format!("/{}", slug),
            EntryKind::Post => {
                let mut parts = slug.splitn(4, '-');
                match (parts.next(), parts.next(), parts.next(), parts.next()) {
                    (Some(year), Some(month), Some(_day), Some(rest)) => {
                        format!("/{}/{}/{}", year, month, rest)
                    }
                    _ => format!("/{}", slug),
                }
            }
        }
    }

    /// Derives a post date from the slug's `YYYY-MM-DD-` prefix, pinned
    /// at 10:00:00.
    pub fn date_from_slug(slug: &str) -> Option<NaiveDateTime> {
        let mut parts = slug.splitn(4, '-');
        let year = parts.next()?.parse().ok()?;
        let month = parts.next()?.parse().ok()?;
        let day = parts.next()?.parse().ok()?;
        chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(10, 0, 0)
    }

    /// The metadata serialized back to disk on an edit. Tags flatten to a
    /// comma-joined scalar; pages carry no tags or date headers.
    pub fn header_fields(&self) -> Vec<(String, HeaderValue)> {
        let mut fields = vec![
            ("title".to_string(), HeaderValue::Scalar(self.title.clone())),
        ];
        if self.kind == EntryKind::Post {
            fields.push(("tags".to_string(), HeaderValue::Scalar(join_tags(&self.tags))));
            fields.push(("date".to_string(), HeaderValue::Scalar(format_date_time(&self.date))));
        }
        for (key, value) in &self.extra {
            fields.push((key.clone(), HeaderValue::Scalar(value.clone())));
        }
        fields
    }

    /// The API representation: timestamps as unix seconds, tags as a list,
    /// extra headers flattened alongside the typed fields.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.extra {
            map.insert(key.clone(), Value::from(value.clone()));
        }
        map.insert("title".to_string(), Value::from(self.title.clone()));
        map.insert("tags".to_string(), Value::from(self.tags.clone()));
        map.insert("date".to_string(), Value::from(self.date.and_utc().timestamp()));
        map.insert("lastmod".to_string(), Value::from(self.lastmod.and_utc().timestamp()));
        map.insert("permalink".to_string(), Value::from(self.permalink.clone()));
        map.insert("content".to_string(), Value::from(self.content.clone()));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_permalink() {
        assert_eq!(
            Entry::permalink_for(EntryKind::Post, "2024-01-05-hello-world"),
            "/2024/01/hello-world"
        );
        assert_eq!(Entry::permalink_for(EntryKind::Post, "no-date-prefix"), "/no-date-prefix");
    }

    #[test]
    fn test_page_permalink() {
        assert_eq!(Entry::permalink_for(EntryKind::Page, "about"), "/about");
    }

    #[test]
    fn test_date_from_slug() {
        let date = Entry::date_from_slug("2024-01-05-hello").unwrap();
        assert_eq!(format_date_time(&date), "2024-01-05 10:00:00");
        assert!(Entry::date_from_slug("hello-world").is_none());
    }
}
