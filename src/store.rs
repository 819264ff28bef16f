use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::entry::{Entry, EntryKind};
use crate::error::StoreError;
use crate::header::{dump_headers, join_tags, parse_headers, split_source, split_tags, HeaderValue};
use crate::slug::slugify;
use crate::text_utils::{format_date_time, parse_date_time};

/// Fields accepted when creating a new entry. When no date is given the
/// current time is used.
pub struct NewEntry {
    pub title: String,
    pub tags: Vec<String>,
    pub content: String,
    pub date: Option<NaiveDateTime>,
}

/// Flat-file entry store. One `<slug>.md` file per entry under the posts or
/// pages directory; file presence on disk is the only state.
pub struct ContentStore {
    posts_dir: PathBuf,
    pages_dir: PathBuf,
}

impl ContentStore {
    pub fn new(posts_dir: impl Into<PathBuf>, pages_dir: impl Into<PathBuf>) -> ContentStore {
        ContentStore {
            posts_dir: posts_dir.into(),
            pages_dir: pages_dir.into(),
        }
    }

    fn dir(&self, kind: EntryKind) -> &Path {
        match kind {
            EntryKind::Post => &self.posts_dir,
            EntryKind::Page => &self.pages_dir,
        }
    }

    fn entry_path(&self, kind: EntryKind, slug: &str) -> PathBuf {
        self.dir(kind).join(format!("{}.md", slug))
    }

    /// Slugs of all entries of a kind, in descending lexicographic order.
    /// The date prefix on post slugs makes this reverse-chronological.
    pub fn list(&self, kind: EntryKind, limit: Option<usize>) -> Result<Vec<String>, StoreError> {
        let mut slugs = vec![];
        for dir_entry in fs::read_dir(self.dir(kind))? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') || !file_name.ends_with(".md") {
                continue;
            }
            slugs.push(file_name.trim_end_matches(".md").to_string());
        }
        slugs.sort_by(|a, b| b.cmp(a));
        if let Some(limit) = limit {
            slugs.truncate(limit);
        }
        Ok(slugs)
    }

    /// Reads and parses one entry. Missing optional headers fall back to
    /// their defaults; a file with no blank line is all header block with
    /// an empty body.
    pub fn load(&self, kind: EntryKind, slug: &str) -> Result<Entry, StoreError> {
        if !is_safe_slug(slug) {
            return Err(StoreError::NotFound);
        }
        let path = self.entry_path(kind, slug);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let lastmod = file_mtime(&path)?;

        let (header_block, body) = split_source(&source);
        let mut title = String::new();
        let mut date_raw = None;
        let mut tags_raw = None;
        let mut extra = vec![];
        for (key, value) in parse_headers(header_block) {
            match (kind, key.as_str()) {
                (_, "title") => title = value,
                (EntryKind::Post, "date") => date_raw = Some(value),
                (EntryKind::Post, "tags") => tags_raw = Some(value),
                _ => extra.push((key, value)),
            }
        }

        let date = match kind {
            // Explicit header value wins; otherwise the slug's date prefix
            // pins the post at 10:00:00.
            EntryKind::Post => date_raw
                .as_deref()
                .and_then(|raw| parse_date_time(raw).ok())
                .or_else(|| Entry::date_from_slug(slug))
                .unwrap_or(lastmod),
            EntryKind::Page => lastmod,
        };
        let tags = tags_raw.as_deref().map(split_tags).unwrap_or_default();

        Ok(Entry {
            slug: slug.to_string(),
            kind,
            title,
            tags,
            date,
            lastmod,
            permalink: Entry::permalink_for(kind, slug),
            content: body.to_string(),
            extra,
        })
    }

    /// Writes a new entry file and returns the slug actually assigned,
    /// which may carry a numeric suffix when the candidate was taken.
    pub fn create(&self, kind: EntryKind, new: NewEntry) -> Result<String, StoreError> {
        let date = new.date.unwrap_or_else(|| Utc::now().naive_utc());
        let candidate = match kind {
            EntryKind::Post => format!("{}-{}", date.format("%Y-%m-%d"), slugify(&new.title)),
            EntryKind::Page => slugify(&new.title),
        };
        let slug = self.free_slug(kind, &candidate);

        let mut metadata = vec![
            ("title".to_string(), HeaderValue::Scalar(new.title)),
        ];
        if kind == EntryKind::Post {
            metadata.push(("tags".to_string(), HeaderValue::Scalar(join_tags(&new.tags))));
            metadata.push(("date".to_string(), HeaderValue::Scalar(format_date_time(&date))));
        }

        let raw = format!("{}\n{}", dump_headers(&metadata), new.content);
        fs::write(self.entry_path(kind, &slug), raw)?;
        Ok(slug)
    }

    /// Overwrites an existing entry with freshly serialized headers and
    /// content. The slug is preserved.
    pub fn edit(&self, kind: EntryKind, slug: &str, entry: &Entry) -> Result<(), StoreError> {
        if !is_safe_slug(slug) {
            return Err(StoreError::NotFound);
        }
        let path = self.entry_path(kind, slug);
        if !path.exists() {
            return Err(StoreError::NotFound);
        }
        let raw = format!("{}\n{}", dump_headers(&entry.header_fields()), entry.content);
        fs::write(path, raw)?;
        Ok(())
    }

    /// Removes an entry file. A missing file is not an error; it reports
    /// `false`.
    pub fn delete(&self, kind: EntryKind, slug: &str) -> Result<bool, StoreError> {
        if !is_safe_slug(slug) {
            return Ok(false);
        }
        let path = self.entry_path(kind, slug);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    // First-free-wins: append -2, -3, ... until a stem is unused. The
    // existence checks and the later write are not atomic; two concurrent
    // creates with the same title can both observe a stem as free and one
    // write clobbers the other. Acceptable for a single-writer deployment.
    fn free_slug(&self, kind: EntryKind, candidate: &str) -> String {
        if !self.entry_path(kind, candidate).exists() {
            return candidate.to_string();
        }
        let mut suffix = 2u32;
        while self.entry_path(kind, &format!("{}-{}", candidate, suffix)).exists() {
            suffix += 1;
        }
        format!("{}-{}", candidate, suffix)
    }
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains('/') && !slug.contains('\\') && !slug.contains("..")
}

fn file_mtime(path: &Path) -> Result<NaiveDateTime, StoreError> {
    let modified = fs::metadata(path)?.modified()?;
    let modified: DateTime<Utc> = modified.into();
    Ok(modified.naive_utc())
}
