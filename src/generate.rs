//! Static site generation. The generator only consumes read-only entries
//! from the store; the API core reaches it through the [`Regenerate`]
//! seam and never depends on this module.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use ramhorns::Template;
use serde_json::json;
use spdlog::info;

use crate::api::Regenerate;
use crate::config::Config;
use crate::entry::{Entry, EntryKind};
use crate::satellite::SatellitePipeline;
use crate::store::ContentStore;
use crate::text_utils::{format_date, format_date_time};

#[derive(ramhorns::Content)]
struct ListItem {
    title: String,
    permalink: String,
    date: String,
    content: String,
}

#[derive(ramhorns::Content)]
struct TagItem {
    tag: String,
}

#[derive(ramhorns::Content)]
struct HomePage {
    blog_title: String,
    blog_description: String,
    blog_url: String,
    posts: Vec<ListItem>,
}

#[derive(ramhorns::Content)]
struct ArchivePage {
    blog_title: String,
    blog_url: String,
    posts: Vec<ListItem>,
}

#[derive(ramhorns::Content)]
struct EntryPage {
    blog_title: String,
    blog_url: String,
    title: String,
    date: String,
    tags: Vec<TagItem>,
    content: String,
}

/// Renders the whole site into the output directory: home page, one page
/// per entry, archive, RSS feed, sitemap and a JSON search index.
pub struct SiteGenerator {
    store: ContentStore,
    satellites: SatellitePipeline,
    blog_url: String,
    blog_title: String,
    blog_description: String,
    max_posts: usize,
    template_dir: PathBuf,
    output_dir: PathBuf,
}

impl SiteGenerator {
    pub fn new(config: &Config) -> SiteGenerator {
        SiteGenerator {
            store: ContentStore::new(&config.paths.posts_dir, &config.paths.pages_dir),
            satellites: SatellitePipeline::with_defaults(),
            blog_url: config.blog.url.clone(),
            blog_title: config.blog.title.clone(),
            blog_description: config.blog.description.clone(),
            max_posts: config.blog.max_posts,
            template_dir: config.paths.template_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
        }
    }

    /// Entries of a kind, newest first, ran through every satellite.
    fn entries(&self, kind: EntryKind, limit: Option<usize>) -> Result<Vec<Entry>> {
        let mut entries = vec![];
        for slug in self.store.list(kind, limit)? {
            let entry = self.store.load(kind, &slug)?;
            entries.push(self.satellites.apply(kind, entry));
        }
        Ok(entries)
    }

    fn render_template(&self, name: &str, page: &impl ramhorns::Content) -> Result<String> {
        let template_path = self.template_dir.join(name);
        let source = fs::read_to_string(&template_path)
            .with_context(|| format!("Error loading template {}", name))?;
        let template = Template::new(source)
            .with_context(|| format!("Error parsing template {}", name))?;
        Ok(template.render(page))
    }

    fn write_output(&self, relative: &str, data: &str) -> Result<()> {
        let out_path = self.output_dir.join(relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, data)
            .with_context(|| format!("Error writing {}", out_path.to_str().unwrap()))?;
        Ok(())
    }

    fn list_items(entries: &[Entry]) -> Vec<ListItem> {
        entries
            .iter()
            .map(|entry| ListItem {
                title: entry.title.clone(),
                permalink: entry.permalink.clone(),
                date: format_date(&entry.date),
                content: entry.content.clone(),
            })
            .collect()
    }

    pub fn generate_home(&self) -> Result<()> {
        let posts = self.entries(EntryKind::Post, Some(self.max_posts))?;
        let rendered = self.render_template("home.tpl", &HomePage {
            blog_title: self.blog_title.clone(),
            blog_description: self.blog_description.clone(),
            blog_url: self.blog_url.clone(),
            posts: Self::list_items(&posts),
        })?;
        self.write_output("index.html", &rendered)
    }

    pub fn generate_entries(&self) -> Result<()> {
        for kind in [EntryKind::Post, EntryKind::Page] {
            let template = match kind {
                EntryKind::Post => "post.tpl",
                EntryKind::Page => "page.tpl",
            };
            for entry in self.entries(kind, None)? {
                let rendered = self.render_template(template, &EntryPage {
                    blog_title: self.blog_title.clone(),
                    blog_url: self.blog_url.clone(),
                    title: entry.title.clone(),
                    date: format_date_time(&entry.date),
                    tags: entry.tags.iter().map(|t| TagItem { tag: t.clone() }).collect(),
                    content: entry.content.clone(),
                })?;
                let relative = format!("{}/index.html", entry.permalink.trim_start_matches('/'));
                self.write_output(&relative, &rendered)?;
            }
        }
        Ok(())
    }

    pub fn generate_archive(&self) -> Result<()> {
        let posts = self.entries(EntryKind::Post, None)?;
        let rendered = self.render_template("archive.tpl", &ArchivePage {
            blog_title: self.blog_title.clone(),
            blog_url: self.blog_url.clone(),
            posts: Self::list_items(&posts),
        })?;
        self.write_output("archive/index.html", &rendered)
    }

    pub fn generate_rss(&self) -> Result<()> {
        let posts = self.entries(EntryKind::Post, Some(self.max_posts))?;
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        push_text(&mut writer, "title", &self.blog_title)?;
        push_text(&mut writer, "link", &self.blog_url)?;
        push_text(&mut writer, "description", &self.blog_description)?;

        for post in &posts {
            writer.write_event(Event::Start(BytesStart::new("item")))?;
            push_text(&mut writer, "title", &post.title)?;
            push_text(&mut writer, "link", &format!("{}{}", self.blog_url, post.permalink))?;

            let mut guid = BytesStart::new("guid");
            guid.push_attribute(("isPermaLink", "false"));
            writer.write_event(Event::Start(guid))?;
            writer.write_event(Event::Text(BytesText::new(&post.slug)))?;
            writer.write_event(Event::End(BytesEnd::new("guid")))?;

            push_cdata(&mut writer, "description", &post.content)?;

            let date = Utc.from_utc_datetime(&post.date);
            push_text(&mut writer, "pubDate", &date.to_rfc2822())?;
            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        let xml = String::from_utf8(writer.into_inner().into_inner())?;
        self.write_output("rss.xml", &xml)
    }

    pub fn generate_sitemap(&self) -> Result<()> {
        let mut entries = self.entries(EntryKind::Post, None)?;
        entries.extend(self.entries(EntryKind::Page, None)?);

        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", "http://www.sitemaps.org/schemas/sitemap/0.9"));
        writer.write_event(Event::Start(urlset))?;

        for entry in &entries {
            writer.write_event(Event::Start(BytesStart::new("url")))?;
            push_text(&mut writer, "loc", &format!("{}{}", self.blog_url, entry.permalink))?;
            push_text(&mut writer, "lastmod", &format_date(&entry.lastmod))?;
            push_text(&mut writer, "changefreq", extra_or(entry, "frequency", "monthly"))?;
            push_text(&mut writer, "priority", extra_or(entry, "priority", "0.5"))?;
            writer.write_event(Event::End(BytesEnd::new("url")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        let xml = String::from_utf8(writer.into_inner().into_inner())?;
        self.write_output("sitemap.xml", &xml)
    }

    pub fn generate_search_index(&self) -> Result<()> {
        let posts = self.entries(EntryKind::Post, None)?;
        let index: Vec<_> = posts
            .iter()
            .map(|post| json!({
                "title": post.title,
                "url": format!("{}{}", self.blog_url, post.permalink),
                "date": format_date(&post.date),
                "tags": post.tags,
            }))
            .collect();
        self.write_output("search.json", &serde_json::to_string(&index)?)
    }
}

impl Regenerate for SiteGenerator {
    fn regenerate(&self) -> Result<()> {
        info!("Regenerating site into {}", self.output_dir.to_str().unwrap());
        self.generate_home()?;
        self.generate_entries()?;
        self.generate_archive()?;
        self.generate_rss()?;
        self.generate_sitemap()?;
        self.generate_search_index()?;
        Ok(())
    }
}

fn extra_or<'a>(entry: &'a Entry, key: &str, default: &'a str) -> &'a str {
    entry
        .extra
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or(default)
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn push_cdata(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if text.contains("]]>") {
        let new_text = text.replace("]]>", "]] >");
        writer.write_event(Event::CData(BytesCData::new(&new_text)))?;
    } else {
        writer.write_event(Event::CData(BytesCData::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::config::{Blog, Paths, Server};
    use crate::store::NewEntry;
    use crate::text_utils::parse_date_time;

    use super::*;

    fn test_config(root: &Path) -> Config {
        Config {
            blog: Blog {
                url: "http://localhost:8888".to_string(),
                title: "Test Blog".to_string(),
                description: "Posts about nothing".to_string(),
                api_secret: "secret".to_string(),
                max_posts: 3,
            },
            paths: Paths {
                posts_dir: root.join("posts"),
                pages_dir: root.join("pages"),
                template_dir: root.join("templates"),
                output_dir: root.join("output"),
            },
            server: Server {
                address: "127.0.0.1".to_string(),
                port: 8888,
            },
            log: None,
        }
    }

    fn seed_site(root: &Path) -> Config {
        let config = test_config(root);
        for dir in [&config.paths.posts_dir, &config.paths.pages_dir, &config.paths.template_dir] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(
            config.paths.template_dir.join("home.tpl"),
            "<h1>{{blog_title}}</h1>{{#posts}}<a href=\"{{permalink}}\">{{title}}</a>{{/posts}}",
        )
        .unwrap();
        fs::write(
            config.paths.template_dir.join("post.tpl"),
            "<article><h1>{{title}}</h1>{{{content}}}</article>",
        )
        .unwrap();
        fs::write(
            config.paths.template_dir.join("page.tpl"),
            "<section>{{{content}}}</section>",
        )
        .unwrap();
        fs::write(
            config.paths.template_dir.join("archive.tpl"),
            "{{#posts}}{{date}} {{title}}\n{{/posts}}",
        )
        .unwrap();

        let store = ContentStore::new(&config.paths.posts_dir, &config.paths.pages_dir);
        store
            .create(EntryKind::Post, NewEntry {
                title: "First Post".to_string(),
                tags: vec!["intro".to_string()],
                content: "# Hello\n\nSome *markdown* text.".to_string(),
                date: parse_date_time("2024-05-01 10:00:00").ok(),
            })
            .unwrap();
        store
            .create(EntryKind::Page, NewEntry {
                title: "About".to_string(),
                tags: vec![],
                content: "The about page.".to_string(),
                date: None,
            })
            .unwrap();

        config
    }

    #[test]
    fn test_regenerate_writes_the_whole_site() {
        let root = TempDir::new().unwrap();
        let config = seed_site(root.path());
        let generator = SiteGenerator::new(&config);
        generator.regenerate().unwrap();

        let out = &config.paths.output_dir;
        let home = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(home.contains("<h1>Test Blog</h1>"));
        assert!(home.contains("First Post"));

        let post = fs::read_to_string(out.join("2024/05/first-post/index.html")).unwrap();
        assert!(post.contains("<h1>First Post</h1>"));
        assert!(post.contains("<h1>Hello</h1>"));

        let page = fs::read_to_string(out.join("about/index.html")).unwrap();
        assert!(page.contains("The about page."));

        let archive = fs::read_to_string(out.join("archive/index.html")).unwrap();
        assert!(archive.contains("2024-05-01 First Post"));

        let rss = fs::read_to_string(out.join("rss.xml")).unwrap();
        assert!(rss.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\">"));
        assert!(rss.contains("<link>http://localhost:8888/2024/05/first-post</link>"));

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<changefreq>monthly</changefreq>"));
        assert!(sitemap.contains("<loc>http://localhost:8888/about</loc>"));

        let index: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("search.json")).unwrap()).unwrap();
        assert_eq!(index[0]["title"], "First Post");
        assert_eq!(index[0]["tags"], json!(["intro"]));
    }

    #[test]
    fn test_home_respects_max_posts() {
        let root = TempDir::new().unwrap();
        let config = seed_site(root.path());
        let store = ContentStore::new(&config.paths.posts_dir, &config.paths.pages_dir);
        for day in ["02", "03", "04", "05"] {
            store
                .create(EntryKind::Post, NewEntry {
                    title: format!("Post {}", day),
                    tags: vec![],
                    content: "text".to_string(),
                    date: parse_date_time(&format!("2024-05-{} 10:00:00", day)).ok(),
                })
                .unwrap();
        }

        let generator = SiteGenerator::new(&config);
        generator.generate_home().unwrap();

        let home = fs::read_to_string(config.paths.output_dir.join("index.html")).unwrap();
        assert!(home.contains("Post 05"));
        assert!(home.contains("Post 03"));
        assert!(!home.contains("First Post"));
    }
}
