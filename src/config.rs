use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Blog {
    pub url: String,
    pub title: String,
    pub description: String,
    pub api_secret: String,
    pub max_posts: usize,
}

#[derive(Deserialize)]
pub struct Paths {
    pub posts_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: PathBuf,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub blog: Blog,
    pub paths: Paths,
    pub server: Server,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    if path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe().unwrap();
        let exe_dir = cur_exe.parent().unwrap().to_str().unwrap();
        let str_path = path.to_str().unwrap();
        PathBuf::from(str_path.replace("${exe_dir}", exe_dir))
    } else {
        path
    }
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.to_str().unwrap(), e))),
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        posts_dir: parse_path(cfg.paths.posts_dir),
        pages_dir: parse_path(cfg.paths.pages_dir),
        template_dir: parse_path(cfg.paths.template_dir),
        output_dir: parse_path(cfg.paths.output_dir),
    };

    Ok(cfg)
}

const CFG_FILE_NAME: &str = "pressed.toml";

fn find_config_path() -> Option<PathBuf> {
    let exe_path = env::current_exe().unwrap();
    let exe_dir = exe_path.parent().unwrap();
    if exe_dir.join(CFG_FILE_NAME).exists() {
        return Some(exe_dir.join(CFG_FILE_NAME));
    }

    let cur_dir = env::current_dir().unwrap();
    if cur_dir.join(CFG_FILE_NAME).exists() {
        return Some(cur_dir.join(CFG_FILE_NAME));
    }

    None
}

/// Reads the configuration from an explicit path, or from `pressed.toml`
/// next to the executable or in the current directory.
pub fn open_config(cfg_path: Option<PathBuf>) -> io::Result<Config> {
    let cfg_path = match cfg_path.or_else(find_config_path) {
        Some(path) => path,
        None => return Err(io::Error::new(
            ErrorKind::NotFound, "Could not find a pressed.toml configuration file")),
    };

    read_config(&cfg_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r##"
[blog]
url = "http://localhost:8888"
title = "A test blog"
description = "Posts about nothing"
api_secret = "hunter2"
max_posts = 3

[paths]
posts_dir = "content/posts"
pages_dir = "content/pages"
template_dir = "templates"
output_dir = "output"

[server]
address = "127.0.0.1"
port = 8888
"##;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.blog.url, "http://localhost:8888");
        assert_eq!(cfg.blog.max_posts, 3);
        assert_eq!(cfg.paths.posts_dir, PathBuf::from("content/posts"));
        assert_eq!(cfg.server.port, 8888);
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_parse_log_section() {
        let toml_str = r##"
[blog]
url = "http://localhost"
title = "t"
description = "d"
api_secret = "s"
max_posts = 10

[paths]
posts_dir = "posts"
pages_dir = "pages"
template_dir = "templates"
output_dir = "output"

[server]
address = "0.0.0.0"
port = 80

[log]
level = "Info"
log_to_console = true
location = "/var/log/pressed/server.log"
"##;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        let log = cfg.log.unwrap();
        assert!(log.log_to_console);
        assert_eq!(log.location, PathBuf::from("/var/log/pressed/server.log"));
    }
}
