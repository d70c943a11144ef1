//! Static site build: renders templates from the input directory into the
//! output directory and copies static assets through unchanged.
//!
//! Pages are Nunjucks-style templates rendered with minijinja. Each page may
//! open with a YAML front matter block whose keys join the page context and
//! whose `layout` names a wrapper in the includes directory. Layouts receive
//! the rendered page as `content` and may name a layout of their own.
//! Markdown pages are run through the template engine first and converted
//! to HTML afterwards. Global data comes from `_data/*.json`, keyed by file
//! stem.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const TEMPLATE_EXTENSIONS: [&str; 3] = ["html", "njk", "md"];
const MAX_LAYOUT_DEPTH: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Render(#[from] minijinja::Error),

    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping")]
    FrontMatterShape,

    #[error("unterminated front matter")]
    UnterminatedFrontMatter,

    #[error("layout not found: {0}")]
    MissingLayout(String),

    #[error("layouts nested deeper than {}", MAX_LAYOUT_DEPTH)]
    LayoutDepth,
}

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("{}: invalid data file: {source}", path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> SiteError + '_ {
    move |source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct Passthrough {
    pub from: PathBuf,
    /// Relative to the output directory.
    pub to: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub input: PathBuf,
    pub includes: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
    pub passthrough: Vec<Passthrough>,
}

impl SiteConfig {
    /// Standard layout: `_includes` and `_data` inside the input directory,
    /// assets and the PWA files copied verbatim.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let copy = |from: &str, to: &str| Passthrough {
            from: input.join(from),
            to: PathBuf::from(to),
        };
        let passthrough = vec![
            copy("css", "css"),
            copy("js", "js"),
            copy("images", "images"),
            copy("assets", "assets"),
            copy("manifest.json", "manifest.json"),
            copy("sw.js", "service-worker.js"),
        ];

        Self {
            includes: input.join("_includes"),
            data: input.join("_data"),
            output: output.into(),
            input,
            passthrough,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.starts_with(&self.includes)
            || path.starts_with(&self.data)
            || self.passthrough.iter().any(|p| path.starts_with(&p.from))
    }
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub rendered: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// A template split into its front matter and the text after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub data: Map<String, Value>,
    pub body: String,
}

impl Document {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let Some(rest) = source
            .strip_prefix("---")
            .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
        else {
            return Ok(Self {
                data: Map::new(),
                body: source.to_string(),
            });
        };

        let (yaml, after) = if let Some(after) = rest.strip_prefix("---") {
            ("", after)
        } else {
            let end = rest
                .find("\n---")
                .ok_or(TemplateError::UnterminatedFrontMatter)?;
            (&rest[..end], &rest[end + 4..])
        };
        let body = after.split_once('\n').map_or("", |(_, body)| body);

        let data = if yaml.trim().is_empty() {
            Map::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml)? {
                Value::Object(data) => data,
                Value::Null => Map::new(),
                _ => return Err(TemplateError::FrontMatterShape),
            }
        };

        Ok(Self {
            data,
            body: body.to_string(),
        })
    }

    fn layout(&self) -> Option<String> {
        self.data
            .get("layout")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

pub struct Templates {
    env: Environment<'static>,
    layouts: HashMap<String, Document>,
}

impl Templates {
    /// `includes` maps paths relative to the includes directory to their
    /// source. They serve both `{% include %}`/`{% extends %}` and layouts.
    pub fn new(includes: HashMap<String, String>, data: Value) -> Result<Self, TemplateError> {
        let mut layouts = HashMap::with_capacity(includes.len());
        for (name, source) in includes {
            layouts.insert(name, Document::parse(&source)?);
        }

        let bodies: HashMap<String, String> = layouts
            .iter()
            .map(|(name, doc)| (name.clone(), doc.body.clone()))
            .collect();

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_loader(move |name| Ok(bodies.get(name).cloned()));
        if let Value::Object(globals) = data {
            for (key, value) in globals {
                env.add_global(key, minijinja::Value::from_serialize(&value));
            }
        }

        Ok(Self { env, layouts })
    }

    /// Renders one page. `name` is its path relative to the input directory
    /// and picks Markdown conversion for `.md` pages.
    pub fn render(&self, name: &str, source: &str) -> Result<String, TemplateError> {
        let page = Document::parse(source)?;
        let mut layout = page.layout();
        let mut context = page.data;

        let mut content = self.env.render_named_str(name, &page.body, &context)?;
        if is_markdown(Path::new(name)) {
            content = markdown_to_html(&content);
        }

        let mut depth = 0;
        while let Some(layout_name) = layout.take() {
            depth += 1;
            if depth > MAX_LAYOUT_DEPTH {
                return Err(TemplateError::LayoutDepth);
            }
            let wrapper = self
                .layouts
                .get(&layout_name)
                .ok_or_else(|| TemplateError::MissingLayout(layout_name.clone()))?;

            // Page values win over layout defaults.
            for (key, value) in &wrapper.data {
                if key != "layout" {
                    context.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
            context.insert("content".to_string(), Value::String(content));
            content = self
                .env
                .render_named_str(&layout_name, &wrapper.body, &context)?;
            layout = wrapper.layout();
        }

        Ok(content)
    }
}

fn markdown_to_html(markdown: &str) -> String {
    use pulldown_cmark::{Options, Parser, html};

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

/// Where a template lands: `index.njk` → `index.html`, `about.njk` →
/// `about/index.html`.
pub fn output_path(relative: &Path) -> PathBuf {
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    match relative.file_stem().and_then(|s| s.to_str()) {
        Some("index") | None => parent.join("index.html"),
        Some(stem) => parent.join(stem).join("index.html"),
    }
}

fn is_template(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
}

async fn walk_files(root: &Path) -> Result<Vec<PathBuf>, SiteError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(io_err(&dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err(&dir))? {
            let path = entry.path();
            let kind = entry.file_type().await.map_err(io_err(&path))?;
            if kind.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

async fn load_includes(dir: &Path) -> Result<HashMap<String, String>, SiteError> {
    let mut includes = HashMap::new();
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(includes);
    }
    for path in walk_files(dir).await? {
        let name = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let source = fs::read_to_string(&path).await.map_err(io_err(&path))?;
        includes.insert(name, source);
    }
    Ok(includes)
}

async fn load_data(dir: &Path) -> Result<Value, SiteError> {
    let mut data = Map::new();
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(Value::Object(data));
    }
    for path in walk_files(dir).await? {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = fs::read(&path).await.map_err(io_err(&path))?;
        let value = serde_json::from_slice(&raw).map_err(|source| SiteError::Data {
            path: path.clone(),
            source,
        })?;
        data.insert(stem.to_string(), value);
    }
    Ok(Value::Object(data))
}

async fn copy_file(from: &Path, to: &Path) -> Result<(), SiteError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await.map_err(io_err(parent))?;
    }
    fs::copy(from, to).await.map_err(io_err(from))?;
    Ok(())
}

async fn copy_passthrough(
    rule: &Passthrough,
    output: &Path,
    report: &mut BuildReport,
) -> Result<(), SiteError> {
    let target = output.join(&rule.to);
    let meta = match fs::metadata(&rule.from).await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %rule.from.display(), "passthrough source missing, skipping");
            report.missing.push(rule.from.clone());
            return Ok(());
        }
        Err(source) => {
            return Err(SiteError::Io {
                path: rule.from.clone(),
                source,
            });
        }
    };

    if meta.is_dir() {
        for file in walk_files(&rule.from).await? {
            let relative = file.strip_prefix(&rule.from).unwrap_or(&file);
            let dest = target.join(relative);
            copy_file(&file, &dest).await?;
            report.copied.push(dest);
        }
    } else {
        copy_file(&rule.from, &target).await?;
        report.copied.push(target);
    }
    Ok(())
}

pub async fn build(config: &SiteConfig) -> Result<BuildReport, SiteError> {
    let mut report = BuildReport::default();
    fs::create_dir_all(&config.output)
        .await
        .map_err(io_err(&config.output))?;

    let templates = Templates::new(
        load_includes(&config.includes).await?,
        load_data(&config.data).await?,
    )
    .map_err(|source| SiteError::Template {
        path: config.includes.clone(),
        source,
    })?;

    for path in walk_files(&config.input).await? {
        if config.is_excluded(&path) || !is_template(&path) {
            continue;
        }
        let relative = path.strip_prefix(&config.input).unwrap_or(&path);
        let name = relative.to_string_lossy().replace('\\', "/");
        let source = fs::read_to_string(&path).await.map_err(io_err(&path))?;
        let html = templates
            .render(&name, &source)
            .map_err(|source| SiteError::Template {
                path: path.clone(),
                source,
            })?;

        let dest = config.output.join(output_path(relative));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(io_err(parent))?;
        }
        fs::write(&dest, html).await.map_err(io_err(&dest))?;
        debug!(from = %path.display(), to = %dest.display(), "rendered template");
        report.rendered.push(dest);
    }

    for rule in &config.passthrough {
        copy_passthrough(rule, &config.output, &mut report).await?;
    }

    info!(
        rendered = report.rendered.len(),
        copied = report.copied.len(),
        output = %config.output.display(),
        "site built"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templates() -> Templates {
        let includes = HashMap::from([
            ("header.njk".to_string(), "<h1>{{ site.title }}</h1>".to_string()),
            (
                "base.njk".to_string(),
                "---\nlayout: shell.njk\nsection: staff\n---\n<main class=\"{{ section }}\">{{ content | safe }}</main>"
                    .to_string(),
            ),
            (
                "shell.njk".to_string(),
                "<title>{{ title }}</title>{{ content | safe }}".to_string(),
            ),
            ("loop.njk".to_string(), "---\nlayout: loop.njk\n---\nx".to_string()),
        ]);
        Templates::new(
            includes,
            json!({ "site": { "title": "Félagsmiðstöð & co", "year": 2025, "pages": ["a", "b"] } }),
        )
        .unwrap()
    }

    #[test]
    fn includes_and_escapes() {
        let html = templates()
            .render("index.njk", "{% include \"header.njk\" %}<p>{{ site.year }}</p>")
            .unwrap();
        assert_eq!(html, "<h1>Félagsmiðstöð &amp; co</h1><p>2025</p>");
    }

    #[test]
    fn safe_filter_and_missing_values() {
        let t = templates();
        assert_eq!(t.render("a.njk", "{{ site.title | safe }}").unwrap(), "Félagsmiðstöð & co");
        assert_eq!(t.render("a.njk", "[{{ nope.nothing }}]").unwrap(), "[]");
        assert_eq!(t.render("a.njk", "a{# note #}b").unwrap(), "ab");
    }

    #[test]
    fn control_flow_and_whitespace_control() {
        let t = templates();
        let source = "{% if site.title %}<ul>{% for p in site.pages %}<li>{{ p }}</li>{% endfor %}</ul>{% endif %}";
        assert_eq!(t.render("a.njk", source).unwrap(), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(
            t.render("a.njk", "<p>  {{- site.year -}}  </p>").unwrap(),
            "<p>2025</p>"
        );
        assert_eq!(
            t.render("a.njk", "{% set n = 3 %}{{ n * 2 }}").unwrap(),
            "6"
        );
    }

    #[test]
    fn front_matter_feeds_context_and_layout_chain() {
        let page = "---\ntitle: Tölfræði\nlayout: base.njk\n---\n<h1>{{ title }}</h1>";
        let html = templates().render("staff/tolfraedi.njk", page).unwrap();
        assert_eq!(
            html,
            "<title>Tölfræði</title><main class=\"staff\"><h1>Tölfræði</h1></main>"
        );
    }

    #[test]
    fn markdown_pages_render_templates_then_html() {
        let html = templates()
            .render("um.md", "# {{ site.year }}\n\nVelkomin *öll*.\n")
            .unwrap();
        assert_eq!(html, "<h1>2025</h1>\n<p>Velkomin <em>öll</em>.</p>\n");
    }

    #[test]
    fn document_without_front_matter_is_untouched() {
        let doc = Document::parse("<p>---</p>").unwrap();
        assert!(doc.data.is_empty());
        assert_eq!(doc.body, "<p>---</p>");

        let empty = Document::parse("---\n---\nbody").unwrap();
        assert!(empty.data.is_empty());
        assert_eq!(empty.body, "body");
    }

    #[test]
    fn template_errors() {
        let t = templates();
        assert!(matches!(t.render("a.njk", "{{ open"), Err(TemplateError::Render(_))));
        match t.render("a.njk", "{% include 'missing.njk' %}") {
            Err(TemplateError::Render(err)) => {
                assert_eq!(err.kind(), minijinja::ErrorKind::TemplateNotFound)
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            t.render("a.njk", "---\nlayout: nope.njk\n---\nx"),
            Err(TemplateError::MissingLayout(name)) if name == "nope.njk"
        ));
        assert!(matches!(
            t.render("a.njk", "---\nlayout: loop.njk\n---\nx"),
            Err(TemplateError::LayoutDepth)
        ));
        assert!(matches!(
            t.render("a.njk", "---\ntitle: x\n<p>"),
            Err(TemplateError::UnterminatedFrontMatter)
        ));
        assert!(matches!(
            t.render("a.njk", "---\n- a\n- b\n---\nx"),
            Err(TemplateError::FrontMatterShape)
        ));
    }

    #[test]
    fn pretty_output_paths() {
        assert_eq!(output_path(Path::new("index.njk")), PathBuf::from("index.html"));
        assert_eq!(
            output_path(Path::new("staff/tolfraedi.njk")),
            PathBuf::from("staff/tolfraedi/index.html")
        );
        assert_eq!(
            output_path(Path::new("staff/index.html")),
            PathBuf::from("staff/index.html")
        );
    }
}
