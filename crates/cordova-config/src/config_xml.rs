//! The `config.xml` project manifest
//!
//! The document is kept as source text. Reads come from an index of element
//! spans built with `quick-xml`; edits splice text in or out and rebuild the
//! index, so comments, attribute order and whitespace outside the edited
//! elements are left exactly as they were.

use std::ops::Range;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::format::TextStyle;
use crate::package::Variables;

/// An `<engine name spec>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDecl {
    pub name: String,
    pub spec: Option<String>,
}

/// A `<plugin name spec>` declaration with its `<variable>` children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDecl {
    pub name: String,
    pub spec: Option<String>,
    pub variables: Variables,
}

impl PluginDecl {
    pub fn new(name: impl Into<String>, spec: Option<String>, variables: Variables) -> Self {
        Self {
            name: name.into(),
            spec,
            variables,
        }
    }
}

/// A `<hook type src>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDecl {
    pub event: String,
    pub src: String,
}

#[derive(Debug, Clone)]
struct Located<T> {
    value: T,
    span: Range<usize>,
}

#[derive(Debug, Clone, Default)]
struct Index {
    id: Option<String>,
    version: Option<String>,
    name: Option<String>,
    engines: Vec<Located<EngineDecl>>,
    plugins: Vec<Located<PluginDecl>>,
    hooks: Vec<HookDecl>,
    /// Offset of the `</widget>` tag
    root_close: Option<usize>,
    /// Span of a self-closing `<widget/>`
    root_empty: Option<Range<usize>>,
}

enum OpenChild {
    Engine(EngineDecl, usize),
    Plugin(PluginDecl, usize),
    Name,
}

/// Manifest document with format-preserving edits
#[derive(Debug, Clone)]
pub struct ConfigParser {
    path: PathBuf,
    source: String,
    saved: String,
    style: TextStyle,
    index: Index,
}

impl ConfigParser {
    pub const FILE_NAME: &'static str = "config.xml";

    pub fn load(path: &Path) -> Result<Self> {
        let source = cordova_fs::read_text(path)?;
        Self::parse(path, &source)
    }

    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let index = scan(path, source)?;
        Ok(Self {
            path: path.to_path_buf(),
            source: source.to_string(),
            saved: source.to_string(),
            style: TextStyle::detect(source, "    "),
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Widget `id` attribute (the package name)
    pub fn id(&self) -> Option<&str> {
        self.index.id.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.index.version.as_deref()
    }

    /// Text of the `<name>` element
    pub fn name(&self) -> Option<&str> {
        self.index.name.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.source != self.saved
    }

    /// Top-level `<engine>` declarations in document order.
    pub fn engines(&self) -> Vec<EngineDecl> {
        self.index.engines.iter().map(|e| e.value.clone()).collect()
    }

    /// Append an `<engine>` element. Existing entries are left alone.
    pub fn add_engine(&mut self, name: &str, spec: Option<&str>) -> Result<()> {
        let mut element = format!("<engine name=\"{}\"", escape(name));
        if let Some(spec) = spec {
            element.push_str(&format!(" spec=\"{}\"", escape(spec)));
        }
        element.push_str(" />");
        self.insert_child(&element)
    }

    /// Remove every `<engine>` named `name`.
    pub fn remove_engine(&mut self, name: &str) -> Result<bool> {
        let spans: Vec<_> = self
            .index
            .engines
            .iter()
            .filter(|e| e.value.name == name)
            .map(|e| e.span.clone())
            .collect();
        self.remove_spans(spans)
    }

    /// Top-level `<plugin>` declarations in document order.
    pub fn plugins(&self) -> Vec<PluginDecl> {
        self.index.plugins.iter().map(|p| p.value.clone()).collect()
    }

    pub fn plugin(&self, name: &str) -> Option<PluginDecl> {
        self.index
            .plugins
            .iter()
            .find(|p| p.value.name == name)
            .map(|p| p.value.clone())
    }

    /// Append a `<plugin>` element with one `<variable>` child per variable.
    pub fn add_plugin(&mut self, plugin: &PluginDecl) -> Result<()> {
        let mut element = format!("<plugin name=\"{}\"", escape(plugin.name.as_str()));
        if let Some(spec) = &plugin.spec {
            element.push_str(&format!(" spec=\"{}\"", escape(spec.as_str())));
        }
        if plugin.variables.is_empty() {
            element.push_str(" />");
        } else {
            let nl = self.style.newline.as_str();
            let indent = &self.style.indent;
            element.push('>');
            for (name, value) in &plugin.variables {
                element.push_str(&format!(
                    "{nl}{indent}{indent}<variable name=\"{}\" value=\"{}\" />",
                    escape(name.as_str()),
                    escape(value.as_str())
                ));
            }
            element.push_str(&format!("{nl}{indent}</plugin>"));
        }
        self.insert_child(&element)
    }

    /// Remove every `<plugin>` named `name`.
    pub fn remove_plugin(&mut self, name: &str) -> Result<bool> {
        let spans: Vec<_> = self
            .index
            .plugins
            .iter()
            .filter(|p| p.value.name == name)
            .map(|p| p.span.clone())
            .collect();
        self.remove_spans(spans)
    }

    /// `<hook>` declarations for `event`, in document order.
    pub fn hooks(&self, event: &str) -> Vec<HookDecl> {
        self.index
            .hooks
            .iter()
            .filter(|h| h.event == event)
            .cloned()
            .collect()
    }

    /// Write the document if it changed since it was loaded or last written.
    pub fn write(&mut self) -> Result<bool> {
        if !self.is_modified() {
            return Ok(false);
        }
        let written = cordova_fs::write_if_changed(&self.path, &self.source)?;
        self.saved = self.source.clone();
        if written {
            tracing::debug!(path = %self.path.display(), "saved config.xml");
        }
        Ok(written)
    }

    fn insert_child(&mut self, element: &str) -> Result<()> {
        let nl = self.style.newline.as_str();
        let indent = self.style.indent.clone();

        if let Some(close) = self.index.root_close {
            let line_start = line_start(&self.source, close);
            if self.source[line_start..close].trim().is_empty() {
                self.source
                    .insert_str(line_start, &format!("{indent}{element}{nl}"));
            } else {
                self.source
                    .insert_str(close, &format!("{nl}{indent}{element}{nl}"));
            }
        } else if let Some(span) = self.index.root_empty.clone() {
            let open = self.source[span.clone()]
                .trim_end_matches("/>")
                .trim_end()
                .to_string();
            self.source.replace_range(
                span,
                &format!("{open}>{nl}{indent}{element}{nl}</widget>"),
            );
        } else {
            return Err(Error::MissingRoot {
                path: self.path.clone(),
                element: "widget",
            });
        }
        self.reindex()
    }

    fn remove_spans(&mut self, mut spans: Vec<Range<usize>>) -> Result<bool> {
        if spans.is_empty() {
            return Ok(false);
        }
        spans.sort_by_key(|s| s.start);
        for span in spans.into_iter().rev() {
            let extent = whole_line_extent(&self.source, span);
            self.source.replace_range(extent, "");
        }
        self.reindex()?;
        Ok(true)
    }

    fn reindex(&mut self) -> Result<()> {
        self.index = scan(&self.path, &self.source)?;
        Ok(())
    }
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Widen `span` to its full line(s) when nothing else shares them.
fn whole_line_extent(source: &str, span: Range<usize>) -> Range<usize> {
    let start = line_start(source, span.start);
    let end = source[span.end..]
        .find('\n')
        .map_or(source.len(), |i| span.end + i + 1);
    if source[start..span.start].trim().is_empty() && source[span.end..end].trim().is_empty() {
        start..end
    } else {
        span
    }
}

fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn scan(path: &Path, source: &str) -> Result<Index> {
    let mut reader = Reader::from_str(source);
    let mut index = Index::default();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut open: Option<OpenChild> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| Error::parse("XML", path, e))?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                match depth {
                    1 => {
                        read_root(&e, &mut index);
                        saw_root = true;
                    }
                    2 => match local.as_ref() {
                        b"engine" => {
                            open = engine_decl(&e).map(|decl| OpenChild::Engine(decl, start));
                        }
                        b"plugin" => {
                            open = plugin_decl(&e).map(|decl| OpenChild::Plugin(decl, start));
                        }
                        b"name" => open = Some(OpenChild::Name),
                        b"hook" => index.hooks.extend(hook_decl(&e)),
                        _ => {}
                    },
                    3 => {
                        if let Some(OpenChild::Plugin(plugin, _)) = &mut open
                            && local.as_ref() == b"variable"
                        {
                            add_variable(&e, plugin);
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let local = e.local_name();
                match depth + 1 {
                    1 => {
                        read_root(&e, &mut index);
                        index.root_empty = Some(start..end);
                        saw_root = true;
                    }
                    2 => match local.as_ref() {
                        b"engine" => {
                            if let Some(value) = engine_decl(&e) {
                                index.engines.push(Located {
                                    value,
                                    span: start..end,
                                });
                            }
                        }
                        b"plugin" => {
                            if let Some(value) = plugin_decl(&e) {
                                index.plugins.push(Located {
                                    value,
                                    span: start..end,
                                });
                            }
                        }
                        b"hook" => index.hooks.extend(hook_decl(&e)),
                        _ => {}
                    },
                    3 => {
                        if let Some(OpenChild::Plugin(plugin, _)) = &mut open
                            && local.as_ref() == b"variable"
                        {
                            add_variable(&e, plugin);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if depth == 2
                    && let Some(OpenChild::Name) = open
                {
                    let value = text.unescape().map_err(|e| Error::parse("XML", path, e))?;
                    index.name = Some(value.trim().to_string());
                }
            }
            Event::End(_) => {
                match depth {
                    1 => index.root_close = Some(start),
                    2 => match open.take() {
                        Some(OpenChild::Engine(value, from)) => index.engines.push(Located {
                            value,
                            span: from..end,
                        }),
                        Some(OpenChild::Plugin(value, from)) => index.plugins.push(Located {
                            value,
                            span: from..end,
                        }),
                        Some(OpenChild::Name) | None => {}
                    },
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::MissingRoot {
            path: path.to_path_buf(),
            element: "widget",
        });
    }
    Ok(index)
}

fn read_root(element: &BytesStart<'_>, index: &mut Index) {
    index.id = attr(element, "id");
    index.version = attr(element, "version");
}

fn engine_decl(element: &BytesStart<'_>) -> Option<EngineDecl> {
    Some(EngineDecl {
        name: attr(element, "name")?,
        spec: attr(element, "spec"),
    })
}

fn plugin_decl(element: &BytesStart<'_>) -> Option<PluginDecl> {
    let name = attr(element, "name").or_else(|| attr(element, "id"))?;
    Some(PluginDecl::new(name, attr(element, "spec"), Variables::new()))
}

fn hook_decl(element: &BytesStart<'_>) -> Option<HookDecl> {
    Some(HookDecl {
        event: attr(element, "type")?,
        src: attr(element, "src")?,
    })
}

fn add_variable(element: &BytesStart<'_>, plugin: &mut PluginDecl) {
    if let Some(name) = attr(element, "name") {
        let value = attr(element, "value").unwrap_or_default();
        plugin.variables.insert(name, value);
    }
}
