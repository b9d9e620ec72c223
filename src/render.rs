//! Template rendering
//!
//! Syntax:
//!
//! - `{{name}}` substitutes a variable; an unknown name is an error
//! - `{{#name}}...{{/name}}` emits its body when `name` is set, non-empty and
//!   not `false`
//! - `{{^name}}...{{/name}}` emits its body otherwise
//!
//! A section tag alone on its line takes the line ending with it.

use declarative::Variables;
use regex::Regex;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([#^/]?)\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid tag regex")
});

/// Built-in templates, keyed by source name
const BUILTIN: &[(&str, &str)] = &[
    (
        "supervisord.conf",
        include_str!("../templates/supervisord.conf.tmpl"),
    ),
    (
        "debian/supervisor.default",
        include_str!("../templates/debian/supervisor.default.tmpl"),
    ),
    (
        "debian/supervisor.init",
        include_str!("../templates/debian/supervisor.init.tmpl"),
    ),
    (
        "rhel/supervisor.init",
        include_str!("../templates/rhel/supervisor.init.tmpl"),
    ),
    ("manifest.xml", include_str!("../templates/manifest.xml.tmpl")),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("line {line}: unknown variable {name}")]
    UnknownVariable { name: String, line: usize },

    #[error("line {line}: {{{{/{name}}}}} does not close the open section")]
    UnbalancedSection {
        name: String,
        open: Option<String>,
        line: usize,
    },

    #[error("section {name} opened on line {line} is never closed")]
    UnclosedSection { name: String, line: usize },

    #[error("unknown template {0}")]
    UnknownTemplate(String),

    #[error("could not read template {path}: {message}")]
    Read { path: PathBuf, message: String },
}

struct Section<'a> {
    name: &'a str,
    line: usize,
    /// Whether output is emitted inside this section
    active: bool,
}

fn truthy(variables: &Variables, name: &str) -> bool {
    variables
        .get(name)
        .is_some_and(|v| !v.is_empty() && v != "false")
}

fn line_of(template: &str, offset: usize) -> usize {
    template[..offset].matches('\n').count() + 1
}

/// Render template text with variables
pub fn render(template: &str, variables: &Variables) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut stack: Vec<Section<'_>> = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(template) {
        let (Some(tag), Some(sigil), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let active = stack.last().is_none_or(|s| s.active);
        if active {
            out.push_str(&template[last..tag.start()]);
        }
        last = tag.end();

        let name = name.as_str();
        let line = line_of(template, tag.start());

        if sigil.as_str().is_empty() {
            if active {
                let value = variables
                    .get(name)
                    .ok_or_else(|| RenderError::UnknownVariable {
                        name: name.to_string(),
                        line,
                    })?;
                out.push_str(value);
            }
            continue;
        }

        match sigil.as_str() {
            "#" | "^" => {
                let wanted = sigil.as_str() == "#";
                stack.push(Section {
                    name,
                    line,
                    active: active && truthy(variables, name) == wanted,
                });
            }
            _ => match stack.pop() {
                Some(open) if open.name == name => {}
                other => {
                    return Err(RenderError::UnbalancedSection {
                        name: name.to_string(),
                        open: other.map(|s| s.name.to_string()),
                        line,
                    });
                }
            },
        }

        // standalone section tags swallow their line ending
        let at_line_start = template[..tag.start()]
            .rsplit('\n')
            .next()
            .is_some_and(|prefix| prefix.trim().is_empty());
        if at_line_start {
            let rest = &template[last..];
            let trailing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
            if rest[trailing..].starts_with('\n') {
                if active {
                    // drop indentation already emitted before the tag
                    let kept = out.trim_end_matches([' ', '\t']).len();
                    out.truncate(kept);
                }
                last += trailing + 1;
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(RenderError::UnclosedSection {
            name: open.name.to_string(),
            line: open.line,
        });
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Template lookup: built-ins, optionally overridden from a directory
#[derive(Debug, Clone, Default)]
pub struct Templates {
    dir: Option<PathBuf>,
}

impl Templates {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Names of the built-in templates
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(name, _)| *name)
    }

    fn override_path(&self, name: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}.tmpl")))
            .filter(|path| path.is_file())
    }

    /// Template text for a source name
    pub fn source(&self, name: &str) -> Result<Cow<'static, str>, RenderError> {
        if let Some(path) = self.override_path(name) {
            log::debug!("using template override {}", path.display());
            return read(&path).map(Cow::Owned);
        }

        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, text)| Cow::Borrowed(*text))
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))
    }

    /// Render a named template
    pub fn render(&self, name: &str, variables: &Variables) -> Result<String, RenderError> {
        render(&self.source(name)?, variables)
    }
}

fn read(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|e| RenderError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitution() {
        let out = render("port={{ inet_port }}\n", &vars(&[("inet_port", "9001")])).unwrap();
        assert_eq!(out, "port=9001\n");
    }

    #[test]
    fn test_unknown_variable_is_error() {
        let err = render("a\n{{nope}}\n", &Variables::new()).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownVariable {
                name: "nope".into(),
                line: 2
            }
        );
    }

    #[test]
    fn test_sections_and_standalone_lines() {
        let template = "\
[supervisord]
{{#inet_port}}
[inet_http_server]
port=*:{{inet_port}}
{{/inet_port}}
{{^inet_port}}
; http server disabled
{{/inet_port}}
minfds={{minfds}}
";
        let on = render(template, &vars(&[("inet_port", "9001"), ("minfds", "1024")])).unwrap();
        assert_eq!(
            on,
            "[supervisord]\n[inet_http_server]\nport=*:9001\nminfds=1024\n"
        );

        let off = render(template, &vars(&[("minfds", "1024")])).unwrap();
        assert_eq!(off, "[supervisord]\n; http server disabled\nminfds=1024\n");
    }

    #[test]
    fn test_unknown_variable_in_skipped_section_is_fine() {
        let out = render("{{#user}}username={{user}}{{/user}}x", &Variables::new()).unwrap();
        assert_eq!(out, "x");
    }

    #[test]
    fn test_false_is_falsy() {
        let out = render("{{#flag}}yes{{/flag}}{{^flag}}no{{/flag}}", &vars(&[("flag", "false")])).unwrap();
        assert_eq!(out, "no");
    }

    #[test]
    fn test_unbalanced_sections() {
        assert!(matches!(
            render("{{#a}}x{{/b}}", &Variables::new()),
            Err(RenderError::UnbalancedSection { .. })
        ));
        assert!(matches!(
            render("x{{/a}}", &Variables::new()),
            Err(RenderError::UnbalancedSection { open: None, .. })
        ));
        assert_eq!(
            render("\n{{#a}}x", &Variables::new()),
            Err(RenderError::UnclosedSection {
                name: "a".into(),
                line: 2
            })
        );
    }

    #[test]
    fn test_builtin_templates_render_with_recipe_variables() {
        let templates = Templates::default();
        let variables = vars(&[
            ("inet_port", "9001"),
            ("inet_username", "admin"),
            ("inet_password", "secret"),
            ("supervisord_minfds", "1024"),
            ("supervisord_minprocs", "200"),
            ("supervisor_version", "3.0"),
            ("log_dir", "/var/log/supervisor"),
            ("include_dir", "/etc/supervisor.d"),
            ("supervisord", "/usr/bin/supervisord"),
            ("conffile", "/etc/supervisord.conf"),
        ]);
        for name in Templates::builtin_names() {
            let out = templates.render(name, &variables);
            assert!(out.is_ok(), "{name}: {out:?}");
        }

        let conf = templates.render("supervisord.conf", &variables).unwrap();
        assert!(conf.contains("port=*:9001"));
        assert!(conf.contains("minfds=1024"));
    }

    #[test]
    fn test_template_dir_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("debian")).unwrap();
        fs::write(dir.path().join("debian/supervisor.default.tmpl"), "OVERRIDE\n").unwrap();

        let templates = Templates::new(Some(dir.path().to_path_buf()));
        assert_eq!(
            templates.render("debian/supervisor.default", &Variables::new()).unwrap(),
            "OVERRIDE\n"
        );
        // names without an override fall back to the built-in
        assert!(templates.source("manifest.xml").is_ok());
    }

    #[test]
    fn test_unknown_template() {
        assert_eq!(
            Templates::default().source("nginx.conf"),
            Err(RenderError::UnknownTemplate("nginx.conf".into()))
        );
    }
}
