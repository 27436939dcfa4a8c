//! Rendering bundles into dispatcher source text.

use std::fs;
use std::path::Path;

use minijinja::Environment;
use serde::Serialize;

use crate::domain::errors::BundlesError;
use crate::domain::model::{Action, Bundle};

/// Name of the built-in Rust dispatcher template.
pub const DEFAULT_TEMPLATE: &str = "dispatcher";

/// Ordered `(label, [(action, value)])` records handed to the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchProgram {
    /// File name of the source the program was compiled from.
    pub source: String,
    pub cases: Vec<DispatchCase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchCase {
    pub label: String,
    pub calls: Vec<DispatchCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchCall {
    pub action: Action,
    pub value: String,
}

impl DispatchProgram {
    /// Lower bundles into dispatch cases, preserving source order.
    pub fn lower(source: impl Into<String>, bundles: Vec<Bundle>) -> Self {
        let cases = bundles
            .into_iter()
            .map(|bundle| DispatchCase {
                label: bundle.label,
                calls: bundle
                    .items
                    .into_iter()
                    .map(|item| DispatchCall {
                        action: item.action,
                        value: item.value,
                    })
                    .collect(),
            })
            .collect();
        Self {
            source: source.into(),
            cases,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Renders [`DispatchProgram`]s through built-in or user supplied templates.
#[derive(Debug)]
pub struct Generator {
    env: Environment<'static>,
}

impl Generator {
    /// Create a generator with the built-in templates loaded.
    pub fn new() -> Result<Self, BundlesError> {
        Ok(Self {
            env: default_environment()?,
        })
    }

    /// Render `program` with a built-in template name or a template file path.
    pub fn render(
        &self,
        program: &DispatchProgram,
        template_name: &str,
    ) -> Result<String, BundlesError> {
        let mut rendered = self.render_with_template(program, template_name)?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        tracing::debug!(
            template = template_name,
            cases = program.cases.len(),
            bytes = rendered.len(),
            "rendered dispatcher"
        );
        Ok(rendered)
    }

    fn render_with_template(
        &self,
        program: &DispatchProgram,
        template_name: &str,
    ) -> Result<String, BundlesError> {
        if let Ok(template) = self.env.get_template(template_name) {
            return template.render(program).map_err(|err| {
                template_error(format!("failed to render template '{template_name}': {err}"))
            });
        }

        let template_path = Path::new(template_name);
        if template_path.exists() {
            let source = fs::read_to_string(template_path).map_err(|err| {
                template_error(format!(
                    "failed to load template from path {}: {err}",
                    template_path.display()
                ))
            })?;
            let mut env = Environment::new();
            configure(&mut env);
            env.add_template("external", &source)
                .map_err(|err| template_error(format!("invalid template '{template_name}': {err}")))?;
            let template = env
                .get_template("external")
                .map_err(|err| template_error(err.to_string()))?;
            return template.render(program).map_err(|err| {
                template_error(format!("failed to render template '{template_name}': {err}"))
            });
        }

        Err(template_error(format!(
            "template '{template_name}' not found (built-in or filesystem)"
        )))
    }
}

fn template_error(message: String) -> BundlesError {
    BundlesError::Template { message }
}

fn configure(env: &mut Environment<'_>) {
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("literal", literal);
}

fn default_environment() -> Result<Environment<'static>, BundlesError> {
    let mut env = Environment::new();
    configure(&mut env);
    env.add_template(DEFAULT_TEMPLATE, DISPATCHER_TEMPLATE)
        .map_err(|err| {
            template_error(format!("failed to register dispatcher template: {err}"))
        })?;
    Ok(env)
}

/// Quote a value as a string literal with every special character escaped.
fn literal(value: String) -> String {
    format!("{value:?}")
}

const DISPATCHER_TEMPLATE: &str = r#"// Generated by bundles from {{ source | literal }}. Do not edit.

use std::env;
use std::path::{self, Path};
use std::process::Command;

fn main() {
    let label = env::args().nth(1).unwrap_or_default();
    match label.as_str() {
{% for case in cases %}
        {{ case.label | literal }} => {
{% for call in case.calls %}
            launch({{ call.action | literal }}, {{ call.value | literal }});
{% endfor %}
        }
{% endfor %}
        _ => println!("Bundle does not exist."),
    }
}

fn launch(action: &str, value: &str) {
    let launched = match action {
        "app" | "file" => open(&absolute(value)),
        "url" => open(value),
        "shell" => shell(value),
        _ => Ok(()),
    };
    if launched.is_err() {
        println!("Unable to launch {value}");
    }
}

fn absolute(value: &str) -> String {
    path::absolute(Path::new(value))
        .map(|resolved| resolved.display().to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn shell(value: &str) -> std::io::Result<()> {
    println!("$ {value}");
    let mut parts = value.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(());
    };
    let output = Command::new(program).args(parts).output()?;
    println!("{}", String::from_utf8_lossy(&output.stdout));
    Ok(())
}

#[cfg(target_os = "windows")]
fn open(target: &str) -> std::io::Result<()> {
    Command::new("cmd").args(["/C", "start", "", target]).spawn().map(|_| ())
}

#[cfg(target_os = "macos")]
fn open(target: &str) -> std::io::Result<()> {
    Command::new("open").arg(target).spawn().map(|_| ())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn open(target: &str) -> std::io::Result<()> {
    Command::new("xdg-open").arg(target).spawn().map(|_| ())
}
"#;
