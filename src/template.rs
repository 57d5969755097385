//! # Path Template Engine
//!
//! Compiles OpenAPI path templates such as `/pets/{petId}` into a form that can
//! both *build* concrete paths from positional values (client side) and *match*
//! concrete paths back to named parameters (server side).
//!
//! Matching is segment-wise: the concrete path and the template must have the
//! same number of `/`-separated segments, literal segments must be equal, and
//! variable segments capture non-empty text. A segment may hold several
//! placeholders (`/files/{name}.{ext}`); those segments are matched with a
//! small anchored regex compiled once.
//!
//! ```rust
//! use oasbind::template::PathTemplate;
//!
//! let tpl = PathTemplate::compile("/pets/{petId}");
//! assert_eq!(tpl.build(&["42"]).unwrap(), "/pets/42");
//!
//! let params = tpl.matches("/pets/42").unwrap();
//! assert_eq!(params["petId"], "42");
//! assert!(tpl.matches("/pets/42/tags").is_none());
//! ```

use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Named values recovered from a concrete path.
pub type PathParams = HashMap<String, String>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("Failed to compile placeholder regex"));

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Variable(String),
    /// Literal text and placeholders sharing one segment.
    Mixed {
        pattern: Regex,
        names: Vec<String>,
    },
}

/// Compiled form of an operation's path string.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    segments: Vec<Segment>,
    /// Distinct variable names in order of first appearance.
    variables: Vec<String>,
}

impl PathTemplate {
    /// Compile a `{name}`-style template.
    ///
    /// Never fails: text that is not a well-formed placeholder is treated as
    /// a literal.
    #[must_use]
    pub fn compile(template: &str) -> Self {
        let mut variables: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(template) {
            let name = caps[1].to_string();
            if !variables.contains(&name) {
                variables.push(name);
            }
        }

        let segments = template.split('/').map(compile_segment).collect();

        Self {
            template: template.to_string(),
            segments,
            variables,
        }
    }

    /// The template text as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Distinct variable names, in the order they first appear.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Substitute positional values into the template.
    ///
    /// `values` must contain exactly one entry per distinct variable. Repeated
    /// placeholders receive the same value. Substitution is literal; escaping
    /// is left to the transport.
    ///
    /// # Errors
    ///
    /// [`TemplateError::ArityMismatch`] when the number of values differs from
    /// the number of variables.
    pub fn build<S: AsRef<str>>(&self, values: &[S]) -> Result<String, TemplateError> {
        if values.len() != self.variables.len() {
            return Err(TemplateError::ArityMismatch {
                expected: self.variables.clone(),
                given: values.len(),
            });
        }
        let bound: HashMap<&str, &str> = self
            .variables
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(AsRef::as_ref))
            .collect();

        Ok(PLACEHOLDER
            .replace_all(&self.template, |caps: &regex::Captures<'_>| {
                bound
                    .get(&caps[1])
                    .map(|v| (*v).to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned())
    }

    /// Recover named parameters from a concrete path.
    ///
    /// Returns `None` when segment counts differ, a literal segment differs, a
    /// variable would capture an empty value, or a repeated variable captures
    /// different values. Captured values are percent-decoded.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::with_capacity(self.variables.len());
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    bind(&mut params, name, part)?;
                }
                Segment::Mixed { pattern, names } => {
                    let caps = pattern.captures(part)?;
                    for (i, name) in names.iter().enumerate() {
                        let value = caps.get(i + 1)?.as_str();
                        bind(&mut params, name, value)?;
                    }
                }
            }
        }
        Some(params)
    }

    /// This template prefixed by a server base path (`/v1` + `/pets` → `/v1/pets`).
    #[must_use]
    pub fn with_prefix(&self, base_path: &str) -> Self {
        let base = base_path.trim_end_matches('/');
        if base.is_empty() {
            return self.clone();
        }
        Self::compile(&format!("{base}{}", self.template))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn compile_segment(segment: &str) -> Segment {
    let placeholders: Vec<regex::Captures<'_>> = PLACEHOLDER.captures_iter(segment).collect();
    if placeholders.is_empty() {
        return Segment::Literal(segment.to_string());
    }
    if placeholders.len() == 1 && placeholders[0][0].len() == segment.len() {
        return Segment::Variable(placeholders[0][1].to_string());
    }

    let mut pattern = String::with_capacity(segment.len() + 8);
    pattern.push('^');
    let mut names = Vec::with_capacity(placeholders.len());
    let mut last = 0;
    for caps in &placeholders {
        let Some(whole) = caps.get(0) else { continue };
        pattern.push_str(&regex::escape(&segment[last..whole.start()]));
        pattern.push_str("(.+?)");
        names.push(caps[1].to_string());
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&segment[last..]));
    pattern.push('$');

    match Regex::new(&pattern) {
        Ok(pattern) => Segment::Mixed { pattern, names },
        Err(_) => Segment::Literal(segment.to_string()),
    }
}

fn bind(params: &mut PathParams, name: &str, raw: &str) -> Option<()> {
    let value = urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    match params.get(name) {
        Some(existing) if *existing != value => None,
        Some(_) => Some(()),
        None => {
            params.insert(name.to_string(), value);
            Some(())
        }
    }
}
