//! Pattern compiler: `:name` path templates to anchored matchers and builders.
//!
//! A template such as `/api/projects/:id/members/:member` is split into
//! literal and placeholder tokens once, at construction. The tokens produce
//! two inverse operations:
//!
//! - **Matching** uses a regex anchored at both ends (`^...$`) where every
//!   placeholder becomes `([^/]+)`, so a placeholder always captures exactly
//!   one non-empty path segment. Captures are percent-decoded.
//! - **Building** walks the same tokens and substitutes each placeholder with
//!   the percent-encoded string form of its value.
//!
//! Because the encoder escapes everything outside the RFC 3986 unreserved set
//! (including `/`), `match_path(build(p)) == p` holds for every parameter set
//! whose values are non-empty strings.

use super::{ParamMap, RouteBuildError};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while compiling a path template.
#[derive(Debug, Error)]
pub enum PatternError {
    /// Templates are absolute paths.
    #[error("path template `{template}` must start with `/`")]
    MissingLeadingSlash { template: String },
    /// A `:` was not followed by an identifier.
    #[error("path template `{template}` has an empty placeholder name at byte {position}")]
    EmptyParamName { template: String, position: usize },
    /// Two placeholders with no literal text between them cannot be split.
    #[error("path template `{template}` has adjacent placeholders `:{first}:{second}`")]
    AdjacentParams {
        template: String,
        first: String,
        second: String,
    },
    #[error("path template `{template}` did not compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// A compiled `:name` template.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    tokens: Vec<Token>,
    regex: Regex,
    param_names: Vec<String>,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c != ':' {
            literal.push(c);
            continue;
        }

        let mut name = String::new();
        if let Some(&(_, first)) = chars.peek() {
            if is_name_start(first) {
                while let Some(&(_, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
            }
        }
        if name.is_empty() {
            return Err(PatternError::EmptyParamName {
                template: template.to_string(),
                position,
            });
        }

        if literal.is_empty() {
            if let Some(Token::Param(previous)) = tokens.last() {
                return Err(PatternError::AdjacentParams {
                    template: template.to_string(),
                    first: previous.clone(),
                    second: name,
                });
            }
        } else {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(Token::Param(name));
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Render a single parameter value the way it appears in a URL segment.
fn segment_value(name: &str, value: &Value) -> Result<String, RouteBuildError> {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => {
            return Err(RouteBuildError::MissingParam {
                name: name.to_string(),
            })
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(RouteBuildError::UnsupportedValue {
                name: name.to_string(),
            })
        }
    };
    if rendered.is_empty() {
        return Err(RouteBuildError::EmptyParam {
            name: name.to_string(),
        });
    }
    Ok(rendered)
}

impl CompiledPattern {
    /// Compile a template into its matcher and builder.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        if !template.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                template: template.to_string(),
            });
        }

        let tokens = tokenize(template)?;
        let mut pattern = String::with_capacity(template.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::new();
        for token in &tokens {
            match token {
                Token::Literal(text) => pattern.push_str(&regex::escape(text)),
                Token::Param(name) => {
                    pattern.push_str("([^/]+)");
                    param_names.push(name.clone());
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|source| PatternError::Regex {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            tokens,
            regex,
            param_names,
        })
    }

    /// The raw template this pattern was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in template order (duplicates kept).
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Match a concrete path, returning decoded placeholder values.
    ///
    /// Duplicate placeholder names keep the last captured value. A segment
    /// that does not percent-decode to UTF-8 makes the whole path a
    /// non-match.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamMap> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamMap::new();
        for (index, name) in self.param_names.iter().enumerate() {
            let raw = captures.get(index + 1)?.as_str();
            let decoded = urlencoding::decode(raw).ok()?;
            params.insert(name.clone(), decoded.into_owned());
        }
        Some(params)
    }

    /// Whether `path` matches; agrees with [`CompiledPattern::match_path`].
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }

    /// Substitute placeholders from a JSON object of parameter values.
    pub fn build(&self, params: &Value) -> Result<String, RouteBuildError> {
        let values = params.as_object();
        let mut out = String::with_capacity(self.template.len() + 16);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Param(name) => {
                    let value = values
                        .and_then(|map| map.get(name))
                        .ok_or_else(|| RouteBuildError::MissingParam { name: name.clone() })?;
                    let rendered = segment_value(name, value)?;
                    out.push_str(&urlencoding::encode(&rendered));
                }
            }
        }
        Ok(out)
    }

    /// Render the template with `{name}` placeholders instead of `:name`.
    #[must_use]
    pub fn to_brace_syntax(&self) -> String {
        let mut out = String::with_capacity(self.template.len() + self.param_names.len());
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Param(name) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
        }
        out
    }
}
