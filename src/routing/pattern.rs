//! Path template compilation and matching.
//!
//! # Responsibilities
//! - Compile a route template into an anchored regex
//! - Match request paths and extract named captures
//!
//! # Template Grammar
//! - `:name` captures one path segment (`[^/]+`)
//! - `:name+` captures greedily across segments (`.+`)
//! - `:name` with a condition captures whatever the condition regex accepts
//! - `( … )` marks an optional group
//! - everything else is literal text
//!
//! # Design Decisions
//! - Compiled once at bind time, never on the request path
//! - Literal text is escaped, so `.` in a template only matches a dot
//! - A miss is `None`, never an error

use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Errors raised while compiling a route template.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("unbalanced `{symbol}` at byte {position} in route `{template}`")]
    Unbalanced {
        template: String,
        symbol: char,
        position: usize,
    },

    #[error("parameter `{name}` appears twice in route `{template}`")]
    DuplicateParam { template: String, name: String },

    #[error("condition for `{name}` is not a valid regex: {source}")]
    InvalidCondition {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("route `{template}` did not compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// A route template compiled into an anchored regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

impl CompiledPattern {
    /// Compile `template`, using `conditions` to constrain named parameters.
    pub fn compile(
        template: &str,
        conditions: &HashMap<String, String>,
    ) -> Result<Self, PatternError> {
        for (name, condition) in conditions {
            Regex::new(condition).map_err(|source| PatternError::InvalidCondition {
                name: name.clone(),
                source,
            })?;
        }

        let mut source = String::with_capacity(template.len() * 2 + 2);
        let mut literal = String::new();
        let mut params = Vec::new();
        let mut seen = HashSet::new();
        let mut open_groups = Vec::new();

        source.push('^');
        let mut chars = template.char_indices().peekable();
        while let Some((position, c)) = chars.next() {
            match c {
                '(' => {
                    flush_literal(&mut source, &mut literal);
                    open_groups.push(position);
                    source.push_str("(?:");
                }
                ')' => {
                    flush_literal(&mut source, &mut literal);
                    if open_groups.pop().is_none() {
                        return Err(PatternError::Unbalanced {
                            template: template.to_string(),
                            symbol: ')',
                            position,
                        });
                    }
                    source.push_str(")?");
                }
                ':' if chars.peek().is_some_and(|&(_, n)| is_name_start(n)) => {
                    flush_literal(&mut source, &mut literal);

                    let mut name = String::new();
                    while let Some(&(_, n)) = chars.peek() {
                        if !is_name_char(n) {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    let greedy = chars.next_if(|&(_, n)| n == '+').is_some();

                    if !seen.insert(name.clone()) {
                        return Err(PatternError::DuplicateParam {
                            template: template.to_string(),
                            name,
                        });
                    }

                    let body = match conditions.get(&name) {
                        Some(condition) => condition.as_str(),
                        None if greedy => ".+",
                        None => "[^/]+",
                    };
                    source.push_str(&format!("(?P<{name}>{body})"));
                    params.push(name);
                }
                _ => literal.push(c),
            }
        }
        flush_literal(&mut source, &mut literal);

        if let Some(position) = open_groups.pop() {
            return Err(PatternError::Unbalanced {
                template: template.to_string(),
                symbol: '(',
                position,
            });
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| PatternError::Regex {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            params,
        })
    }

    /// Match a request path, returning the captured parameters on success.
    ///
    /// Parameters inside an optional group that did not participate in the
    /// match are absent from the map.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of the parameters, in template order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The generated regex source, useful for diagnostics.
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }
}

fn flush_literal(source: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        source.push_str(&regex::escape(literal));
        literal.clear();
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(template: &str) -> CompiledPattern {
        CompiledPattern::compile(template, &HashMap::new()).unwrap()
    }

    #[test]
    fn test_single_segment_capture() {
        let p = compile("user/:id");
        let params = p.matches("user/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        assert!(p.matches("user/42/edit").is_none());
        assert!(p.matches("user/").is_none());
    }

    #[test]
    fn test_greedy_capture() {
        let p = compile("files/:path+");
        let params = p.matches("files/a/b/c").unwrap();
        assert_eq!(params.get("path").map(String::as_str), Some("a/b/c"));
        assert!(p.matches("files/").is_none());
    }

    #[test]
    fn test_optional_group() {
        let p = compile("post(/:id)");
        assert_eq!(p.as_regex(), "^post(?:/(?P<id>[^/]+))?$");

        let bare = p.matches("post").unwrap();
        assert!(!bare.contains_key("id"));

        let with_id = p.matches("post/5").unwrap();
        assert_eq!(with_id.get("id").map(String::as_str), Some("5"));

        assert!(p.matches("posts").is_none());
    }

    #[test]
    fn test_condition_overrides_segment_rule() {
        let mut conditions = HashMap::new();
        conditions.insert("id".to_string(), r"\d+".to_string());
        let p = CompiledPattern::compile("user/:id", &conditions).unwrap();

        assert!(p.matches("user/42").is_some());
        assert!(p.matches("user/bob").is_none());
    }

    #[test]
    fn test_literals_are_escaped() {
        let p = compile("feed.xml");
        assert!(p.matches("feed.xml").is_some());
        assert!(p.matches("feedxxml").is_none());
    }

    #[test]
    fn test_anchored_full_match() {
        let p = compile("about");
        assert!(p.matches("about").is_some());
        assert!(p.matches("about/us").is_none());
        assert!(p.matches("the/about").is_none());
    }

    #[test]
    fn test_utf8_paths() {
        let p = compile("tag/:name");
        let params = p.matches("tag/blåbær").unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("blåbær"));
    }

    #[test]
    fn test_bare_colon_is_literal() {
        let p = compile("time/12:30");
        assert!(p.params().is_empty());
        assert!(p.matches("time/12:30").is_some());
    }

    #[test]
    fn test_compile_errors() {
        let none = HashMap::new();
        assert!(matches!(
            CompiledPattern::compile("post(/:id", &none),
            Err(PatternError::Unbalanced { symbol: '(', .. })
        ));
        assert!(matches!(
            CompiledPattern::compile("post/:id)", &none),
            Err(PatternError::Unbalanced { symbol: ')', .. })
        ));
        assert!(matches!(
            CompiledPattern::compile(":a/:a", &none),
            Err(PatternError::DuplicateParam { .. })
        ));

        let mut bad = HashMap::new();
        bad.insert("id".to_string(), "(".to_string());
        assert!(matches!(
            CompiledPattern::compile("user/:id", &bad),
            Err(PatternError::InvalidCondition { .. })
        ));
    }
}
