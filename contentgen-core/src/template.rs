//! `{name}` placeholder substitution for user instruction templates.
//!
//! Syntax follows standard string formatting: `{name}` is replaced by the
//! value supplied for `name`, `{{` and `}}` produce literal braces. A format
//! spec or conversion after the name (`{name:>10}`, `{name!r}`) is accepted
//! and ignored. Every placeholder must be satisfiable; supplied values that
//! no placeholder uses are ignored.

use thiserror::Error;

/// Placeholder every user instruction template receives.
pub const INPUT_TEXT_KEY: &str = "input_text";

/// Substitution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template references a key no value was supplied for.
    #[error("missing substitution for placeholder '{{{0}}}'")]
    MissingKey(String),

    /// A `{` without a matching `}`.
    #[error("single '{{' encountered at byte {0}")]
    UnmatchedOpen(usize),

    /// A `}` that closes nothing.
    #[error("single '}}' encountered at byte {0}")]
    UnmatchedClose(usize),

    /// `{}` with no field name; positional arguments are never supplied.
    #[error("positional placeholder at byte {0} has no value")]
    Positional(usize),
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let bytes = template.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                if bytes.get(i + 1) == Some(&b'{') {
                    segments.push(Segment::Literal(&template[i..=i]));
                    i += 2;
                } else {
                    let rest = &template[i + 1..];
                    let close = rest.find('}').ok_or(TemplateError::UnmatchedOpen(i))?;
                    let field = &rest[..close];
                    if field.contains('{') {
                        return Err(TemplateError::UnmatchedOpen(i));
                    }
                    let name = field.split([':', '!']).next().unwrap_or_default();
                    if name.is_empty() {
                        return Err(TemplateError::Positional(i));
                    }
                    segments.push(Segment::Field(name));
                    i += close + 2;
                }
                literal_start = i;
            }
            b'}' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                if bytes.get(i + 1) == Some(&b'}') {
                    segments.push(Segment::Literal(&template[i..=i]));
                    i += 2;
                    literal_start = i;
                } else {
                    return Err(TemplateError::UnmatchedClose(i));
                }
            }
            _ => i += 1,
        }
    }

    if literal_start < bytes.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    Ok(segments)
}

/// Placeholder names referenced by `template`, in order of first use.
///
/// # Errors
/// Returns a [`TemplateError`] when the template's braces are malformed.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    let mut names: Vec<&str> = Vec::new();
    for segment in parse(template)? {
        if let Segment::Field(name) = segment {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Render `template`, replacing each `{key}` with its value from `vars`.
///
/// When a key appears more than once in `vars`, the first entry wins.
///
/// # Errors
/// Returns [`TemplateError::MissingKey`] for a placeholder with no value and
/// the other variants for malformed braces.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let segments = parse(template)?;
    let mut out = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(name) => {
                let value = vars
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| TemplateError::MissingKey(name.to_string()))?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Keys in `vars` that `template` never references.
#[must_use]
pub fn unused_keys<'v>(template: &str, vars: &[(&'v str, &str)]) -> Vec<&'v str> {
    let used = placeholders(template).unwrap_or_default();
    vars.iter()
        .map(|(key, _)| *key)
        .filter(|key| !used.contains(key))
        .collect()
}
