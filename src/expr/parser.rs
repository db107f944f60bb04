use super::Expr;
use super::Segment;
use crate::ConfigurationError;

const INTERPOLATION_OPEN: &str = "${!";

fn invalid(
    expr: &str,
    reason: impl Into<String>,
) -> ConfigurationError {
    ConfigurationError::InvalidExpression {
        expr: expr.to_string(),
        reason: reason.into(),
    }
}

pub(super) fn is_template(source: &str) -> bool {
    source.contains(INTERPOLATION_OPEN)
}

/// Splits a template into literal text and `${! expr }` segments.
pub(super) fn parse_template(template: &str) -> std::result::Result<Vec<Segment>, ConfigurationError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(INTERPOLATION_OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }

        let body = &rest[start + INTERPOLATION_OPEN.len()..];
        let end = closing_brace(body).ok_or_else(|| invalid(template, "unterminated interpolation"))?;
        segments.push(Segment::Expr(parse_expr(&body[..end])?));
        rest = &body[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    Ok(segments)
}

/// Position of the `}` closing an interpolation, skipping quoted text.
fn closing_brace(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '}') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parses a value mapping. An optional `root =` assignment is accepted.
pub(super) fn parse_mapping(mapping: &str) -> std::result::Result<Expr, ConfigurationError> {
    let trimmed = mapping.trim();
    let expr = match trimmed.strip_prefix("root") {
        Some(rest) if rest.trim_start().starts_with('=') => {
            let rest = rest.trim_start();
            &rest[1..]
        }
        _ => trimmed,
    };
    parse_expr(expr)
}

pub(super) fn parse_expr(source: &str) -> std::result::Result<Expr, ConfigurationError> {
    let s = source.trim();
    if s.is_empty() {
        return Err(invalid(source, "empty expression"));
    }

    if let Some(literal) = quoted(s) {
        return Ok(Expr::Literal(literal.to_string()));
    }

    if s == "this" {
        return Ok(Expr::Json(Vec::new()));
    }
    if let Some(path) = s.strip_prefix("this.") {
        return Ok(Expr::Json(split_path(source, path)?));
    }

    let (name, args) = call(s).ok_or_else(|| invalid(source, "expected a function call, `this` or a quoted string"))?;
    match (name, args) {
        ("content", None) => Ok(Expr::Content),
        ("meta", Some(arg)) => Ok(Expr::Meta(string_arg(source, arg)?)),
        ("json", None) => Ok(Expr::Json(Vec::new())),
        ("json", Some(arg)) => Ok(Expr::Json(split_path(source, &string_arg(source, arg)?)?)),
        (name, _) => Err(invalid(source, format!("unknown function or bad arguments: {name}"))),
    }
}

/// `name(args)` with at most one argument
fn call(s: &str) -> Option<(&str, Option<&str>)> {
    let open = s.find('(')?;
    let inner = s[open + 1..].strip_suffix(')')?;
    let name = s[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    let inner = inner.trim();
    Some((name, (!inner.is_empty()).then_some(inner)))
}

fn quoted(s: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|q| {
        let inner = s.strip_prefix(q)?.strip_suffix(q)?;
        (!inner.contains(q)).then_some(inner)
    })
}

fn string_arg(
    source: &str,
    arg: &str,
) -> std::result::Result<String, ConfigurationError> {
    quoted(arg)
        .map(str::to_string)
        .ok_or_else(|| invalid(source, "argument must be a quoted string"))
}

fn split_path(
    source: &str,
    path: &str,
) -> std::result::Result<Vec<String>, ConfigurationError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    path.split('.')
        .map(|segment| {
            if segment.is_empty() {
                Err(invalid(source, "empty path segment"))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}
