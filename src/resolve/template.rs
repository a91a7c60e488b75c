//! Rendering of resharder shard-name templates.
//!
//! Templates use Python `str.format` syntax with a single integer argument,
//! e.g. `{:08d}.tar` or `part-{0:05d}.tar`. Supported replacement fields:
//! `{}`, `{0}`, optional `[[fill]align]`, optional `0` flag, optional width,
//! and an optional `d` type. `{{` and `}}` are literal braces.

use std::sync::OnceLock;

use regex::Regex;

fn format_spec_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(.)?([<>^]))?(0)?([0-9]+)?d?$").expect("static format spec pattern")
    })
}

/// Render `template` with `index` substituted into every replacement field.
pub fn render_shard_name(template: &str, index: u64) -> Result<String, String> {
    let mut rendered = String::with_capacity(template.len() + 8);
    let mut fields = 0usize;
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                rendered.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                rendered.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    field.push(inner);
                }
                if !closed {
                    return Err(format!("unterminated replacement field in '{template}'"));
                }
                rendered.push_str(&render_field(&field, index)?);
                fields += 1;
            }
            '}' => return Err(format!("single '}}' in template '{template}'")),
            other => rendered.push(other),
        }
    }
    if fields == 0 {
        return Err(format!("template '{template}' has no replacement field"));
    }
    Ok(rendered)
}

fn render_field(field: &str, index: u64) -> Result<String, String> {
    let (name, spec) = field.split_once(':').unwrap_or((field, ""));
    if !name.is_empty() && name != "0" {
        return Err(format!("unsupported field name '{name}'"));
    }
    let caps = format_spec_pattern()
        .captures(spec)
        .ok_or_else(|| format!("unsupported format spec '{spec}'"))?;
    let zero_flag = caps.get(3).is_some();
    let width: usize = match caps.get(4) {
        Some(width) => width
            .as_str()
            .parse()
            .map_err(|_| format!("invalid width in '{spec}'"))?,
        None => 0,
    };
    let (fill, align) = match caps.get(2) {
        Some(align) => {
            let fill = caps
                .get(1)
                .and_then(|fill| fill.as_str().chars().next())
                .unwrap_or(' ');
            (fill, align.as_str())
        }
        None if zero_flag => ('0', ">"),
        // Python right-aligns numbers by default.
        None => (' ', ">"),
    };
    let digits = index.to_string();
    let pad = width.saturating_sub(digits.chars().count());
    let padding = |count: usize| std::iter::repeat_n(fill, count).collect::<String>();
    Ok(match align {
        "<" => format!("{digits}{}", padding(pad)),
        "^" => format!("{}{digits}{}", padding(pad / 2), padding(pad - pad / 2)),
        _ => format!("{}{digits}", padding(pad)),
    })
}
