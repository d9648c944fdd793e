//! Jinja-style rendering for on-disk page files.
//!
//! ```text
//! {{ property.title }}                          escaped text
//! {{ property.price | format_price }}           filters apply left to right
//! {% for image in images %}...{% endfor %}      loops
//! {% if property.price %}...{% endif %}         conditionals
//! {% extends "base.html" %}                     other files in the template dir
//! {{ structured_data | safe }}                  no escaping
//! ```
//!
//! Undefined values print as nothing and `none` prints as an empty string.
//! Looking up an attribute of an undefined value is an error, so a page that
//! names a variable the context does not have falls back.

use super::RenderError;
use super::filters::{format_area, format_date, format_price, image_url, slugify};
use maud::html;
use minijinja::value::ValueKind;
use minijinja::{
    AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value, escape_formatter,
};
use std::path::Path;

pub fn escape_html(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Environment with the listing filters and output rules installed.
///
/// Registered on top of the minijinja builtins (`upper`, `safe`, `length`,
/// `join`, `default`, ...): `format_price`, `format_area`, `format_date`,
/// `slugify`, `image_url`, and `json` with its alias `json_encode`.
///
/// With `dir`, `{% extends %}` and `{% include %}` resolve against it.
pub fn environment(dir: Option<&Path>) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Lenient);
    env.set_formatter(|out, state, value| {
        if value.is_none() {
            return Ok(());
        }
        let html = matches!(state.auto_escape(), AutoEscape::Html);
        let plain = match (whole_number(value), value.as_str()) {
            (Some(whole), _) => whole,
            // minijinja's escaper would also rewrite `/` in URLs
            (None, Some(s)) if html && !value.is_safe() => escape_html(s),
            _ => return escape_formatter(out, state, value),
        };
        out.write_str(&plain)
            .map_err(|_| Error::new(ErrorKind::WriteFailure, "could not write page output"))
    });
    if let Some(dir) = dir {
        env.set_loader(minijinja::path_loader(dir.to_path_buf()));
    }

    env.add_filter("format_price", |value: Value| {
        numeric(&value).map_or(value, |n| Value::from(format_price(n)))
    });
    env.add_filter("format_area", |value: Value| {
        numeric(&value).map_or(value, |n| Value::from(format_area(n)))
    });
    env.add_filter("format_date", |value: Value| format_date(&text(&value)));
    env.add_filter("slugify", |value: Value| slugify(&text(&value)));
    env.add_filter("image_url", |value: Value| image_url(&text(&value)));
    env.add_filter("json", json);
    env.add_filter("json_encode", json);
    env
}

/// Render the page file `name` from `env`'s loader.
pub fn render_file(
    env: &Environment<'_>,
    name: &str,
    context: &serde_json::Value,
) -> Result<String, RenderError> {
    Ok(env.get_template(name)?.render(context)?)
}

/// Render `source` as if it were a page file named `name`.
///
/// The `.html` suffix of `name` switches on HTML escaping.
pub fn render_source(
    name: &str,
    source: &str,
    context: &serde_json::Value,
) -> Result<String, RenderError> {
    Ok(environment(None).render_named_str(name, source, context)?)
}

/// Unescaped JSON text of the value.
fn json(value: Value) -> Result<Value, Error> {
    serde_json::to_string(&value)
        .map(Value::from_safe_string)
        .map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, "value is not JSON serializable").with_source(e)
        })
}

fn numeric(value: &Value) -> Option<f64> {
    match value.kind() {
        ValueKind::Number => f64::try_from(value.clone()).ok(),
        ValueKind::String => value.as_str()?.trim().parse().ok(),
        _ => None,
    }
}

/// Whole floats print without a fraction: `500000.0` as `500000`.
fn whole_number(value: &Value) -> Option<String> {
    if value.kind() != ValueKind::Number {
        return None;
    }
    let n = f64::try_from(value.clone()).ok()?;
    (n.fract() == 0.0 && n.abs() < 1e15).then(|| format!("{:.0}", n))
}

/// Plain-text form of a value; `none` and undefined are empty.
fn text(value: &Value) -> String {
    if value.is_none() || value.is_undefined() {
        String::new()
    } else if let Some(s) = value.as_str() {
        s.to_string()
    } else {
        value.to_string()
    }
}
