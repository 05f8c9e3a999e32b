//! Endpoint template rendering.
//!
//! A template is a URL string with zero or more positional `{}` placeholders,
//! e.g. `https://api.example.com/users/{}/orders/{}`. Each placeholder consumes
//! exactly one path parameter; the parameter is percent-escaped before
//! substitution. Rendering is pure string work and happens before any network
//! activity, so malformed templates never cost a request.

use url::form_urlencoded;

use crate::params::Query;

/// Endpoint template rendering failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `{` was not immediately followed by `}`.
    #[error("illegal placeholder in endpoint template")]
    IllegalPlaceholder,
    /// More `{}` placeholders than supplied path parameters.
    #[error("not enough path parameters for endpoint template")]
    NotEnoughParameters,
    /// More path parameters supplied than `{}` placeholders.
    #[error("too many path parameters for endpoint template")]
    TooManyParameters,
}

/// Renders `template` by substituting escaped `params` into `{}` placeholders
/// and appending the escaped query string.
///
/// Query pairs are emitted in insertion order with no trailing separator; an
/// empty query contributes nothing, not even the `?`.
pub(crate) fn format_endpoint(
    template: &str,
    query: &Query,
    params: &[&str],
) -> Result<String, TemplateError> {
    let bytes = template.as_bytes();
    let end = bytes.len();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;
    let mut prev = 0;
    let mut used = 0;

    while i < end {
        while i < end && bytes[i] != b'{' {
            i += 1;
        }
        if i == end {
            break;
        }
        if i + 1 >= end || bytes[i + 1] != b'}' {
            return Err(TemplateError::IllegalPlaceholder);
        }
        if used >= params.len() {
            return Err(TemplateError::NotEnoughParameters);
        }
        out.push_str(&template[prev..i]);
        out.extend(form_urlencoded::byte_serialize(params[used].as_bytes()));
        used += 1;
        i += 2;
        prev = i;
    }
    if used != params.len() {
        return Err(TemplateError::TooManyParameters);
    }
    out.push_str(&template[prev..]);

    if !query.is_empty() {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in query.pairs() {
            serializer.append_pair(key, value);
        }
        out.push('?');
        out.push_str(&serializer.finish());
    }

    Ok(out)
}
