//! Cursor extraction from vendor pagination URLs.
//!
//! Alert pages carry `nextPage`/`previousPage` URL strings; the resumption
//! cursor is the value of their `from` (preferred) or `to` query parameter.
//! Cursors are opaque: values are passed back to the vendor verbatim,
//! without decoding.

/// Extract the resumption cursor from a pagination URL, if any.
pub fn cursor_from_page_url(url: &str) -> Option<String> {
    query_param(url, "from").or_else(|| query_param(url, "to"))
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
