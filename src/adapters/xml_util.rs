//! Shared XML helpers for the arXiv (Atom) and PubMed (EFetch) adapters.
//!
//! Both upstreams are parsed with `quick_xml`'s pull-event reader rather
//! than a DOM, mirroring how the source's own `xml_parse.py` walks the
//! tree element by element.

use quick_xml::events::BytesStart;

/// Strip a namespace prefix (`"arxiv:primary_category"` -> `"primary_category"`).
/// Atom's default namespace means most tags arrive unprefixed already.
pub fn local_name(bytes: &[u8]) -> String {
    let s = String::from_utf8_lossy(bytes);
    match s.rfind(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.to_string(),
    }
}

/// Read one attribute's value by (unprefixed) name, ignoring malformed
/// attribute bytes rather than failing the whole parse.
pub fn attr_value(start: &BytesStart, name: &str) -> Option<String> {
    start.attributes().flatten().find_map(|attr| {
        if local_name(attr.key.as_ref()) == name {
            attr.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}
