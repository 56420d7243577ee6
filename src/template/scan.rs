use std::collections::{BTreeSet, HashSet};

/// Names of the context values a TinyTemplate expression reads
///
/// Covers `{ value | formatter }` substitutions and the paths used by `{{ if }}`, `{{ for }}`,
/// `{{ with }}` and `{{ call }}` blocks. Only the first segment of a dotted path is reported,
/// names bound by `for` and `with` are left out, and so are `@index`-style loop variables,
/// comments and `\{` escapes.
pub fn variables(template: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut bound = HashSet::new();
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '\\' || c == '{') {
        let tail = &rest[pos..];
        if let Some(escaped) = tail.strip_prefix('\\') {
            let mut chars = escaped.chars();
            chars.next();
            rest = chars.as_str();
        } else if let Some(body) = tail.strip_prefix("{#") {
            match body.split_once("#}") {
                Some((_, next)) => rest = next,
                None => break,
            }
        } else if let Some(body) = tail.strip_prefix("{{") {
            match body.split_once("}}") {
                Some((inner, next)) => {
                    block(inner, &mut found, &mut bound);
                    rest = next;
                }
                None => break,
            }
        } else {
            match tail[1..].split_once('}') {
                Some((inner, next)) => {
                    let path = inner.split('|').next().unwrap_or_default();
                    add_path(path, &mut found, &bound);
                    rest = next;
                }
                None => break,
            }
        }
    }
    found
}

fn block<'a>(inner: &'a str, found: &mut BTreeSet<String>, bound: &mut HashSet<&'a str>) {
    let words: Vec<&str> = inner.split_whitespace().collect();
    match words.as_slice() {
        ["if", "not", path] | ["if", path] => add_path(path, found, bound),
        ["for", name, "in", path] | ["with", path, "as", name] => {
            add_path(path, found, bound);
            bound.insert(*name);
        }
        ["call", _, "with", path] => add_path(path, found, bound),
        _ => {}
    }
}

fn add_path(path: &str, found: &mut BTreeSet<String>, bound: &HashSet<&str>) {
    let head = path.trim().split('.').next().unwrap_or_default();
    if head.is_empty() || head.starts_with('@') || bound.contains(head) {
        return;
    }
    found.insert(head.to_string());
}
