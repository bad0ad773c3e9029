use std::collections::HashSet;

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "typeof", "unsized", "virtual", "yield", "try", "gen",
];

// These cannot be raw identifiers
const PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Convert `pingAsync`, `ping-async` or `PingAsync` into `ping_async`.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower_or_digit = false;
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower_or_digit && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_lower_or_digit = true;
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower_or_digit = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Convert `ping_async` or `pingAsync` into `PingAsync`.
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Join name parts into one snake_case identifier.
#[must_use]
pub fn join_snake_case(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| to_snake_case(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Make a name usable as a Rust identifier, escaping keywords.
#[must_use]
pub fn rust_identifier(name: &str) -> String {
    let mut s = to_snake_case(name);
    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if PATH_KEYWORDS.contains(&s.as_str()) {
        s.push('_');
    } else if KEYWORDS.contains(&s.as_str()) {
        s.insert_str(0, "r#");
    }
    s
}

/// Return `name`, or `name_1`, `name_2`, ... if it was already taken.
pub(crate) fn unique_name(seen: &mut HashSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}_{counter}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("pingAsync"), "ping_async");
        assert_eq!(to_snake_case("PingAsync"), "ping_async");
        assert_eq!(to_snake_case("item-id"), "item_id");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("getV2Item"), "get_v2_item");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("pingAsync"), "PingAsync");
        assert_eq!(to_pascal_case("simple"), "Simple");
        assert_eq!(to_pascal_case("return_primitive"), "ReturnPrimitive");
    }

    #[test]
    fn test_join_snake_case() {
        assert_eq!(
            join_snake_case(&["getItem", "itemId", "decoder"]),
            "get_item_item_id_decoder"
        );
        assert_eq!(join_snake_case(&["post", "serializer"]), "post_serializer");
    }

    #[test]
    fn test_rust_identifier_escapes_keywords() {
        assert_eq!(rust_identifier("type"), "r#type");
        assert_eq!(rust_identifier("self"), "self_");
        assert_eq!(rust_identifier("2fa"), "_2fa");
        assert_eq!(rust_identifier("userId"), "user_id");
    }

    #[test]
    fn test_unique_name() {
        let mut seen = HashSet::new();
        assert_eq!(unique_name(&mut seen, "foo"), "foo");
        assert_eq!(unique_name(&mut seen, "foo"), "foo_1");
        assert_eq!(unique_name(&mut seen, "foo"), "foo_2");
        assert_eq!(unique_name(&mut seen, "foo_1"), "foo_1_1");
    }
}
