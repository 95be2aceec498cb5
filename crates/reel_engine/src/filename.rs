use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;

/// Portable, deterministic file name for a store key: `{sanitized_key}--{short_hash(key)}.json`.
///
/// The hash keeps keys distinct when sanitizing maps them to the same text.
pub fn storage_filename(key: &str) -> String {
    format!("{}--{}.json", sanitize_key(key), short_hash(key))
}

fn sanitize_key(input: &str) -> String {
    // One pass: forbidden characters become `_`, and runs of `_` collapse.
    let mut stem = String::with_capacity(input.len());
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(c);
    }
    let mut stem = stem.trim_matches(&['_', ' ', '.'][..]).to_string();
    if stem.is_empty() {
        stem.push_str("entry");
    }
    truncate_on_char_boundary(&mut stem, MAX_STEM_LEN);
    if is_reserved_device_name(&stem) {
        stem.push('_');
    }
    stem
}

fn truncate_on_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let cut = (0..=max_len)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    text.truncate(cut);
}

fn is_forbidden(c: char) -> bool {
    c.is_control() || matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// Device names Windows reserves, such as `CON` or `COM1`.
fn is_reserved_device_name(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" => true,
        other => match (other.get(..3), other.get(3..)) {
            (Some("COM" | "LPT"), Some(digit)) => matches!(digit.as_bytes(), [b'1'..=b'9']),
            _ => false,
        },
    }
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest[..4].iter().map(|byte| format!("{byte:02x}")).collect()
}
