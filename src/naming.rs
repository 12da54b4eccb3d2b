use crate::exchange::Request;

const URL_SLUG_MAX_LEN: usize = 48;

/// Derives the storage name for one recorded artifact from the request, a
/// role tag, and the exchange identifier. Distinct role tags ("mapping",
/// "body") guarantee distinct names even when both artifacts come from the
/// same request and identifier.
pub fn filename_for(request: &Request, role: &str, id: &str) -> String {
    let url_slug = slug_ascii(&request.url, URL_SLUG_MAX_LEN, "root");
    format!("{role}-{url_slug}-{id}.json")
}

fn slug_ascii(value: &str, max_len: usize, fallback: &str) -> String {
    let mut slug = String::new();
    let mut previous_dash = false;
    for ch in value.chars() {
        let lowered = ch.to_ascii_lowercase();
        if lowered.is_ascii_alphanumeric() {
            slug.push(lowered);
            previous_dash = false;
        } else if !previous_dash {
            slug.push('-');
            previous_dash = true;
        }
        if slug.len() >= max_len {
            break;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        fallback.to_owned()
    } else {
        slug.to_owned()
    }
}
