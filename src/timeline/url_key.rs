const SCHEMES: [&str; 2] = ["http://", "https://"];

fn strip_once(input: &str) -> &str {
    let mut out = input.trim();
    for scheme in SCHEMES {
        if let Some(rest) = out.strip_prefix(scheme) {
            out = rest;
            break;
        }
    }
    out = out.strip_suffix('/').unwrap_or(out);
    out.trim()
}

/// Stripping repeats until nothing changes, so
/// `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let mut current = lowered.as_str();
    loop {
        let next = strip_once(current);
        if next.len() == current.len() {
            return next.to_string();
        }
        current = next;
    }
}
