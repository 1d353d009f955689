//! CSRF token discovery from the server-rendered page shell.

use regex::Regex;

/// Extracts the token from `<meta name="csrf-token" content="...">`.
///
/// Attribute order varies between templates, so both orders are accepted.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let patterns = [
        r#"<meta\s+[^>]*name=["']csrf-token["'][^>]*content=["']([^"']+)["']"#,
        r#"<meta\s+[^>]*content=["']([^"']+)["'][^>]*name=["']csrf-token["']"#,
    ];
    for pattern in patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::error!("Invalid CSRF pattern: {}", e);
                return None;
            }
        };
        if let Some(caps) = re.captures(html) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }
    None
}
