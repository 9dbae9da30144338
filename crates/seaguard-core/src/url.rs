use reqwest::Url;

use crate::error::{Result, SeaguardError};

pub const DEFAULT_CSV_FILENAME: &str = "downloaded_data.csv";

const GITHUB_HOST: &str = "github.com";
const GITHUB_RAW_HOST: &str = "raw.githubusercontent.com";

/// Cheap pre-check before asking the service to fetch a remote CSV.
pub fn is_valid_csv_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    url.path().to_ascii_lowercase().ends_with(".csv") || is_github_host(host)
}

fn is_github_host(host: &str) -> bool {
    host == GITHUB_HOST
        || host == GITHUB_RAW_HOST
        || host
            .strip_suffix(GITHUB_HOST)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Rewrites `github.com/<owner>/<repo>/blob/<ref>/<path>` to its raw-content form.
/// Any other URL comes back unchanged.
pub fn convert_github_url_to_raw(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    if url.host_str() != Some(GITHUB_HOST) || !url.path().contains("/blob/") {
        return trimmed.to_string();
    }
    let path = url.path().replacen("/blob/", "/", 1);
    if url.set_host(Some(GITHUB_RAW_HOST)).is_err() {
        return trimmed.to_string();
    }
    url.set_path(&path);
    url.to_string()
}

/// Last path segment when it names a `.csv` file, else [`DEFAULT_CSV_FILENAME`].
pub fn extract_csv_filename(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| {
            let decoded = percent_decode(url.path());
            let segment = decoded.rsplit('/').next().unwrap_or_default().to_string();
            (segment.len() > ".csv".len() && segment.ends_with(".csv")).then_some(segment)
        })
        .unwrap_or_else(|| DEFAULT_CSV_FILENAME.to_string())
}

/// Validates and normalizes a CSV URL for the fetch endpoint.
pub fn prepare_csv_url(raw: &str) -> Result<String> {
    if !is_valid_csv_url(raw) {
        return Err(SeaguardError::InvalidUrl(raw.trim().to_string()));
    }
    Ok(convert_github_url_to_raw(raw))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%'
            && let Some(byte) = bytes
                .get(idx + 1..idx + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            out.push(byte);
            idx += 3;
            continue;
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
