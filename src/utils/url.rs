use percent_encoding::percent_decode_str;
use url::Url;

pub const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org/wiki/";

/// Characters that may not appear in a cache filename; each one is
/// replaced with a dash. The table is deliberately explicit so the
/// collision behavior of the substitution is documented by the code.
const UNSAFE_FILENAME_CHARS: &[char] = &[':', '/', '.', '?', '"', '<', '>', '|'];

/// Turns raw user input (article title or Wikipedia URL) into the
/// canonical article title
///
/// The canonical form uses spaces rather than underscores. For URLs, the
/// segment after the last `/wiki/` is taken, the fragment is stripped,
/// and percent-encoding is decoded. Returns None when nothing usable
/// remains.
pub fn normalize_article_input(input: &str) -> Option<String> {
    let trimmed = input.trim();

    let title = match parse_article_url(trimmed) {
        Some(url) => {
            // Url already strips the query and fragment from the path.
            let segment = url.path().rsplit("/wiki/").next().unwrap_or("");
            percent_decode_str(segment)
                .decode_utf8_lossy()
                .replace('_', " ")
        }
        None => trimmed.replace('_', " "),
    };

    let title = title.trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Parses input as a Wikipedia URL, tolerating a missing scheme;
/// returns None for anything that should be treated as a plain title
fn parse_article_url(input: &str) -> Option<Url> {
    let url = if input.contains("://") {
        Url::parse(input).ok()?
    } else if input.contains("wikipedia.org") {
        Url::parse(&format!("https://{input}")).ok()?
    } else {
        return None;
    };

    if url
        .host_str()
        .map_or(false, |host| host.ends_with("wikipedia.org"))
    {
        Some(url)
    } else {
        None
    }
}

/// Builds the canonical article URL for a title
pub fn article_url(title: &str) -> String {
    format!("{}{}", WIKIPEDIA_BASE_URL, title.replace(' ', "_"))
}

/// Derives the cache filename for an article title
///
/// The name mirrors the structure of the article URL: the scheme
/// separator becomes a single dash and every character from
/// `UNSAFE_FILENAME_CHARS` becomes a dash. Distinct titles stay distinct
/// because the URL is injective over titles, though two titles differing
/// only in characters from the table would collide.
pub fn cache_file_name(title: &str) -> String {
    let safe_url: String = article_url(title)
        .replacen("https://", "https-", 1)
        .chars()
        .map(|c| {
            if UNSAFE_FILENAME_CHARS.contains(&c) {
                '-'
            } else {
                c
            }
        })
        .collect();

    format!("{safe_url}.json")
}
