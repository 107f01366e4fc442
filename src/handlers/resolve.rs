use url::Url;

/// Path portion of a content URL.
///
/// Absolute URLs go through the `url` parser; anything it rejects (relative
/// or bare file paths) is cut at the first query or fragment delimiter.
pub fn url_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        return parsed.path().to_string();
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_path() {
        assert_eq!(url_path("http://example.com/a/b.png?x=1#f"), "/a/b.png");
        assert_eq!(url_path("file:///tmp/notes.txt"), "/tmp/notes.txt");
    }

    #[test]
    fn test_relative_path_falls_back_to_delimiters() {
        assert_eq!(url_path("docs/readme.md?raw"), "docs/readme.md");
        assert_eq!(url_path("page.html#intro"), "page.html");
        assert_eq!(url_path("plain.txt"), "plain.txt");
    }
}
