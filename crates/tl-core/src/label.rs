//! Short control labels derived from a URL's host.

use url::Url;

/// Link category shown on the action control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Doi,
    Arxiv,
    GitHub,
    Video,
    Generic,
}

impl LinkKind {
    /// Classify by host substring. URLs without a parseable host fall back
    /// to `Generic`.
    pub fn for_url(url: &str) -> Self {
        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_ascii_lowercase(),
                None => return Self::Generic,
            },
            Err(e) => {
                log::debug!("label fallback for {url:?}: {e}");
                return Self::Generic;
            }
        };

        if host.contains("doi.org") {
            Self::Doi
        } else if host.contains("arxiv") {
            Self::Arxiv
        } else if host.contains("github") {
            Self::GitHub
        } else if host.contains("youtube") {
            Self::Video
        } else {
            Self::Generic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Doi => "DOI",
            Self::Arxiv => "arXiv",
            Self::GitHub => "GitHub",
            Self::Video => "video",
            Self::Generic => "open",
        }
    }
}

/// Label for the control attached to `url`.
#[inline]
pub fn label_for(url: &str) -> &'static str {
    LinkKind::for_url(url).label()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hosts() {
        assert_eq!(label_for("https://doi.org/10.1/x"), "DOI");
        assert_eq!(label_for("https://dx.doi.org/10.1/x"), "DOI");
        assert_eq!(label_for("https://arxiv.org/abs/1"), "arXiv");
        assert_eq!(label_for("https://github.com/o/r"), "GitHub");
        assert_eq!(label_for("https://www.youtube.com/watch?v=1"), "video");
        assert_eq!(label_for("https://example.com/"), "open");
    }

    #[test]
    fn test_path_does_not_affect_label() {
        assert_eq!(label_for("https://example.com/github/arxiv"), "open");
    }

    #[test]
    fn test_malformed_urls_fall_back() {
        assert_eq!(label_for("https://exa mple.com"), "open");
        assert_eq!(label_for("not a url"), "open");
        assert_eq!(label_for("https://[zz.com"), "open");
    }
}
