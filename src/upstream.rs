use std::borrow::Cow;
use std::fmt;

/// Header a caller sets to redirect a single generate request to another backend.
pub const TARGET_HEADER: &str = "x-ollama-target";

const GENERATE_PATH: &str = "/api/generate";

// A generation backend, identified by its base url

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    base_url: String,
}

impl Upstream {
    // Accepts "localhost:11434", "http://host:11434/" or a tunnel url like "https://abc.ngrok.dev"
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        // add http:// if not present
        let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
        Some(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn generate_url(&self) -> String {
        format!("{}{}", self.base_url, GENERATE_PATH)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

// Override wins when present and non-blank; otherwise the default backend
pub fn resolve<'a>(default: &'a Upstream, target_override: Option<&str>) -> Cow<'a, Upstream> {
    match target_override.and_then(Upstream::parse) {
        Some(custom) => Cow::Owned(custom),
        None => Cow::Borrowed(default),
    }
}
