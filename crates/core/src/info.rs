//! Project metadata.
//!
//! Built once at startup from the binary's package metadata and passed to
//! whatever needs to print it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    pub summary: String,
    pub homepage: String,
    pub authors: Vec<String>,
    pub years: String,
}

impl ProjectInfo {
    /// Build from Cargo-style fields. `authors` is the colon-separated list
    /// found in `CARGO_PKG_AUTHORS`.
    pub fn from_package(
        name: &str,
        version: &str,
        summary: &str,
        homepage: &str,
        authors: &str,
        years: &str,
    ) -> Self {
        ProjectInfo {
            name: name.to_string(),
            version: version.to_string(),
            summary: summary.to_string(),
            homepage: homepage.to_string(),
            authors: authors
                .split(':')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect(),
            years: years.to_string(),
        }
    }

    /// Long `--version` text.
    pub fn version_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("{} {}\n", self.name, self.version));
        s.push_str(&format!("{}\n", self.homepage));
        s.push('\n');
        s.push_str(&format!(
            "Copyright (c) {} {}\n",
            self.years,
            self.authors.join(", ")
        ));
        s.push('\n');
        s.push_str(
            "This is free software; see the source for copying conditions.  There is NO\n",
        );
        s.push_str("warranty; not even for MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.");
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ProjectInfo {
        ProjectInfo::from_package(
            "textorizer",
            "0.3.0",
            "Extract text from multi-column PDFs",
            "https://example.org/textorizer",
            "Ada <ada@example.org>:Bob <bob@example.org>",
            "2024",
        )
    }

    #[test]
    fn test_authors_split() {
        assert_eq!(
            info().authors,
            vec!["Ada <ada@example.org>", "Bob <bob@example.org>"]
        );
        let single = ProjectInfo::from_package("a", "1", "", "", "Solo", "2024");
        assert_eq!(single.authors, vec!["Solo"]);
    }

    #[test]
    fn test_version_string() {
        let text = info().version_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "textorizer 0.3.0");
        assert_eq!(lines[1], "https://example.org/textorizer");
        assert_eq!(lines[2], "");
        assert_eq!(
            lines[3],
            "Copyright (c) 2024 Ada <ada@example.org>, Bob <bob@example.org>"
        );
        assert_eq!(lines[4], "");
        assert!(lines[5].starts_with("This is free software"));
        assert!(!text.ends_with('\n'));
    }
}
