//! Document source adapters.
//!
//! Two adapters feed the ingestion pipeline: [`scan_tree`] walks a
//! source-code tree for files with a given extension, and [`scan_pages`]
//! reads a directory of pre-crawled page files whose names encode the page
//! title. Both emit [`Document`]s whose text starts with the derived title
//! so it survives chunking into every chunk's neighborhood.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::{PagesSourceConfig, TreeSourceConfig};
use crate::models::Document;

/// Walk a source tree and collect every file with the configured extension.
///
/// Files named `*_test.<ext>` are skipped when `exclude_tests` is set, and
/// `exclude_globs` filter on root-relative paths. Results are sorted by
/// identifier so repeated scans of the same tree produce the same corpus.
pub fn scan_tree(config: &TreeSourceConfig) -> Result<Vec<Document>> {
    let root = &config.root;
    if !root.exists() {
        bail!("Source tree root does not exist: {}", root.display());
    }

    let exclude_set = build_globset(&config.exclude_globs)?;
    let test_suffix = format!("_test.{}", config.extension);

    let mut documents = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) != Some(config.extension.as_str()) {
            continue;
        }
        if config.exclude_tests && file_name.ends_with(&test_suffix) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();
        if exclude_set.is_match(&rel_str) {
            continue;
        }

        let body = std::fs::read_to_string(path)?;
        let raw_text = format!("{}. {}", rel_str, normalize_text(&body));
        documents.push(Document {
            identifier: rel_str,
            raw_text,
        });
    }

    // Sort for deterministic ordering
    documents.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    Ok(documents)
}

/// Read a directory of crawled page files.
///
/// The page title is recovered from the file name by stripping a fixed
/// prefix and suffix, turning `-` and `_` into spaces, and dropping the
/// literal `#update` fragment marker. Results are sorted by identifier.
pub fn scan_pages(config: &PagesSourceConfig) -> Result<Vec<Document>> {
    let dir = &config.dir;
    if !dir.exists() {
        bail!("Pages directory does not exist: {}", dir.display());
    }

    let mut documents = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let title = page_title(file_name, config.strip_prefix, config.strip_suffix);
        let body = std::fs::read_to_string(&path)?;
        documents.push(Document {
            identifier: title.clone(),
            raw_text: format!("{}. {}", title, normalize_text(&body)),
        });
    }

    documents.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    Ok(documents)
}

/// Recover a page title from its file name.
fn page_title(file_name: &str, strip_prefix: usize, strip_suffix: usize) -> String {
    let chars: Vec<char> = file_name.chars().collect();
    let end = chars.len().saturating_sub(strip_suffix);
    let start = strip_prefix.min(end);
    let stripped: String = chars[start..end].iter().collect();
    stripped
        .replace(['-', '_'], " ")
        .replace("#update", "")
}

/// Collapse raw file text onto one line.
///
/// Newlines and escaped `\n` sequences become spaces, then runs of doubled
/// spaces are collapsed. Two passes handle the residue the first leaves.
pub fn normalize_text(text: &str) -> String {
    let flattened = text.replace("\\n", " ").replace(['\n', '\r'], " ");
    let collapsed = flattened.replace("  ", " ");
    collapsed.replace("  ", " ")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tree_config(root: PathBuf) -> TreeSourceConfig {
        TreeSourceConfig {
            root,
            extension: "go".to_string(),
            exclude_tests: true,
            exclude_globs: Vec::new(),
        }
    }

    #[test]
    fn test_scan_tree_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("pkg/zeta.go"), "package pkg\n").unwrap();
        std::fs::write(tmp.path().join("alpha.go"), "package main\n").unwrap();
        std::fs::write(tmp.path().join("alpha_test.go"), "package main\n").unwrap();
        std::fs::write(tmp.path().join("readme.md"), "docs\n").unwrap();

        let docs = scan_tree(&tree_config(tmp.path().to_path_buf())).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.identifier.as_str()).collect();
        assert_eq!(ids, vec!["alpha.go", "pkg/zeta.go"]);
    }

    #[test]
    fn test_scan_tree_text_starts_with_identifier() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();
        std::fs::write(tmp.path().join("main.go"), "package main\nfunc main() {}\n").unwrap();
        std::fs::write(tmp.path().join("pkg/util.go"), "package pkg\n").unwrap();

        let docs = scan_tree(&tree_config(tmp.path().to_path_buf())).unwrap();
        assert_eq!(docs.len(), 2);
        // The text prefix is the same relative path used as the identifier.
        for doc in &docs {
            assert!(doc.raw_text.starts_with(&format!("{}. ", doc.identifier)));
            assert!(!doc.raw_text.contains('\n'));
        }
        assert!(docs[1].raw_text.starts_with("pkg/util.go. package pkg"));
    }

    #[test]
    fn test_scan_tree_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("vendor")).unwrap();
        std::fs::write(tmp.path().join("vendor/dep.go"), "package dep\n").unwrap();
        std::fs::write(tmp.path().join("main.go"), "package main\n").unwrap();

        let mut config = tree_config(tmp.path().to_path_buf());
        config.exclude_globs = vec!["vendor/**".to_string()];
        let docs = scan_tree(&config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].identifier, "main.go");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let config = tree_config(PathBuf::from("/nonexistent/tree/root"));
        assert!(scan_tree(&config).is_err());
    }

    #[test]
    fn test_page_title_recovery() {
        // "text/dir/" prefix of 9 chars, ".txt" suffix of 4.
        assert_eq!(page_title("text/dir/some-page_name.txt", 9, 4), "some page name");
        assert_eq!(page_title("text/dir/page#update.txt", 9, 4), "page");
    }

    #[test]
    fn test_scan_pages() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("crawled.io_getting-started.txt"), "First line\nsecond line\n")
            .unwrap();

        let config = PagesSourceConfig {
            dir: tmp.path().to_path_buf(),
            strip_prefix: 11,
            strip_suffix: 4,
        };
        let docs = scan_pages(&config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].identifier, "getting started");
        assert_eq!(docs[0].raw_text, "getting started. First line second line ");
    }

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("a\nb\\nc"), "a b c");
        assert_eq!(normalize_text("a\n\n\n\nb"), "a b");
    }
}
