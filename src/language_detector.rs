//! Best-effort detection of the project language in a directory.
//!
//! Detection only looks at well-known marker files at the top of the
//! directory; it never walks the tree.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker files checked in order; the first hit wins.
const MARKERS: &[(&str, &str)] = &[
    ("Cargo.toml", "rust"),
    ("go.mod", "go"),
    ("tsconfig.json", "typescript"),
    ("package.json", "javascript"),
    ("pyproject.toml", "python"),
    ("requirements.txt", "python"),
    ("setup.py", "python"),
    ("Pipfile", "python"),
    ("pom.xml", "java"),
    ("build.gradle", "java"),
    ("build.gradle.kts", "kotlin"),
    ("Gemfile", "ruby"),
    ("composer.json", "php"),
    ("Package.swift", "swift"),
    ("pubspec.yaml", "dart"),
    ("mix.exs", "elixir"),
    ("CMakeLists.txt", "c++"),
];

/// File extensions checked when no marker file matches.
const EXTENSIONS: &[(&str, &str)] = &[
    ("csproj", "c#"),
    ("sln", "c#"),
    ("rs", "rust"),
    ("go", "go"),
    ("ts", "typescript"),
    ("js", "javascript"),
    ("py", "python"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("rb", "ruby"),
    ("php", "php"),
    ("swift", "swift"),
    ("cpp", "c++"),
    ("c", "c"),
];

pub struct LanguageDetector {
    root: PathBuf,
}

impl LanguageDetector {
    /// Detector for the current working directory.
    pub fn new() -> Self {
        Self::for_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn for_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lowercase language name, if one could be detected.
    pub fn detect_language(&self) -> Option<&'static str> {
        let by_marker = MARKERS
            .iter()
            .find(|(marker, _)| self.root.join(marker).is_file())
            .map(|(_, language)| *language);

        let language = by_marker.or_else(|| self.detect_by_extension());
        debug!("Detected language {:?} in {}", language, self.root.display());
        language
    }

    /// Context string appended to the system instruction, e.g. "Rust project".
    pub fn get_language_context(&self) -> Option<String> {
        self.detect_language().map(|language| format!("{} project", title_case(language)))
    }

    fn detect_by_extension(&self) -> Option<&'static str> {
        let entries = std::fs::read_dir(&self.root).ok()?;
        let extensions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.to_ascii_lowercase())
            })
            .collect();

        EXTENSIONS
            .iter()
            .find(|(ext, _)| extensions.iter().any(|found| found == ext))
            .map(|(_, language)| *language)
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
