use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

// Directories holding this crate's Rust sources. Anything else under the
// package root (vendored reference material, target/) is left alone.
const SOURCE_DIRS: [&str; 6] = ["src", "cli", "heatmap", "prevalence", "shared", "tests"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Policy {
    UnderscoreBinding,
    ForbiddenCommentWord,
    AllowDeadCode,
}

impl Policy {
    fn pattern(self) -> &'static str {
        match self {
            Policy::UnderscoreBinding => r"\b(_[a-zA-Z0-9_]+)\b",
            Policy::ForbiddenCommentWord => {
                r"(//|/\*|///).*(?:FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)"
            }
            Policy::AllowDeadCode => r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            Policy::UnderscoreBinding => {
                "Underscore-prefixed variable names are not allowed in this project.\n   Either use the variable (removing the underscore) or remove it completely."
            }
            Policy::ForbiddenCommentWord => {
                "Comments narrating edits ('FIXED', 'CHANGED', 'UPDATE', ...) are not allowed.\n   Describe what the code does, not how it got there."
            }
            Policy::AllowDeadCode => {
                "#[allow(dead_code)] attributes are STRICTLY FORBIDDEN in this project.\n   Either use the code (removing the attribute) or remove it completely."
            }
        }
    }
}

struct PolicyCollector {
    policy: Policy,
    violations: Vec<String>,
    file_path: PathBuf,
}

impl PolicyCollector {
    fn new(policy: Policy, file_path: &Path) -> Self {
        Self {
            policy,
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
        }
    }

    fn check_and_get_error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} source policy violations in {}:\n",
            self.violations.len(),
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.policy.explanation()));
        Some(error_msg)
    }
}

// Underscore matches are only violations in code, never inside comments or
// string literals.
fn is_comment_or_string_match(line_text: &str) -> bool {
    if line_text.trim_start().starts_with("//") {
        return true;
    }
    line_text
        .split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

impl Sink for PolicyCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if self.policy == Policy::UnderscoreBinding && is_comment_or_string_match(line_text) {
            return Ok(true);
        }

        self.violations.push(format!("{line_number}:{line_text}"));
        Ok(true)
    }
}

fn crate_sources() -> impl Iterator<Item = PathBuf> {
    SOURCE_DIRS.iter().flat_map(|dir| {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
            .map(|e| e.into_path())
    })
}

fn enforce(policy: Policy) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(policy.pattern())?;
    let mut searcher = Searcher::new();

    for path in crate_sources() {
        let mut collector = PolicyCollector::new(policy, &path);
        searcher.search_path(&matcher, &path, &mut collector)?;
        if let Some(error_message) = collector.check_and_get_error_message() {
            return Err(error_message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SOURCE_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=COHORTLENS_BUILD_TIMESTAMP={timestamp}");

    for policy in [
        Policy::UnderscoreBinding,
        Policy::ForbiddenCommentWord,
        Policy::AllowDeadCode,
    ] {
        if let Err(e) = enforce(policy) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
