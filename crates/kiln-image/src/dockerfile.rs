//! Dockerfile reading.
//!
//! Only the instructions that reference other images matter here: every
//! `FROM` and every `COPY --from=`. Build stages declared with `AS` are
//! tracked so that a later `FROM builder` is not mistaken for an image.
//! Heredoc bodies (`RUN <<EOF` up to `EOF`) are skipped unread.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use kiln_common::constants::SCRATCH_IMAGE;
use kiln_common::error::{KilnError, Result};

/// The image references of one Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dockerfile {
    /// Location of the file.
    pub path: PathBuf,
    /// Referenced images, first-seen order, each once.
    pub dependencies: Vec<String>,
    /// Build stage aliases in declaration order.
    pub stages: Vec<String>,
}

impl Dockerfile {
    /// Reads and parses the Dockerfile at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or has no usable `FROM`.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| KilnError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Parses Dockerfile text. `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns `KilnError::Dockerfile` if a `FROM` has no image or the file
    /// has no `FROM` at all.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let invalid = |message: String| KilnError::Dockerfile {
            path: path.to_path_buf(),
            message,
        };

        let mut parsed = Self {
            path: path.to_path_buf(),
            dependencies: Vec::new(),
            stages: Vec::new(),
        };
        let mut saw_from = false;

        for line in logical_lines(content, escape_char(content)) {
            let mut tokens = line.split_whitespace();
            let Some(instruction) = tokens.next() else {
                continue;
            };
            let args: Vec<&str> = tokens.collect();

            if instruction.eq_ignore_ascii_case("FROM") {
                saw_from = true;
                let mut rest = args.iter().skip_while(|t| t.starts_with("--"));
                let image = rest
                    .next()
                    .ok_or_else(|| invalid(format!("FROM without image: {line}")))?;
                parsed.reference(image);
                if rest.next().is_some_and(|t| t.eq_ignore_ascii_case("AS")) {
                    if let Some(alias) = rest.next() {
                        parsed.stages.push(alias.to_ascii_lowercase());
                    }
                }
            } else if instruction.eq_ignore_ascii_case("COPY") {
                let from = args
                    .iter()
                    .take_while(|t| t.starts_with("--"))
                    .find_map(|t| t.strip_prefix("--from="));
                if let Some(source) = from {
                    if !source.chars().all(|c| c.is_ascii_digit()) {
                        parsed.reference(source);
                    }
                }
            }
        }

        if !saw_from {
            return Err(invalid("no FROM instruction".into()));
        }
        Ok(parsed)
    }

    fn reference(&mut self, image: &str) {
        let is_stage = self.stages.iter().any(|s| s.eq_ignore_ascii_case(image));
        if is_stage || image == SCRATCH_IMAGE || image.contains('$') {
            return;
        }
        if !self.dependencies.iter().any(|d| d == image) {
            self.dependencies.push(image.to_string());
        }
    }
}

/// Reads the `# escape=` parser directive, defaulting to backslash.
fn escape_char(content: &str) -> char {
    for line in content.lines() {
        let Some(directive) = line.trim().strip_prefix('#') else {
            break;
        };
        let Some((key, value)) = directive.split_once('=') else {
            break;
        };
        if key.trim().eq_ignore_ascii_case("escape") {
            if let Some(c) = value.trim().chars().next() {
                return c;
            }
        }
    }
    '\\'
}

/// Joins continuation lines and drops comments, blank lines, and heredoc
/// bodies.
fn logical_lines(content: &str, escape: char) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    // terminators of heredocs opened by the last instruction, in body order
    let mut heredocs: VecDeque<String> = VecDeque::new();

    for raw in content.lines() {
        let trimmed = raw.trim();
        if let Some(terminator) = heredocs.front() {
            if trimmed == terminator.as_str() {
                let _ = heredocs.pop_front();
            }
            continue;
        }
        if trimmed.starts_with('#') || (trimmed.is_empty() && !current.is_empty()) {
            continue;
        }
        if let Some(head) = trimmed.strip_suffix(escape) {
            current.push_str(head);
            current.push(' ');
        } else {
            current.push_str(trimmed);
            if !current.trim().is_empty() {
                heredocs.extend(heredoc_terminators(&current));
                lines.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }
    lines
}

/// Terminator words of the heredocs (`<<EOF`, `<<-EOF`, `<<"EOF"`) a
/// `RUN`, `COPY` or `ADD` instruction opens, in order.
fn heredoc_terminators(line: &str) -> Vec<String> {
    let opens_heredocs = line
        .split_whitespace()
        .next()
        .is_some_and(|i| HEREDOC_INSTRUCTIONS.iter().any(|k| k.eq_ignore_ascii_case(i)));
    if !opens_heredocs {
        return Vec::new();
    }

    let mut terminators = Vec::new();
    let mut rest = line;
    while let Some(pos) = rest.find("<<") {
        rest = &rest[pos + 2..];
        // `<<<` is a here-string
        if rest.starts_with('<') {
            rest = rest.trim_start_matches('<');
            continue;
        }
        let word = rest.strip_prefix('-').unwrap_or(rest);
        let word = word.trim_start_matches(['"', '\'']);
        let end = word
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(word.len());
        let name = &word[..end];
        if name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            terminators.push(name.to_string());
        }
    }
    terminators
}

const HEREDOC_INSTRUCTIONS: [&str; 3] = ["RUN", "COPY", "ADD"];
