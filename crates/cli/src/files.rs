use std::fs;
use std::path::Path;

use odata2ts_core::generator::GeneratedFile;
use similar::{ChangeTag, TextDiff};
use tracing::debug;

/// A generated file next to what is currently on disk.
#[derive(Debug)]
pub struct FileChange {
    pub rel_path: String,
    pub new_content: String,
    /// None if the file doesn't exist yet
    pub existing_content: Option<String>,
}

impl FileChange {
    pub fn read(output_dir: &Path, file: &GeneratedFile) -> Result<Self, String> {
        let path = output_dir.join(&file.path);
        let existing_content = if path.exists() {
            Some(
                fs::read_to_string(&path)
                    .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
            )
        } else {
            None
        };

        Ok(Self {
            rel_path: file.path.clone(),
            new_content: file.content.clone(),
            existing_content,
        })
    }

    pub fn is_up_to_date(&self) -> bool {
        self.existing_content.as_deref() == Some(self.new_content.as_str())
    }

    /// Unified diff against the current file; None when nothing changed.
    pub fn diff(&self) -> Option<String> {
        if self.is_up_to_date() {
            return None;
        }
        let existing = self.existing_content.as_deref().unwrap_or_default();
        let diff = TextDiff::from_lines(existing, &self.new_content);

        let mut output = format!("--- {} (current)\n+++ {} (generated)\n", self.rel_path, self.rel_path);
        for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
            if idx > 0 {
                output.push_str("...\n");
            }
            for op in group {
                for change in diff.iter_changes(op) {
                    let sign = match change.tag() {
                        ChangeTag::Delete => "-",
                        ChangeTag::Insert => "+",
                        ChangeTag::Equal => " ",
                    };
                    output.push_str(sign);
                    output.push_str(change.value());
                    if change.missing_newline() {
                        output.push('\n');
                    }
                }
            }
        }
        Some(output)
    }

    pub fn write(&self, output_dir: &Path) -> Result<(), String> {
        let path = output_dir.join(&self.rel_path);
        if self.is_up_to_date() {
            debug!(path = %path.display(), "unchanged");
            return Ok(());
        }
        fs::write(&path, &self.new_content)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
        debug!(path = %path.display(), bytes = self.new_content.len(), "wrote file");
        Ok(())
    }
}
