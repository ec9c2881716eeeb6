// src/output/dry_run.rs

use crate::core_types::{FileRole, SourceFile};
use crate::utils::format_size;
use log::debug;
use std::io::{self, Write};

/// Writes the output of a dry run.
///
/// Lists the relative paths of the files that would be bundled, in the order
/// given. Include files are marked, and binary files are flagged.
pub fn write_dry_run_output(writer: &mut dyn Write, files: &[SourceFile]) -> io::Result<()> {
    debug!("Executing dry run output...");
    writeln!(writer, "--- Dry Run: Files that would be bundled ---")?;

    let mut total = 0u64;
    for file in files {
        total += file.size;
        let mut notes = Vec::new();
        if file.role == FileRole::Include {
            notes.push("include");
        }
        if file.is_binary {
            notes.push("binary");
        }
        if let Some(preset) = &file.preset {
            notes.push(preset.source.as_str());
        }
        if notes.is_empty() {
            writeln!(writer, "- {}", file.relative_path)?;
        } else {
            writeln!(writer, "- {} [{}]", file.relative_path, notes.join(", "))?;
        }
    }

    writeln!(
        writer,
        "--- End Dry Run: {} file(s), {} ---",
        files.len(),
        format_size(total)
    )?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn create_file(relative_path: &str, size: u64) -> SourceFile {
        let mut file = SourceFile::new(PathBuf::from("/project").join(relative_path), relative_path);
        file.size = size;
        file
    }

    #[test]
    fn test_dry_run_output_empty() -> anyhow::Result<()> {
        let mut writer = Cursor::new(Vec::new());
        write_dry_run_output(&mut writer, &[])?;
        let output = String::from_utf8(writer.into_inner())?;
        assert_eq!(
            output,
            "--- Dry Run: Files that would be bundled ---\n--- End Dry Run: 0 file(s), 0 B ---\n"
        );
        Ok(())
    }

    #[test]
    fn test_dry_run_output_preserves_order_and_marks() -> anyhow::Result<()> {
        let mut intro = create_file("intro.md", 10);
        intro.role = FileRole::Include;
        let mut blob = create_file("z.bin", 5);
        blob.is_binary = true;
        let files = vec![intro, create_file("b.txt", 1), blob];

        let mut writer = Cursor::new(Vec::new());
        write_dry_run_output(&mut writer, &files)?;
        let output = String::from_utf8(writer.into_inner())?;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "- intro.md [include]");
        assert_eq!(lines[2], "- b.txt");
        assert_eq!(lines[3], "- z.bin [binary]");
        assert!(lines[4].starts_with("--- End Dry Run: 3 file(s)"));
        Ok(())
    }
}
