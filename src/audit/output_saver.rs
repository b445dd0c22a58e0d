//! Command output file saving.
//!
//! Port of `original_source/litassist/logging/output_saver.py`.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::AuditError;

const MAX_SLUG_LEN: usize = 40;

fn slugify(query_or_slug: &str) -> String {
    let sanitized: String = query_or_slug
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();

    let mut out = String::new();
    let mut last_was_sep = false;
    for ch in sanitized.chars() {
        if ch == '-' || ch.is_whitespace() {
            if !last_was_sep {
                out.push('_');
            }
            last_was_sep = true;
        } else {
            out.push(ch);
            last_was_sep = false;
        }
    }

    out.trim_matches('_').chars().take(MAX_SLUG_LEN).collect()
}

/// Saves a command's output with a standard header, optional metadata
/// lines, and optional trailing AI-critique sections, returning the path
/// written.
pub fn save_command_output(
    command_name: &str,
    content: &str,
    query_or_slug: &str,
    metadata: &[(&str, &str)],
    critique_sections: &[(String, String)],
    output_dir: &Path,
) -> Result<PathBuf, AuditError> {
    std::fs::create_dir_all(output_dir).map_err(|e| AuditError::WriteFailed {
        path: output_dir.display().to_string(),
        source: e,
    })?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let slug = slugify(query_or_slug);

    let filename = if slug.is_empty() {
        format!("{command_name}_{timestamp}.txt")
    } else {
        format!("{command_name}_{slug}_{timestamp}.txt")
    };
    let output_file = output_dir.join(filename);

    let mut file = std::fs::File::create(&output_file).map_err(|e| AuditError::WriteFailed {
        path: output_file.display().to_string(),
        source: e,
    })?;

    let write_all = |file: &mut std::fs::File| -> std::io::Result<()> {
        writeln!(file, "{}", title_case(command_name))?;
        for (key, value) in metadata {
            writeln!(file, "{key}: {value}")?;
        }
        writeln!(
            file,
            "Timestamp: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file, "{}\n", "-".repeat(80))?;
        write!(file, "{content}")?;

        if !critique_sections.is_empty() {
            writeln!(file, "\n\n{}", "=".repeat(80))?;
            writeln!(file, "AI CRITIQUE & VERIFICATION")?;
            writeln!(file, "{}\n", "=".repeat(80))?;
            for (title, critique) in critique_sections {
                writeln!(file, "## {title}\n")?;
                writeln!(file, "{critique}\n")?;
            }
        }
        Ok(())
    };

    write_all(&mut file).map_err(|e| AuditError::WriteFailed {
        path: output_file.display().to_string(),
        source: e,
    })?;

    Ok(output_file)
}

fn title_case(command_name: &str) -> String {
    command_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_and_truncates_long_queries() {
        let slug = slugify("What is the effect of   Mabo v Queensland (No 2)?? ".repeat(3).as_str());
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.contains(' '));
    }

    #[test]
    fn title_cases_underscored_command_name() {
        assert_eq!(title_case("extract_facts"), "Extract Facts");
    }

    #[test]
    fn saves_output_with_header_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_command_output(
            "strategy",
            "the body",
            "my query",
            &[("Command", "strategy")],
            &[],
            dir.path(),
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Strategy\n"));
        assert!(text.contains("the body"));
    }
}
