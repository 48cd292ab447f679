use crate::domain::models::FileEntry;

/// Renders the collected entries as the flat snapshot text.
///
/// Each entry is a `File:` header with the forward-slash relative path; when
/// content was embedded it follows under a `Content:` line with a blank-line
/// separator between entries. In paths-only mode only the header lines appear.
pub fn render_snapshot(entries: &[FileEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        match &entry.content {
            Some(content) => {
                out.push_str(&format!(
                    "File: {}\nContent:\n{}\n\n",
                    entry.relative_path, content
                ));
            }
            None => {
                out.push_str(&format!("File: {}\n", entry.relative_path));
            }
        }
    }
    out
}

pub fn snapshot_file_name(project_name: &str) -> String {
    format!("{project_name}_contents.txt")
}

pub fn archive_file_name(project_name: &str) -> String {
    format!("{project_name}.zip")
}
