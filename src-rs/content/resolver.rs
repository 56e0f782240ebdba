use std::path::Path;

use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::workspace::{Git, GitError};

use super::types::{TaskContent, WorkspaceFile, BINARY_PLACEHOLDER};

/// Turns a task workspace into either a diff or a file listing.
#[derive(Clone, Debug, Default)]
pub struct ContentResolver;

impl ContentResolver {
    pub fn new() -> Self {
        Self
    }

    pub async fn resolve(&self, workspace: Option<&Path>) -> TaskContent {
        let dir = match workspace {
            Some(dir) if dir.is_dir() => dir,
            _ => return TaskContent::Files(Vec::new()),
        };

        let git = Git::new(dir);
        if git.is_repository().await {
            return TaskContent::Diff(resolve_diff(&git).await);
        }

        let root = dir.to_path_buf();
        match tokio::task::spawn_blocking(move || list_files(&root)).await {
            Ok(files) => TaskContent::Files(files),
            Err(err) => {
                error!("file listing for {} aborted: {}", dir.display(), err);
                TaskContent::Files(Vec::new())
            }
        }
    }
}

async fn resolve_diff(git: &Git) -> Option<String> {
    match collect_diff(git).await {
        Ok(diff) => diff,
        Err(err) => {
            warn!("Error getting detailed diff for {}: {}", git.dir().display(), err);
            match git.diff_head().await {
                Ok(diff) if !diff.trim().is_empty() => Some(diff.trim_end_matches('\n').to_string()),
                Ok(_) => None,
                Err(err) => {
                    error!("Error getting git diff for {}: {}", git.dir().display(), err);
                    None
                }
            }
        }
    }
}

async fn collect_diff(git: &Git) -> Result<Option<String>, GitError> {
    let mut parts = Vec::new();

    for diff in [git.diff_staged().await?, git.diff_unstaged().await?] {
        let diff = diff.trim_end_matches('\n');
        if !diff.is_empty() {
            parts.push(diff.to_string());
        }
    }

    for path in git.untracked_files().await? {
        let full_path = git.dir().join(&path);
        if !full_path.is_file() {
            continue;
        }
        match tokio::fs::read(&full_path).await.map(String::from_utf8) {
            Ok(Ok(text)) => parts.push(untracked_file_diff(&path, &text)),
            Ok(Err(_)) => debug!("Skipping untracked binary file {}", path),
            Err(err) => debug!("Skipping untracked file {}: {}", path, err),
        }
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("\n")))
    }
}

/// Renders an untracked file as a whole-file addition in unified diff form.
pub fn untracked_file_diff(path: &str, text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut block = format!(
        "diff --git a/{path} b/{path}\nnew file mode 100644\nindex 0000000..0000000\n--- /dev/null\n+++ b/{path}\n@@ -0,0 +1,{count} @@\n",
        path = path,
        count = lines.len()
    );
    for line in lines {
        block.push('+');
        block.push_str(line);
        block.push('\n');
    }
    block
}

fn list_files(root: &Path) -> Vec<WorkspaceFile> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        let name = entry.file_name().to_string_lossy().into_owned();
        let size = entry.metadata().map(|meta| meta.len()).unwrap_or(0);

        let (file_type, content) = match std::fs::read(path).map(String::from_utf8) {
            Ok(Ok(text)) => {
                let file_type = path
                    .extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "text".to_string());
                (file_type, text)
            }
            _ => ("binary".to_string(), BINARY_PLACEHOLDER.to_string()),
        };

        files.push(WorkspaceFile {
            path: relative,
            name,
            file_type,
            content,
            size,
        });
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_block_marks_every_line_added() {
        let block = untracked_file_diff("foo.txt", "hello\n");
        assert_eq!(
            block,
            "diff --git a/foo.txt b/foo.txt\nnew file mode 100644\nindex 0000000..0000000\n--- /dev/null\n+++ b/foo.txt\n@@ -0,0 +1,1 @@\n+hello\n"
        );
    }

    #[test]
    fn untracked_block_for_empty_file_has_zero_lines() {
        let block = untracked_file_diff("empty", "");
        assert!(block.ends_with("@@ -0,0 +1,0 @@\n"));
    }

    #[test]
    fn listing_keeps_binary_files_with_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        std::fs::write(dir.path().join("README"), "readme").unwrap();
        std::fs::write(dir.path().join("logo.png"), [0x89u8, 0x50, 0xff, 0xfe, 0x00]).unwrap();

        let files = list_files(dir.path());
        assert_eq!(files.len(), 3);

        let by_path = |p: &str| files.iter().find(|f| f.path == p).unwrap().clone();
        let main = by_path(&format!("src{}main.rs", std::path::MAIN_SEPARATOR));
        assert_eq!(main.name, "main.rs");
        assert_eq!(main.file_type, "rs");
        assert_eq!(main.content, "fn main() {}\n");
        assert_eq!(main.size, 13);

        assert_eq!(by_path("README").file_type, "text");

        let logo = by_path("logo.png");
        assert_eq!(logo.file_type, "binary");
        assert_eq!(logo.content, BINARY_PLACEHOLDER);
        assert_eq!(logo.size, 5);
    }
}
