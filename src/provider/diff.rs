use tracing::debug;

/// A contiguous changed region within a per-file patch.
///
/// Only the new-file side matters to the analyzers: `new_start` anchors the
/// line numbers reported for added lines.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Starting line number in the new version of the file.
    pub new_start: usize,
    /// Raw hunk lines, prefixed with '+', '-', or ' '.
    pub lines: Vec<String>,
}

/// One file section extracted from a full multi-file unified diff.
#[derive(Debug, Clone)]
pub struct DiffFile {
    pub path: String,
    /// "added", "deleted", or "modified".
    pub status: String,
    /// The file's patch text: hunk headers plus hunk lines.
    pub patch: String,
}

/// Parse a per-file patch (as returned by the GitHub/GitLab file APIs) into
/// hunks. Tolerant by design: a malformed hunk header anchors the hunk at
/// line 1 instead of failing, and anything outside a hunk is skipped.
pub fn parse_patch(patch: &str) -> Vec<Hunk> {
    let mut hunks: Vec<Hunk> = Vec::new();

    for line in patch.lines() {
        if line.starts_with("@@") {
            let new_start = parse_hunk_header(line).unwrap_or_else(|| {
                debug!(header = %line, "malformed hunk header, anchoring at line 1");
                1
            });
            hunks.push(Hunk {
                new_start,
                lines: Vec::new(),
            });
            continue;
        }

        if let Some(hunk) = hunks.last_mut() {
            // Blank context lines sometimes arrive with their leading space
            // stripped; keep them so line numbering stays aligned.
            if line.is_empty()
                || line.starts_with('+')
                || line.starts_with('-')
                || line.starts_with(' ')
            {
                hunk.lines.push(line.to_string());
            }
        }
    }

    hunks
}

/// Extract the new-file start line from a header like
/// `@@ -12,4 +15,6 @@ fn foo()`.
fn parse_hunk_header(line: &str) -> Option<usize> {
    let new_range = line
        .trim_start_matches("@@")
        .trim()
        .split_whitespace()
        .find(|part| part.starts_with('+'))?;
    let start = match new_range[1..].split_once(',') {
        Some((start, _count)) => start,
        None => &new_range[1..],
    };
    start.parse::<usize>().ok()
}

/// Split a full multi-file unified diff (e.g. the committed mock fixture)
/// into per-file sections.
pub fn split_diff(raw: &str) -> Vec<DiffFile> {
    let mut files: Vec<DiffFile> = Vec::new();
    let mut current: Option<DiffFile> = None;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(file) = current.take() {
                files.push(file);
            }
            let path = rest
                .split_whitespace()
                .last()
                .map(|p| p.strip_prefix("b/").unwrap_or(p))
                .unwrap_or("unknown")
                .to_string();
            current = Some(DiffFile {
                path,
                status: "modified".to_string(),
                patch: String::new(),
            });
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        if line.starts_with("--- ") && line[4..].trim() == "/dev/null" {
            file.status = "added".to_string();
            continue;
        }
        if line.starts_with("+++ ") && line[4..].trim() == "/dev/null" {
            file.status = "deleted".to_string();
            continue;
        }
        if line.starts_with("+++ ") || line.starts_with("--- ") || line.starts_with("index ") {
            continue;
        }
        if line.starts_with("new file mode") || line.starts_with("deleted file mode") {
            continue;
        }

        if line.starts_with("@@") || !file.patch.is_empty() {
            file.patch.push_str(line);
            file.patch.push('\n');
        }
    }

    if let Some(file) = current.take() {
        files.push(file);
    }
    files
}

/// Count (additions, deletions) in a patch.
pub fn count_changes(patch: &str) -> (usize, usize) {
    let mut additions = 0;
    let mut deletions = 0;
    for line in patch.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            deletions += 1;
        }
    }
    (additions, deletions)
}
