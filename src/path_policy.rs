use crate::error::{FillError, Result};
use chrono::NaiveDateTime;
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
const MAX_CONFLICT_ATTEMPTS: u32 = 100_000;
const FALLBACK_STEM: &str = "작업계획서";
pub fn output_file_name(template_name: &str, at: NaiveDateTime) -> String {
    let stem = sanitize_file_stem(template_name);
    format!("{stem}_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}
pub fn decide_output_path(
    explicit: Option<&Path>,
    out_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let requested = explicit.map_or_else(|| out_dir.join(file_name), Path::to_path_buf);
    make_nonconflicting_path(&requested)
}
/// Writes `bytes` to a path that did not exist before. A partially written
/// file is removed again.
pub fn write_new_file(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    ensure_parent_dir(path)?;
    let mut seq = 0u32;
    loop {
        let candidate = candidate_with_suffix(path, seq);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                if let Err(source) = file.write_all(bytes).and_then(|()| file.sync_all()) {
                    drop(file);
                    if let Err(e) = fs::remove_file(&candidate) {
                        tracing::warn!(path = %candidate.display(), error = %e, "불완전한 출력 파일 삭제 실패");
                    }
                    return Err(FillError::Output {
                        path: candidate,
                        source,
                    });
                }
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                seq = next_seq(seq, path)?;
            }
            Err(source) => {
                return Err(FillError::Output {
                    path: candidate,
                    source,
                });
            }
        }
    }
}
fn make_nonconflicting_path(path: &Path) -> Result<PathBuf> {
    let mut seq = 0u32;
    loop {
        let candidate = candidate_with_suffix(path, seq);
        if !candidate.exists() {
            return Ok(candidate);
        }
        seq = next_seq(seq, path)?;
    }
}
fn next_seq(seq: u32, path: &Path) -> Result<u32> {
    match seq.checked_add(1) {
        Some(next) if next <= MAX_CONFLICT_ATTEMPTS => Ok(next),
        _ => Err(FillError::OutputConflict(path.to_path_buf())),
    }
}
fn ensure_parent_dir(path: &Path) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| FillError::Output {
        path: parent.to_path_buf(),
        source,
    })
}
fn candidate_with_suffix(path: &Path, seq: u32) -> PathBuf {
    if seq == 0 {
        return path.to_path_buf();
    }
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = path.extension().and_then(|s| s.to_str());
    let file_name = ext.map_or_else(
        || format!("{stem}_{seq}"),
        |ext| format!("{stem}_{seq}.{ext}"),
    );
    parent.join(file_name)
}
