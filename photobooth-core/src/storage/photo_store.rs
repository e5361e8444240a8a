use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::models::error::CameraError;

const STAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";
const RANDOM_SUFFIX_LEN: usize = 8;
const CREATE_ATTEMPTS: usize = 16;

/// `YYYY-MM-DD-HHMMSS-<suffix>.jpg`
pub fn capture_file_name(taken_at: &DateTime<Local>, suffix: &str) -> String {
    format!("{}-{}.jpg", taken_at.format(STAMP_FORMAT), suffix)
}

/// `YYYY-MM-DD-HHMMSS.jpg`, used by the fallback still camera.
pub fn fallback_file_name(taken_at: &DateTime<Local>) -> String {
    format!("{}.jpg", taken_at.format(STAMP_FORMAT))
}

fn random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..RANDOM_SUFFIX_LEN].to_string()
}

fn ensure_dir(dir: &Path) -> Result<(), CameraError> {
    fs::create_dir_all(dir)
        .map_err(|e| CameraError::Storage(format!("failed to create directory: {}", e)))
}

/// Save downloaded image bytes under a fresh, date-stamped name in `dir`.
///
/// The file is created exclusively, so two captures in the same second can
/// never overwrite each other.
pub fn save_capture(dir: &Path, bytes: &[u8]) -> Result<PathBuf, CameraError> {
    ensure_dir(dir)?;
    let now = Local::now();

    for _ in 0..CREATE_ATTEMPTS {
        let path = dir.join(capture_file_name(&now, &random_suffix()));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(CameraError::Storage(format!("failed to create file: {}", e)));
            }
        };
        file.write_all(bytes)
            .map_err(|e| CameraError::Storage(format!("failed to write photo: {}", e)))?;
        return Ok(path);
    }

    Err(CameraError::Storage("could not find a free file name".into()))
}

/// Path for a fallback capture in `dir`, creating the directory if needed.
///
/// The still camera writes the file itself, so this only picks a name that
/// is not taken yet: the plain stamp, or the stamp with a random suffix when
/// another photo was taken in the same second.
pub fn fallback_capture_path(dir: &Path) -> Result<PathBuf, CameraError> {
    ensure_dir(dir)?;
    free_fallback_path(dir, &Local::now())
}

fn free_fallback_path(dir: &Path, taken_at: &DateTime<Local>) -> Result<PathBuf, CameraError> {
    let path = dir.join(fallback_file_name(taken_at));
    if !path.exists() {
        return Ok(path);
    }
    for _ in 0..CREATE_ATTEMPTS {
        let path = dir.join(capture_file_name(taken_at, &random_suffix()));
        if !path.exists() {
            return Ok(path);
        }
    }
    Err(CameraError::Storage("could not find a free file name".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_format() {
        let taken_at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(capture_file_name(&taken_at, "abcd1234"), "2024-03-09-140507-abcd1234.jpg");
        assert_eq!(fallback_file_name(&taken_at), "2024-03-09-140507.jpg");
    }

    #[test]
    fn save_creates_directory_and_unique_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("captures");

        let first = save_capture(&dir, b"first").unwrap();
        let second = save_capture(&dir, b"second").unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"first");
        assert_eq!(fs::read(&second).unwrap(), b"second");

        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".jpg"));
        // YYYY-MM-DD-HHMMSS-xxxxxxxx.jpg
        assert_eq!(name.len(), 17 + 1 + RANDOM_SUFFIX_LEN + 4);
    }

    #[test]
    fn fallback_path_lives_in_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = fallback_capture_path(tmp.path()).unwrap();
        assert_eq!(path.parent(), Some(tmp.path()));
        assert!(path.to_string_lossy().ends_with(".jpg"));
    }

    #[test]
    fn fallback_path_avoids_photo_from_same_second() {
        let tmp = tempfile::tempdir().unwrap();
        let taken_at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let first = free_fallback_path(tmp.path(), &taken_at).unwrap();
        assert_eq!(first, tmp.path().join("2024-03-09-140507.jpg"));
        fs::write(&first, b"earlier photo").unwrap();

        let second = free_fallback_path(tmp.path(), &taken_at).unwrap();
        assert_ne!(second, first);
        assert!(!second.exists());
        let name = second.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("2024-03-09-140507-"));
        assert_eq!(fs::read(&first).unwrap(), b"earlier photo");
    }
}
