use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("mocktest"),
            )
        } else {
            ProjectDirs::from("", "", "mocktest").map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    /// Where the TUI writes its tracing output; stdout belongs to the terminal UI.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("mocktest.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lives_under_the_app_directory() {
        let path = AppDirs::log_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "mocktest.log");
        assert!(path.parent().unwrap().ends_with("mocktest"));
    }
}
