//! Plain-text transcript logging for the chat loop.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut logging = LoggingState {
            file_path: log_file,
            is_active: false,
        };

        // A file provided on the command line enables logging immediately.
        if let Some(path) = logging.file_path.clone() {
            logging.test_file_access(&path)?;
            logging.is_active = true;
        }

        Ok(logging)
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        self.test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Logging resumed to: {path}"))
                } else {
                    Ok(format!("Logging paused (file: {path})"))
                }
            }
            None => {
                Err("No log file specified. Use /log <filename> to enable logging first.".into())
            }
        }
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        for line in content.lines() {
            writeln!(file, "{}", line)?;
        }

        // Blank line between messages, matching the on-screen spacing.
        writeln!(file)?;

        file.flush()?;
        Ok(())
    }

    pub fn get_status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!(
                "active ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
            (Some(path), false) => format!(
                "paused ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn inactive_logging_writes_nothing() {
        let logging = LoggingState::new(None).unwrap();
        logging.log_message("you> hello").unwrap();
        assert_eq!(logging.get_status_string(), "disabled");
    }

    #[test]
    fn messages_are_appended_with_spacing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        let logging = LoggingState::new(Some(path.to_string_lossy().into_owned())).unwrap();

        logging.log_message("you> hello").unwrap();
        logging.log_message("Found 1 event").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "you> hello\n\nFound 1 event\n\n");
    }

    #[test]
    fn toggle_requires_a_file() {
        let mut logging = LoggingState::new(None).unwrap();
        assert!(logging.toggle_logging().is_err());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.log");
        logging
            .set_log_file(path.to_string_lossy().into_owned())
            .unwrap();
        assert!(logging.toggle_logging().unwrap().contains("paused"));
        assert!(logging.toggle_logging().unwrap().contains("resumed"));
    }
}
