use std::path::Path;

use log::warn;
use rand::Rng;

use crate::core::{Result, SupplierError};

/// The ordered line set every outbound payload is composed from.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LineSet {
    lines: Vec<String>,
}

impl LineSet {
    /// Read the line set from `path`. Failure here is fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            SupplierError::ConfigLoad(format!("cannot read '{}': {}", path.display(), err))
        })?;
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        if lines.is_empty() {
            warn!("line set '{}' is empty, payloads will be empty", path.display());
        }
        Ok(Self { lines })
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Build one outbound payload: every line gets a uniformly random integer
/// in `[0, 3)` appended as an extra comma-separated field, and the lines
/// are joined by newlines in their original order.
///
/// The separator format and value range are a contract with downstream
/// consumers of the feed.
pub fn compose(lines: &[String]) -> String {
    let mut rng = rand::thread_rng();
    lines
        .iter()
        .map(|line| format!("{},{}", line, rng.gen_range(0..3)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_lines() -> Vec<String> {
        vec![
            "51.5074,-0.1278".to_string(),
            "53.4808,-2.2426".to_string(),
            "55.9533,-3.1883".to_string(),
        ]
    }

    #[test]
    fn test_compose_preserves_count_and_order() {
        let lines = sample_lines();
        let payload = compose(&lines);
        let out: Vec<&str> = payload.lines().collect();
        assert_eq!(out.len(), lines.len());
        for (line, composed) in lines.iter().zip(&out) {
            assert!(composed.starts_with(line.as_str()));
        }
    }

    #[test]
    fn test_compose_appends_value_in_range() {
        let lines = sample_lines();
        // random augmentation, so sample a few rounds
        for _ in 0..50 {
            let payload = compose(&lines);
            for composed in payload.lines() {
                let suffix = composed.rsplit(',').next().unwrap();
                let value: u32 = suffix.parse().unwrap();
                assert!(value < 3, "augmentation {} out of range", value);
            }
        }
    }

    #[test]
    fn test_compose_empty_lines() {
        assert_eq!(compose(&[]), "");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "51.5074,-0.1278").unwrap();
        writeln!(file, "53.4808,-2.2426").unwrap();
        file.flush().unwrap();

        let set = LineSet::load(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.lines()[0], "51.5074,-0.1278");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = LineSet::load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, SupplierError::ConfigLoad(_)));
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let set = LineSet::load(file.path()).unwrap();
        assert!(set.is_empty());
    }
}
