//! Dimension file parsing.
//!
//! A dimension file describes one spatio-temporal dataset:
//!
//! ```text
//! 64 64 1          <- width height depth (depth 1 = planar data)
//! 120              <- number of frames
//! frames/t0.raw    <- one frame path per line, relative to this file
//! frames/t1.raw
//! ...
//! ```

use super::ConfigError;
use crate::field::Extents;
use std::path::{Path, PathBuf};

/// Contents of a parsed dimension file.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionFile {
    /// Spatial extents of every frame.
    pub extents: Extents,
    /// Frame paths, resolved against the dimension file's directory.
    pub frames: Vec<PathBuf>,
}

impl DimensionFile {
    /// Loads and parses a dimension file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(format!("{}: {}", path.display(), e)))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&content, base)
    }

    /// Parses dimension file content, resolving frame paths against `base`.
    pub fn parse(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut lines = content.lines();

        let header = lines
            .next()
            .ok_or_else(|| ConfigError::MalformedDimensions("empty dimension file".into()))?;
        let sizes = header
            .split_whitespace()
            .map(|v| v.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::MalformedDimensions(format!("extents line: {}", e)))?;
        let [width, height, depth] = sizes[..] else {
            return Err(ConfigError::MalformedDimensions(format!(
                "expected 3 extents, found {}",
                sizes.len()
            )));
        };
        if width == 0 || height == 0 || depth == 0 {
            return Err(ConfigError::InvalidDimensions);
        }

        let duration = lines
            .next()
            .ok_or_else(|| ConfigError::MalformedDimensions("missing frame count".into()))?
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::MalformedDimensions(format!("frame count: {}", e)))?;

        let frames: Vec<PathBuf> = lines
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(duration)
            .map(|l| base.join(l))
            .collect();
        if frames.len() != duration {
            return Err(ConfigError::FrameCountMismatch {
                expected: duration,
                found: frames.len(),
            });
        }

        Ok(Self {
            extents: Extents::new(width, height, depth),
            frames,
        })
    }

    /// Number of frames in the dataset.
    #[inline]
    pub fn duration(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_volume() {
        let content = "5 4 3\n2\na.raw\nsub/b.raw\n";
        let dims = DimensionFile::parse(content, Path::new("/data")).unwrap();

        assert_eq!(dims.extents, Extents::new(5, 4, 3));
        assert_eq!(dims.duration(), 2);
        assert_eq!(dims.frames[1], PathBuf::from("/data/sub/b.raw"));
    }

    #[test]
    fn test_parse_planar() {
        let dims = DimensionFile::parse("8 8 1\n1\nf.raw", Path::new("")).unwrap();
        assert!(!dims.extents.is_volumetric());
    }

    #[test]
    fn test_missing_frames() {
        let result = DimensionFile::parse("2 2 1\n3\na\nb\n", Path::new(""));
        assert!(matches!(
            result,
            Err(ConfigError::FrameCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            DimensionFile::parse("2 2\n1\na\n", Path::new("")),
            Err(ConfigError::MalformedDimensions(_))
        ));
        assert!(matches!(
            DimensionFile::parse("2 x 1\n1\na\n", Path::new("")),
            Err(ConfigError::MalformedDimensions(_))
        ));
        assert!(matches!(
            DimensionFile::parse("0 2 1\n1\na\n", Path::new("")),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dims.txt");
        std::fs::write(&path, "2 2 1\n1\nframe0.raw\n").unwrap();

        let dims = DimensionFile::from_file(&path).unwrap();
        assert_eq!(dims.frames[0], dir.path().join("frame0.raw"));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            DimensionFile::from_file("/definitely/not/here.txt"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
