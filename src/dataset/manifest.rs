use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{PrepError, Result};
use crate::models::{Label, ManifestRow};

/// Ordered, immutable list of labeled samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    rows: Vec<ManifestRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub fake: usize,
    pub real: usize,
}

impl ClassCounts {
    pub fn total(&self) -> usize {
        self.fake + self.real
    }
}

impl Manifest {
    pub fn new(rows: Vec<ManifestRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestRow> {
        self.rows.iter()
    }

    pub fn class_counts(&self) -> ClassCounts {
        self.rows
            .iter()
            .fold(ClassCounts::default(), |mut counts, row| {
                match row.label {
                    Label::Fake => counts.fake += 1,
                    Label::Real => counts.real += 1,
                }
                counts
            })
    }

    /// Random subset of `n` rows without replacement, in sampled order.
    pub fn sample(&self, n: usize, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..self.rows.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
        indices.truncate(n);
        Self {
            rows: indices.into_iter().map(|i| self.rows[i].clone()).collect(),
        }
    }

    /// Read a CSV manifest with a header row naming a `label` column and a
    /// `full_path` or `path` column. Relative paths are joined onto `base_dir`.
    pub fn from_csv(path: &Path, base_dir: Option<&Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_csv(&text, base_dir)
    }

    pub fn parse_csv(text: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let (header_line, header) = lines.next().ok_or(PrepError::Manifest {
            line: 1,
            reason: "manifest is empty".to_string(),
        })?;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |name: &str| columns.iter().position(|c| *c == name);

        let path_col = find("full_path")
            .or_else(|| find("path"))
            .ok_or_else(|| PrepError::Manifest {
                line: header_line,
                reason: "header has no 'full_path' or 'path' column".to_string(),
            })?;
        let label_col = find("label").ok_or_else(|| PrepError::Manifest {
            line: header_line,
            reason: "header has no 'label' column".to_string(),
        })?;

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let fields: Vec<&str> = line.split(',').collect();
            let field = |idx: usize| {
                fields.get(idx).map(|f| f.trim()).ok_or_else(|| PrepError::Manifest {
                    line: line_no,
                    reason: format!("expected {} columns, found {}", columns.len(), fields.len()),
                })
            };

            let raw_path = field(path_col)?;
            if raw_path.is_empty() {
                return Err(PrepError::Manifest {
                    line: line_no,
                    reason: "empty path".to_string(),
                });
            }
            let label: Label = field(label_col)?.parse().map_err(|e: PrepError| PrepError::Manifest {
                line: line_no,
                reason: e.to_string(),
            })?;

            let path = match base_dir {
                Some(base) if Path::new(raw_path).is_relative() => base.join(raw_path),
                _ => PathBuf::from(raw_path),
            };
            rows.push(ManifestRow { path, label });
        }

        Ok(Self { rows })
    }

    /// Build a manifest from `root/real/*` and `root/fake/*`, sorted by path.
    pub fn from_class_dirs(root: &Path) -> Result<Self> {
        let mut rows = Vec::new();
        let mut found_any = false;

        for (dir_name, label) in [("fake", Label::Fake), ("real", Label::Real)] {
            let dir = root.join(dir_name);
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "class directory not found");
                continue;
            }
            found_any = true;
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_file() {
                    rows.push(ManifestRow { path, label });
                }
            }
        }

        if !found_any {
            return Err(PrepError::invalid(format!(
                "no 'real' or 'fake' directory under {}",
                root.display()
            )));
        }

        rows.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { rows })
    }
}

impl From<Vec<ManifestRow>> for Manifest {
    fn from(rows: Vec<ManifestRow>) -> Self {
        Self::new(rows)
    }
}

impl AsRef<[ManifestRow]> for Manifest {
    fn as_ref(&self) -> &[ManifestRow] {
        &self.rows
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestRow;
    type IntoIter = std::slice::Iter<'a, ManifestRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Contents of one directory visited by [`scan_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSummary {
    pub path: PathBuf,
    pub directories: usize,
    pub files: usize,
}

/// Walk `root` recursively, depth-first in name order.
pub fn scan_directory(root: &Path) -> Result<Vec<DirSummary>> {
    let mut summaries = Vec::new();
    scan_into(root, &mut summaries)?;
    Ok(summaries)
}

fn scan_into(dir: &Path, summaries: &mut Vec<DirSummary>) -> Result<()> {
    let mut subdirs = Vec::new();
    let mut files = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else {
            files += 1;
        }
    }
    subdirs.sort();

    summaries.push(DirSummary {
        path: dir.to_path_buf(),
        directories: subdirs.len(),
        files,
    });
    for sub in subdirs {
        scan_into(&sub, summaries)?;
    }
    Ok(())
}
