//! Integration tests for building manifests from disk.
//!
//! Tests cover:
//! - CSV manifests with relative paths
//! - Class-directory layouts
//! - Recursive directory summaries

mod common;

use common::*;
use faceprep::Manifest;
use faceprep::dataset::scan_directory;
use tempfile::TempDir;

#[test]
fn test_csv_manifest_resolves_against_base_dir() -> anyhow::Result<()> {
    // 1. Dataset layout plus a CSV using relative paths
    let dir = TempDir::new()?;
    std::fs::create_dir_all(dir.path().join("train/real"))?;
    std::fs::create_dir_all(dir.path().join("train/fake"))?;
    gradient_image(&dir.path().join("train/real"), "r1.jpg", 1);
    gradient_image(&dir.path().join("train/fake"), "f1.jpg", 2);
    let csv = dir.path().join("train.csv");
    std::fs::write(
        &csv,
        ",original_path,id,label,label_str,path\n\
         0,x,R1,1,real,train/real/r1.jpg\n\
         1,y,F1,0,fake,train/fake/f1.jpg\n",
    )?;

    // 2. Load it and check paths resolve to real files
    let manifest = Manifest::from_csv(&csv, Some(dir.path()))?;
    assert_eq!(manifest.len(), 2);
    assert!(manifest.iter().all(|row| row.path.is_file()));
    assert_eq!(manifest.rows()[0].label, Label::Real);

    // 3. The rows process cleanly
    let batch = faceprep::process_manifest(
        manifest.rows(),
        8,
        &Preprocessor::new().with_target_size(small_size()),
    )?;
    assert_eq!(batch.labels.to_vec(), vec![1, 0]);

    Ok(())
}

#[test]
fn test_malformed_csv_reports_line() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let csv = dir.path().join("bad.csv");
    std::fs::write(&csv, "label,path\n1,a.jpg\nmaybe,b.jpg\n")?;

    let err = Manifest::from_csv(&csv, None).unwrap_err();
    assert!(matches!(err, PrepError::Manifest { line: 3, .. }), "{}", err);

    Ok(())
}

#[test]
fn test_class_dirs_manifest() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let real = dir.path().join("real");
    let fake = dir.path().join("fake");
    std::fs::create_dir_all(&real)?;
    std::fs::create_dir_all(&fake)?;
    for i in 0..3 {
        gradient_image(&real, &format!("{}.png", i), i);
    }
    gradient_image(&fake, "0.png", 9);

    let manifest = Manifest::from_class_dirs(dir.path())?;
    let counts = manifest.class_counts();
    assert_eq!((counts.real, counts.fake), (3, 1));
    assert_eq!(counts.total(), manifest.len());

    // Missing both class directories is an error
    let empty = TempDir::new()?;
    assert!(Manifest::from_class_dirs(empty.path()).is_err());

    Ok(())
}

#[test]
fn test_scan_directory_counts() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    for split in ["train", "valid"] {
        for class in ["real", "fake"] {
            let sub = dir.path().join(split).join(class);
            std::fs::create_dir_all(&sub)?;
            solid_image(&sub, "a.png", 1);
            solid_image(&sub, "b.png", 2);
        }
    }
    std::fs::write(dir.path().join("train.csv"), "label,path\n")?;

    let summaries = scan_directory(dir.path())?;
    assert_eq!(summaries.len(), 7);
    assert_eq!(summaries[0].path, dir.path());
    assert_eq!((summaries[0].directories, summaries[0].files), (2, 1));
    assert_eq!(summaries[1].path, dir.path().join("train"));
    assert_eq!(summaries[2].path, dir.path().join("train/fake"));
    assert_eq!((summaries[2].directories, summaries[2].files), (0, 2));

    Ok(())
}
