//! Integration tests for chunked batch preprocessing.
//!
//! Tests cover:
//! - Dropping unreadable rows while keeping manifest order
//! - Identical output for every chunk size
//! - Parallel decoding matching sequential decoding
//! - Shape and value range of the produced tensor

mod common;

use common::*;
use faceprep::dataset::BatchPreprocessor;
use faceprep::{preprocess_image, process_in_batches, process_manifest};
use ndarray::{Array4, Axis};
use tempfile::TempDir;

fn bits(images: &Array4<f32>) -> Vec<u32> {
    images.iter().map(|v| v.to_bits()).collect()
}

#[test]
fn test_missing_row_is_dropped() -> anyhow::Result<()> {
    // 1. Two readable JPEGs around a path that does not exist
    let dir = TempDir::new()?;
    let a = gradient_image(dir.path(), "a.jpg", 3);
    let b = gradient_image(dir.path(), "b.jpg", 200);
    let rows = vec![
        ManifestRow::new(&a, Label::Real),
        ManifestRow::new(dir.path().join("missing.jpg"), Label::Fake),
        ManifestRow::new(&b, Label::Real),
    ];

    // 2. Process with a chunk size smaller than the manifest
    let batch = process_in_batches(&rows, 2, small_size(), true)?;

    // 3. Only the readable rows survive, in order
    assert_eq!(batch.images.dim(), (2, 12, 16, 3));
    assert_eq!(batch.labels.to_vec(), vec![1, 1]);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].index, 1);

    // 4. Each slot holds exactly what single-image preprocessing produces
    let expected_a = preprocess_image(&a, small_size(), true)?;
    let expected_b = preprocess_image(&b, small_size(), true)?;
    assert_eq!(batch.images.index_axis(Axis(0), 0), expected_a);
    assert_eq!(batch.images.index_axis(Axis(0), 1), expected_b);

    Ok(())
}

#[test]
fn test_chunk_size_does_not_change_output() -> anyhow::Result<()> {
    // 1. Seven rows with two failures scattered through them
    let dir = TempDir::new()?;
    let mut rows = gradient_manifest(dir.path(), 5);
    rows.insert(1, ManifestRow::new(dir.path().join("gone_1.png"), Label::Real));
    rows.insert(4, ManifestRow::new(dir.path().join("gone_2.png"), Label::Fake));
    let pre = Preprocessor::new().with_target_size(small_size());

    // 2. Reference run with one chunk holding everything
    let reference = process_manifest(&rows, rows.len(), &pre)?;
    assert_eq!(reference.len(), 5);

    // 3. Every other chunk size gives bit-identical tensors and labels
    for batch_size in 1..=rows.len() + 2 {
        let batch = process_manifest(&rows, batch_size, &pre)?;
        assert_eq!(bits(&batch.images), bits(&reference.images), "batch_size {}", batch_size);
        assert_eq!(batch.labels, reference.labels);
        assert_eq!(batch.failures, reference.failures);
    }

    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut rows = gradient_manifest(dir.path(), 9);
    rows.push(ManifestRow::new(dir.path().join("nope.png"), Label::Real));
    let pre = Preprocessor::new().with_target_size(small_size());

    let sequential = BatchPreprocessor::new(pre.clone(), 4).run(&rows)?;
    let parallel = BatchPreprocessor::new(pre, 4).with_parallel(true).run(&rows)?;

    assert_eq!(bits(&parallel.images), bits(&sequential.images));
    assert_eq!(parallel.labels, sequential.labels);
    assert_eq!(parallel.failures, sequential.failures);

    Ok(())
}

#[test]
fn test_corrupt_files_are_isolated() -> anyhow::Result<()> {
    // 1. Readable images plus a truncated file and a text file
    let dir = TempDir::new()?;
    let mut rows = gradient_manifest(dir.path(), 4);
    let truncated = dir.path().join("truncated.png");
    std::fs::write(&truncated, &std::fs::read(&rows[0].path)?[..20])?;
    let text = dir.path().join("notes.jpg");
    std::fs::write(&text, "not an image")?;
    rows.insert(2, ManifestRow::new(&truncated, Label::Real));
    rows.push(ManifestRow::new(&text, Label::Fake));

    // 2. N - K rows remain
    let batch = process_manifest(&rows, 3, &Preprocessor::new().with_target_size(small_size()))?;
    assert_eq!(batch.len(), 4);
    assert_eq!(batch.images.shape()[0], batch.labels.len());
    let failed: Vec<usize> = batch.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![2, 5]);

    Ok(())
}

#[test]
fn test_values_stay_in_unit_range() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut rows = gradient_manifest(dir.path(), 3);
    rows.push(ManifestRow::new(solid_image(dir.path(), "black.png", 0), Label::Fake));
    rows.push(ManifestRow::new(solid_image(dir.path(), "white.png", 255), Label::Real));

    for mode in [ContrastMode::None, ContrastMode::MaxStretch, ContrastMode::percentile()] {
        let pre = Preprocessor::new().with_target_size(small_size()).with_contrast(mode);
        let batch = process_manifest(&rows, 2, &pre)?;
        assert_eq!(batch.len(), 5);
        assert!(batch.images.iter().all(|&v| (0.0..=1.0).contains(&v)), "{:?}", mode);
    }

    Ok(())
}

#[test]
fn test_stretch_flag_selects_contrast_mode() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let rows = gradient_manifest(dir.path(), 3);

    for stretch in [true, false] {
        let mode = ContrastMode::from_stretch_flag(stretch);
        let expected = process_manifest(
            &rows,
            2,
            &Preprocessor::new().with_target_size(small_size()).with_contrast(mode),
        )?;
        let batch = process_in_batches(&rows, 2, small_size(), stretch)?;
        assert_eq!(bits(&batch.images), bits(&expected.images));
        assert_eq!(batch.labels, expected.labels);
    }

    Ok(())
}

#[test]
fn test_zero_batch_size_is_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let rows = gradient_manifest(dir.path(), 2);
    let err = process_manifest(&rows, 0, &Preprocessor::new()).unwrap_err();
    assert!(matches!(err, PrepError::InvalidParameter(_)));
    Ok(())
}
