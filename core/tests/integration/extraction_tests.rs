//! Tag reading and calibration extraction on synthetic SEM files.

use super::test_utils::{TiffBuilder, SEM_METADATA_TAG};
use fibresem_core::extraction::{read_image, read_tags, IMAGE_LENGTH, IMAGE_WIDTH};
use fibresem_core::{
    Calibration, FibresemError, ImageRecord, LengthUnit, SampleNaming, SemExtractor, TagValue,
};
use tempfile::TempDir;

#[test]
fn test_little_endian_calibrated_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("PA6-3_0500u_s1_img01.tif");
    TiffBuilder::new(64, 48)
        .with_pixel_size("2.500 nm")
        .write_to(&path);

    let tags = read_tags(&path).unwrap();
    assert_eq!(tags.get(IMAGE_WIDTH).and_then(TagValue::as_unsigned), Some(64));
    assert_eq!(tags.get(IMAGE_LENGTH).and_then(TagValue::as_unsigned), Some(48));
    assert!(tags.contains(SEM_METADATA_TAG));

    let metadata = SemExtractor::from_file(&path).unwrap();
    assert_eq!(metadata.calibration, Calibration::new(2.5, "nm", "2.500 nm"));
    assert_eq!(metadata.block.get("Mag"), Some("5.00 K X"));
    assert_eq!((metadata.width, metadata.height), (Some(64), Some(48)));
}

#[test]
fn test_big_endian_file_matches_little_endian() {
    let dir = TempDir::new().unwrap();
    let le = dir.path().join("le.tif");
    let be = dir.path().join("be.tif");
    let builder = TiffBuilder::new(32, 32).with_pixel_size("10.0 nm");
    builder.write_to(&le);
    builder.big_endian().write_to(&be);

    let le_metadata = SemExtractor::from_file(&le).unwrap();
    let be_metadata = SemExtractor::from_file(&be).unwrap();
    assert_eq!(le_metadata, be_metadata);

    let (_, image) = read_image(&be).unwrap();
    assert_eq!((image.width(), image.height()), (32, 32));
}

#[test]
fn test_pixels_are_decoded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gradient.tif");
    let builder = TiffBuilder::new(20, 10);
    builder.write_to(&path);

    let (_, image) = read_image(&path).unwrap();
    assert_eq!(image.to_luma8().as_raw().as_slice(), builder.pixels());
}

#[test]
fn test_latin1_micro_sign() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.tif");
    let mut block = b"Image Pixel Size = 1.116 ".to_vec();
    block.push(0xB5);
    block.extend_from_slice(b"m\r\n\0");
    TiffBuilder::new(16, 16)
        .with_ascii(SEM_METADATA_TAG, block)
        .write_to(&path);

    let metadata = SemExtractor::from_file(&path).unwrap();
    assert_eq!(metadata.calibration.unit.as_deref(), Some("µm"));
    assert_eq!(metadata.conversion_factor(LengthUnit::Micrometre), 1.116);
}

#[test]
fn test_file_without_vendor_block() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.tif");
    TiffBuilder::new(16, 16)
        .with_ascii(271, b"Other Vendor\0".to_vec())
        .write_to(&path);

    let metadata = SemExtractor::from_file(&path).unwrap();
    assert!(metadata.block.is_empty());
    assert_eq!(metadata.calibration, Calibration::missing());
    assert_eq!(metadata.manufacturer.as_deref(), Some("Other Vendor"));
    assert!(metadata.conversion_factor(LengthUnit::Nanometre).is_nan());
}

#[test]
fn test_malformed_calibration_degrades_to_sentinel() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("malformed.tif");
    TiffBuilder::new(16, 16)
        .with_pixel_size("2.500")
        .write_to(&path);

    let metadata = SemExtractor::from_file(&path).unwrap();
    assert!(!metadata.has_calibration());
    assert_eq!(metadata.block.get("Image Pixel Size"), Some("2.500"));
}

#[test]
fn test_not_a_tiff() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fake.tif");
    std::fs::write(&path, b"GIF89a not a tiff at all").unwrap();

    match SemExtractor::from_file(&path) {
        Err(FibresemError::FileRead { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("expected FileRead, got {other:?}"),
    }
    assert!(read_image(&dir.path().join("missing.tif")).is_err());
}

#[test]
fn test_image_record_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("PA6-3_0500u_s1_img01.tif");
    TiffBuilder::new(40, 30)
        .with_pixel_size("4.0 nm")
        .write_to(&path);

    let record = ImageRecord::from_file(path.clone(), &SampleNaming::default()).unwrap();
    assert_eq!(record.file_path, path);
    assert_eq!(record.stem, "PA6-3_0500u_s1_img01");
    assert_eq!(record.sample_name, "PA6-3");
    assert_eq!(record.image_area(), Some(1200));
}
