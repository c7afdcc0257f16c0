//! Byte-level tests of assembled files and read-back through `inspect`.

use super::test_utils::{build, raw_entries, sample_geometries, u16_at, u32_at, IndexStampSource};
use geotiff_builder::{
    inspect, validate_file, BuildError, ConfigError, GeoMetadata, GeoTiffBuilder, GhostHeader,
    GradientFill, ImageGeometry, PixelSource, RandomFill, RegionKind, TiffTag, ValidationError,
};

// =============================================================================
// Structure
// =============================================================================

#[test]
fn test_header_and_ghost_header_bytes() {
    let file = build(ImageGeometry::default(), &mut RandomFill::seeded(1));
    let bytes = file.bytes();

    assert_eq!(&bytes[0..4], b"II*\0");
    assert_eq!(u32_at(bytes, 4), 191);

    let ghost = &bytes[8..191];
    assert!(ghost.starts_with(b"GDAL_STRUCTURAL_METADATA_SIZE=000140 bytes\n"));
    assert!(ghost.ends_with(b"KNOWN_INCOMPATIBLE_EDITION=NO\n "));
    assert_eq!(ghost, &GhostHeader::gdal_cog().encode()[..]);
}

#[test]
fn test_raw_directory_entries() {
    let file = build(ImageGeometry::default(), &mut RandomFill::seeded(2));
    let bytes = file.bytes();
    let entries = raw_entries(bytes);

    let expected: [(u16, u16, u32, u32); 14] = [
        (256, 4, 1, 1024),
        (257, 4, 1, 1024),
        (258, 4, 1, 8),
        (259, 4, 1, 1),
        (262, 4, 1, 1),
        (277, 4, 1, 1),
        (322, 4, 1, 128),
        (323, 4, 1, 128),
        (324, 4, 64, 365),
        (325, 4, 64, 621),
        (34264, 12, 16, 877),
        (34735, 3, 76, 1005),
        (34736, 12, 6, 1157),
        (34737, 2, 146, 1205),
    ];
    assert_eq!(entries, expected.to_vec());

    // next IFD pointer
    let ifd_end = 191 + 2 + 14 * 12;
    assert_eq!(u32_at(bytes, ifd_end), 0);
}

#[test]
fn test_tile_index_tables_address_pixel_data() {
    for geometry in sample_geometries() {
        let mut source = IndexStampSource::default();
        let file = build(geometry, &mut source);
        let bytes = file.bytes();
        let offsets = file.offsets();
        let tile_count = source.calls.len();

        assert_eq!(source.calls, (0..tile_count as u32).collect::<Vec<_>>());

        let offsets_at = offsets.offset(RegionKind::TileOffsets) as usize;
        let counts_at = offsets.offset(RegionKind::TileByteCounts) as usize;
        let bytes_per_tile = offsets.length(RegionKind::TilePixelData) as usize / tile_count;

        for i in 0..tile_count {
            let tile_offset = u32_at(bytes, offsets_at + 4 * i) as usize;
            let tile_len = u32_at(bytes, counts_at + 4 * i) as usize;
            assert_eq!(tile_len, bytes_per_tile);
            assert_eq!(
                tile_offset,
                offsets.tile_data_offset() as usize + i * bytes_per_tile
            );
            assert!(bytes[tile_offset..tile_offset + tile_len]
                .iter()
                .all(|&b| b == i as u8));
        }
        assert_eq!(bytes.len(), offsets.total_len() as usize);
    }
}

#[test]
fn test_geo_blocks_written_at_their_offsets() {
    let file = build(ImageGeometry::default(), &mut RandomFill::seeded(3));
    let geo = GeoMetadata::moon_2000();

    assert_eq!(
        file.region_bytes(RegionKind::ModelTransform),
        &geo.model_transform().encode()[..]
    );
    assert_eq!(
        file.region_bytes(RegionKind::GeoKeyDirectory),
        &geo.key_directory().encode()[..]
    );
    assert_eq!(
        file.region_bytes(RegionKind::GeoDoubleParams),
        &geo.double_params().encode()[..]
    );

    let ascii = file.region_bytes(RegionKind::GeoAsciiParams);
    assert_eq!(ascii.len(), 146);
    assert_eq!(ascii[145], b'|');
    assert!(ascii.starts_with(b"GCS Name = Moon 2000|"));

    let keys = file.region_bytes(RegionKind::GeoKeyDirectory);
    // KeyDirectoryVersion 1, revision 1.0, 18 keys
    assert_eq!(u16_at(keys, 0), 1);
    assert_eq!(u16_at(keys, 2), 1);
    assert_eq!(u16_at(keys, 4), 0);
    assert_eq!(u16_at(keys, 6), 18);
}

// =============================================================================
// Read-back
// =============================================================================

#[test]
fn test_inspect_round_trip_validates() {
    for geometry in sample_geometries() {
        let file = build(geometry, &mut GradientFill);
        let inspected = inspect(file.bytes()).unwrap();
        let validation = validate_file(&inspected);

        assert!(validation.is_valid, "{:?}: {:?}", geometry, validation.errors);
        assert!(validation.warnings.is_empty(), "{:?}", validation.warnings);

        assert_eq!(inspected.scalar(TiffTag::ImageWidth), Some(geometry.width));
        assert_eq!(inspected.scalar(TiffTag::ImageLength), Some(geometry.height));
        assert_eq!(inspected.scalar(TiffTag::TileWidth), Some(geometry.tile_width));
        assert_eq!(inspected.scalar(TiffTag::TileLength), Some(geometry.tile_length));
        assert_eq!(
            inspected.scalar(TiffTag::SamplesPerPixel),
            Some(geometry.samples_per_pixel as u32)
        );
        assert_eq!(inspected.ifd.next_ifd_offset, 0);
    }
}

#[test]
fn test_inspect_reads_geo_values() {
    let file = build(ImageGeometry::default(), &mut RandomFill::seeded(4));
    let inspected = inspect(file.bytes()).unwrap();
    let order = inspected.byte_order();

    let transform = inspected
        .entry(TiffTag::ModelTransformation)
        .and_then(|e| e.as_f64s(order))
        .unwrap();
    assert_eq!(transform.len(), 16);
    assert_eq!(transform[15], 1.0);

    let shorts = inspected
        .entry(TiffTag::GeoKeyDirectory)
        .and_then(|e| e.as_u16s(order))
        .unwrap();
    assert_eq!(shorts.len(), 76);
    assert_eq!(&shorts[..4], &[1, 1, 0, 18]);

    let text = inspected
        .entry(TiffTag::GeoAsciiParams)
        .and_then(|e| e.as_text())
        .unwrap();
    assert!(text.contains("SimpleCylindrical Moon|"));

    let ghost = inspected.ghost_header().unwrap().unwrap();
    assert_eq!(ghost, GhostHeader::gdal_cog());
}

#[test]
fn test_corrupted_ghost_header_fails_validation() {
    let file = build(ImageGeometry::grayscale(256, 256, 128), &mut RandomFill::seeded(5));
    let mut bytes = file.bytes().to_vec();
    // "000140" -> "000150"
    bytes[8 + 34] = b'5';

    let inspected = inspect(&bytes).unwrap();
    let validation = validate_file(&inspected);
    assert!(!validation.is_valid);
    assert!(validation
        .errors
        .iter()
        .any(|e| matches!(e, ValidationError::GhostHeader(_))));
}

#[test]
fn test_truncated_file_reports_tiles_out_of_bounds() {
    let file = build(ImageGeometry::grayscale(256, 256, 128), &mut RandomFill::seeded(6));
    let truncated = &file.bytes()[..file.len() - 1];

    let inspected = inspect(truncated).unwrap();
    let validation = validate_file(&inspected);
    assert!(validation
        .errors
        .iter()
        .any(|e| matches!(e, ValidationError::TileOutOfBounds { tile_index: 3, .. })));
}

// =============================================================================
// Single Tile
// =============================================================================

#[test]
fn test_single_tile_index_tables_are_inline() {
    let geometry = ImageGeometry::grayscale(128, 128, 128);
    let file = build(geometry, &mut RandomFill::seeded(7));
    let bytes = file.bytes();
    let entries = raw_entries(bytes);
    let offsets = file.offsets();

    let tile_offsets = entries.iter().find(|e| e.0 == 324).unwrap();
    let byte_counts = entries.iter().find(|e| e.0 == 325).unwrap();
    assert_eq!(*tile_offsets, (324, 4, 1, offsets.tile_data_offset()));
    assert_eq!(*byte_counts, (325, 4, 1, 128 * 128));

    assert!(validate_file(&inspect(bytes).unwrap()).is_valid);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_build_rejects_invalid_geometry() {
    let result = GeoTiffBuilder::new(ImageGeometry::grayscale(1000, 1024, 128)).plan();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::NotTileAligned { axis: "width", .. }))
    ));

    let geometry = ImageGeometry {
        bits_per_sample: 16,
        ..ImageGeometry::default()
    };
    assert!(matches!(
        GeoTiffBuilder::new(geometry).plan(),
        Err(BuildError::Config(ConfigError::UnsupportedBitsPerSample(16)))
    ));
}

#[test]
fn test_build_rejects_multi_sample_geometry() {
    let geometry = ImageGeometry {
        samples_per_pixel: 3,
        ..ImageGeometry::default()
    };
    assert!(matches!(
        GeoTiffBuilder::new(geometry).plan(),
        Err(BuildError::Config(ConfigError::UnsupportedSamplesPerPixel(3)))
    ));
}

#[test]
fn test_same_seed_same_bytes() {
    let geometry = ImageGeometry::grayscale(512, 256, 128);
    let a = build(geometry, &mut RandomFill::seeded(99));
    let b = build(geometry, &mut RandomFill::seeded(99));
    let c = build(geometry, &mut RandomFill::seeded(100));

    assert_eq!(a.bytes(), b.bytes());
    let data = a.offsets().tile_data_offset() as usize;
    assert_eq!(&a.bytes()[..data], &c.bytes()[..data]);
    assert_ne!(&a.bytes()[data..], &c.bytes()[data..]);
}

#[test]
fn test_closure_pixel_source() {
    let mut fill = |tile: u32, len: usize| vec![(tile * 2) as u8; len];
    let source: &mut dyn PixelSource = &mut fill;
    let file = build(ImageGeometry::grayscale(256, 128, 128), source);
    let data = file.region_bytes(RegionKind::TilePixelData);
    assert_eq!(data[0], 0);
    assert_eq!(data[128 * 128], 2);
}
