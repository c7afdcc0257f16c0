//! Layout property tests across a range of geometries.

use super::test_utils::{plan, sample_geometries};
use geotiff_builder::{
    tag_schema, GeoMetadata, GhostHeader, ImageGeometry, RegionKind, TiffTag,
};

// =============================================================================
// Offset Closure
// =============================================================================

#[test]
fn test_regions_are_contiguous_for_all_geometries() {
    for geometry in sample_geometries() {
        let plan = plan(geometry);
        let offsets = plan.offsets();
        let regions = offsets.regions();

        assert_eq!(regions.len(), RegionKind::ORDER.len());
        assert_eq!(regions[0].offset, 0);
        for pair in regions.windows(2) {
            assert_eq!(
                pair[0].end(),
                pair[1].offset as u64,
                "{:?} does not end where {:?} begins",
                pair[0].kind,
                pair[1].kind
            );
        }
        let last = regions[regions.len() - 1];
        assert_eq!(last.kind, RegionKind::TilePixelData);
        assert_eq!(last.end(), offsets.total_len() as u64);
    }
}

#[test]
fn test_total_len_matches_pixel_data() {
    for geometry in sample_geometries() {
        let plan = plan(geometry);
        let grid = plan.grid();
        let offsets = plan.offsets();
        assert_eq!(
            offsets.total_len() - offsets.tile_data_offset(),
            grid.tile_count * grid.bytes_per_tile
        );
    }
}

#[test]
fn test_ghost_header_length_shifts_everything_after_it() {
    let geometry = ImageGeometry::default();
    let short = GhostHeader::from_items(&[("LAYOUT".to_string(), "IFDS_BEFORE_DATA".to_string())])
        .unwrap();
    let base = plan(geometry);
    let shifted = geotiff_builder::GeoTiffBuilder::new(geometry)
        .with_ghost_header(short.clone())
        .plan()
        .unwrap();

    let delta = base.offsets().length(RegionKind::GhostHeader) as i64
        - short.byte_len() as i64;
    for kind in RegionKind::ORDER.iter().skip(2) {
        assert_eq!(
            base.offsets().offset(*kind) as i64 - shifted.offsets().offset(*kind) as i64,
            delta,
            "{:?}",
            kind
        );
    }
}

// =============================================================================
// Tag Resolution
// =============================================================================

#[test]
fn test_tags_ascending_and_match_schema() {
    for geometry in sample_geometries() {
        let plan = plan(geometry);
        let entries = plan.entries();
        let schema = tag_schema();

        assert_eq!(entries.len(), schema.len());
        for (entry, spec) in entries.iter().zip(schema) {
            assert_eq!(entry.tag, spec.tag);
        }
        assert!(entries
            .windows(2)
            .all(|w| w[0].tag.as_u16() < w[1].tag.as_u16()));
    }
}

#[test]
fn test_out_of_line_tags_point_at_their_regions() {
    for geometry in sample_geometries() {
        let plan = plan(geometry);
        let offsets = plan.offsets();
        let pairs = [
            (TiffTag::TileOffsets, RegionKind::TileOffsets),
            (TiffTag::TileByteCounts, RegionKind::TileByteCounts),
            (TiffTag::ModelTransformation, RegionKind::ModelTransform),
            (TiffTag::GeoKeyDirectory, RegionKind::GeoKeyDirectory),
            (TiffTag::GeoDoubleParams, RegionKind::GeoDoubleParams),
            (TiffTag::GeoAsciiParams, RegionKind::GeoAsciiParams),
        ];

        for (tag, kind) in pairs {
            let entry = plan
                .entries()
                .iter()
                .find(|e| e.tag == tag)
                .unwrap();
            assert_eq!(
                entry.payload_len(),
                Some(offsets.length(kind) as u64),
                "{:?}",
                tag
            );
            if !entry.is_inline() {
                assert_eq!(entry.value_or_offset, offsets.offset(kind), "{:?}", tag);
            }
        }
    }
}

#[test]
fn test_metadata_parts_match_geo_blocks() {
    let geo = GeoMetadata::moon_2000();
    let plan = plan(ImageGeometry::default());
    let parts = plan.metadata();

    assert_eq!(
        parts.part(RegionKind::ModelTransform),
        &geo.model_transform().encode()
    );
    assert_eq!(
        parts.part(RegionKind::GeoKeyDirectory),
        &geo.key_directory().encode()
    );
    assert_eq!(
        parts.part(RegionKind::GeoDoubleParams),
        &geo.double_params().encode()
    );
    assert_eq!(
        parts.part(RegionKind::GeoAsciiParams),
        &geo.ascii_params().encode()
    );
}

// =============================================================================
// Concrete Layout
// =============================================================================

#[test]
fn test_default_layout_offsets() {
    let plan = plan(ImageGeometry::default());
    let offsets = plan.offsets();

    assert_eq!(offsets.offset(RegionKind::GhostHeader), 8);
    assert_eq!(offsets.length(RegionKind::GhostHeader), 183);
    assert_eq!(offsets.ifd_offset(), 191);
    assert_eq!(offsets.length(RegionKind::Ifd), 2 + 14 * 12 + 4);
    assert_eq!(offsets.offset(RegionKind::TileOffsets), 365);
    assert_eq!(offsets.offset(RegionKind::TileByteCounts), 621);
    assert_eq!(offsets.offset(RegionKind::ModelTransform), 877);
    assert_eq!(offsets.offset(RegionKind::GeoKeyDirectory), 1005);
    assert_eq!(offsets.offset(RegionKind::GeoDoubleParams), 1157);
    assert_eq!(offsets.offset(RegionKind::GeoAsciiParams), 1205);
    assert_eq!(offsets.tile_data_offset(), 1351);
    assert_eq!(offsets.total_len(), 1351 + 64 * 16384);
}

#[test]
fn test_plan_is_deterministic() {
    for geometry in sample_geometries() {
        let a = plan(geometry);
        let b = plan(geometry);
        assert_eq!(a.offsets(), b.offsets());
        assert_eq!(a.entries(), b.entries());
    }
}

#[test]
fn test_report_serializes_regions() {
    let report = plan(ImageGeometry::default()).report();
    let json = serde_json::to_value(&report).unwrap();
    let regions = json["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 10);
    assert_eq!(regions[2]["kind"], "Ifd");
    assert_eq!(json["total_len"], 1351 + 64 * 16384);
    assert_eq!(json["entries"].as_array().unwrap().len(), 14);
}
