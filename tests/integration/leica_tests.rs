//! End-to-end tests for opening Leica SCN slides.

use super::test_utils::*;

use wsi_inspect::{can_open, FormatError, Slide, TiffError, TileError};

async fn open(data: Vec<u8>) -> Result<Slide<TrackingMockReader>, FormatError> {
    Slide::open(TrackingMockReader::new(data, "test.scn")).await
}

// =============================================================================
// Successful Opens
// =============================================================================

#[tokio::test]
async fn test_open_leica_levels_in_width_order() {
    let slide = open(leica_slide()).await.unwrap();

    assert_eq!(slide.vendor(), "leica");
    assert_eq!(slide.level_count(), 3);
    assert_eq!(slide.dimensions(), Some((1024, 768)));

    let dirs: Vec<i64> = (0..3).map(|i| slide.level(i).unwrap().directory).collect();
    assert_eq!(dirs, vec![0, 1, 2]);

    let widths: Vec<u32> = (0..3).map(|i| slide.level(i).unwrap().width).collect();
    assert_eq!(widths, vec![1024, 512, 256]);

    assert_eq!(slide.level(0).unwrap().downsample, 1.0);
    assert_eq!(slide.level(1).unwrap().downsample, 2.0);
    assert_eq!(slide.level(2).unwrap().downsample, 4.0);
}

#[tokio::test]
async fn test_open_leica_properties() {
    let slide = open(leica_slide()).await.unwrap();
    let props = slide.properties();

    assert_eq!(props.get("openslide.vendor"), Some("leica"));
    assert_eq!(props.get("leica.barcode"), Some("SLIDE-42"));
    assert_eq!(props.get("leica.device-model"), Some("Leica SCN400"));
    assert_eq!(props.get("leica.device-version"), Some("1.5.1"));
    assert_eq!(props.get("leica.creation-date"), Some("2012-03-08T10:12:41.95Z"));
    assert_eq!(props.get("leica.objective"), Some("20"));
    assert_eq!(props.get("leica.aperture"), Some("0.4"));
    assert_eq!(props.get("leica.illumination-source"), Some("brightfield"));
    assert_eq!(props.get("tiff.Software"), Some("Leica SCN400;Leica SCN 1.5.1"));
    assert_eq!(props.get("tiff.Make"), Some("Leica Microsystems"));

    // The raw XML is not exposed
    assert!(!props.contains("tiff.ImageDescription"));
    assert!(!props.contains("openslide.comment"));

    let hash = props.get("openslide.quickhash-1").unwrap();
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_open_leica_macro_image() {
    let slide = open(leica_slide()).await.unwrap();
    let images = slide.associated_images();

    assert_eq!(images.names().collect::<Vec<_>>(), vec!["macro"]);
    let macro_image = images.get("macro").unwrap();
    assert_eq!(macro_image.directory, 3);
    assert_eq!((macro_image.width, macro_image.height), (200, 100));
}

#[tokio::test]
async fn test_open_big_endian_classic_tiff() {
    let builder = TiffBuilder::new()
        .with_bigtiff(false)
        .with_byte_order(ByteOrderType::BigEndian)
        .add_directory(
            DirectoryBuilder::tiled(
                512,
                512,
                256,
                256,
                COMPRESSION_JPEG,
                create_solid_jpeg(256, 256, [10, 200, 10]),
            )
            .ascii(
                TAG_IMAGE_DESCRIPTION,
                &scn_document((9000, 9000), &scn_image((512, 512), &[(512, 512, 0)], "")),
            ),
        );
    let slide = open(builder.build()).await.unwrap();

    assert_eq!(slide.level_count(), 1);
    assert!(slide.associated_images().is_empty());
    assert!(!slide.properties().contains("leica.barcode"));
}

#[tokio::test]
async fn test_open_level_beyond_hundredth_directory() {
    let tile = create_solid_jpeg(256, 256, [10, 10, 200]);
    let description = scn_document(
        (9000, 9000),
        &scn_image((1024, 768), &[(512, 384, 104), (1024, 768, 0)], ""),
    );
    let mut builder = TiffBuilder::new().with_bigtiff(true).add_directory(
        DirectoryBuilder::tiled(1024, 768, 256, 256, COMPRESSION_JPEG, tile.clone())
            .ascii(TAG_IMAGE_DESCRIPTION, &description),
    );
    for _ in 1..104 {
        builder = builder.add_directory(DirectoryBuilder::plain(16, 16, 1));
    }
    builder = builder.add_directory(DirectoryBuilder::tiled(
        512,
        384,
        256,
        256,
        COMPRESSION_JPEG,
        tile,
    ));

    let slide = open(builder.build()).await.unwrap();
    assert_eq!(slide.level_count(), 2);
    assert_eq!(slide.level(1).unwrap().directory, 104);
    assert_eq!(slide.level(1).unwrap().width, 512);
}

#[tokio::test]
async fn test_oversized_bits_per_sample_fails_open() {
    let tile = create_solid_jpeg(256, 256, [1, 2, 3]);
    let description = scn_document((9000, 9000), &scn_image((256, 256), &[(256, 256, 0)], ""));
    let data = TiffBuilder::new()
        .add_directory(
            DirectoryBuilder::tiled(256, 256, 256, 256, COMPRESSION_JPEG, tile)
                .long(TAG_BITS_PER_SAMPLE, 65536 + 8)
                .ascii(TAG_IMAGE_DESCRIPTION, &description),
        )
        .build();

    assert!(matches!(
        open(data).await,
        Err(FormatError::Tiff(TiffError::InvalidTagValue {
            tag: "BitsPerSample",
            ..
        }))
    ));
}

// =============================================================================
// Quickhash
// =============================================================================

#[tokio::test]
async fn test_quickhash_is_stable_and_content_sensitive() {
    let a = open(leica_slide()).await.unwrap();
    let b = open(leica_slide()).await.unwrap();
    assert_eq!(
        a.properties().get("openslide.quickhash-1"),
        b.properties().get("openslide.quickhash-1")
    );

    let other_tiles = leica_builder(&leica_descriptor(), create_solid_jpeg(256, 256, [0, 0, 255]));
    let c = open(other_tiles.build()).await.unwrap();
    assert_ne!(
        a.properties().get("openslide.quickhash-1"),
        c.properties().get("openslide.quickhash-1")
    );
}

#[tokio::test]
async fn test_quickhash_limit_fails_open() {
    let description = scn_document((9000, 9000), &scn_image((100, 100), &[(256, 256, 0)], ""));
    let huge_tile = vec![0u8; (5 << 20) + 1];
    let data = TiffBuilder::new()
        .with_bigtiff(true)
        .add_directory(
            DirectoryBuilder::tiled(256, 256, 256, 256, COMPRESSION_JPEG, huge_tile)
                .ascii(TAG_IMAGE_DESCRIPTION, &description),
        )
        .build();

    assert!(matches!(open(data).await, Err(FormatError::Quickhash(_))));
}

// =============================================================================
// Tiles
// =============================================================================

#[tokio::test]
async fn test_read_tiles() {
    let slide = open(leica_slide()).await.unwrap();

    let raw = slide.read_raw_tile(0, 3, 2).await.unwrap();
    assert_eq!(&raw[..2], &[0xFF, 0xD8]);

    let tile = slide.read_tile(2, 0, 0).await.unwrap();
    assert_eq!(tile.dimensions(), (256, 256));
    let [r, g, b] = tile.get_pixel(100, 100).0;
    assert!(r > 150 && g < 90 && b < 90);
}

#[tokio::test]
async fn test_read_tile_out_of_range() {
    let slide = open(leica_slide()).await.unwrap();

    assert!(matches!(
        slide.read_raw_tile(3, 0, 0).await,
        Err(TileError::InvalidLevel {
            level: 3,
            max_levels: 3
        })
    ));
    assert!(matches!(
        slide.read_raw_tile(0, 4, 0).await,
        Err(TileError::TileOutOfBounds {
            max_x: 4,
            max_y: 3,
            ..
        })
    ));
}

// =============================================================================
// Declined Files
// =============================================================================

#[tokio::test]
async fn test_plain_tiled_tiff_unrecognized() {
    let data = TiffBuilder::new()
        .add_directory(
            DirectoryBuilder::tiled(256, 256, 256, 256, COMPRESSION_JPEG, vec![0xFF, 0xD8])
                .ascii(TAG_IMAGE_DESCRIPTION, "Aperio Image Library v10.0.50"),
        )
        .build();
    let reader = TrackingMockReader::new(data.clone(), "plain.tif");

    assert!(!can_open(&reader).await);
    assert!(matches!(open(data).await, Err(FormatError::Unrecognized)));
}

#[tokio::test]
async fn test_untiled_leica_unrecognized() {
    let data = TiffBuilder::new()
        .add_directory(
            DirectoryBuilder::plain(1024, 768, COMPRESSION_JPEG)
                .ascii(TAG_IMAGE_DESCRIPTION, &leica_descriptor()),
        )
        .build();

    assert!(matches!(open(data).await, Err(FormatError::Unrecognized)));
}

#[tokio::test]
async fn test_missing_level_directory_unrecognized() {
    // The descriptor names directory 2; only 0 and 1 exist
    let tile = create_solid_jpeg(256, 256, [1, 2, 3]);
    let data = TiffBuilder::new()
        .with_bigtiff(true)
        .add_directory(
            DirectoryBuilder::tiled(1024, 768, 256, 256, COMPRESSION_JPEG, tile.clone())
                .ascii(TAG_IMAGE_DESCRIPTION, &leica_descriptor()),
        )
        .add_directory(DirectoryBuilder::tiled(
            512,
            384,
            256,
            256,
            COMPRESSION_JPEG,
            tile,
        ))
        .build();

    assert!(matches!(open(data).await, Err(FormatError::Unrecognized)));
}

#[tokio::test]
async fn test_unsupported_level_compression_unrecognized() {
    let tile = create_solid_jpeg(256, 256, [1, 2, 3]);
    let description = leica_descriptor();
    let data = TiffBuilder::new()
        .with_bigtiff(true)
        .add_directory(
            DirectoryBuilder::tiled(1024, 768, 256, 256, COMPRESSION_JPEG, tile.clone())
                .ascii(TAG_IMAGE_DESCRIPTION, &description),
        )
        .add_directory(DirectoryBuilder::tiled(512, 384, 256, 256, 5, tile.clone()))
        .add_directory(DirectoryBuilder::tiled(
            256,
            192,
            256,
            256,
            COMPRESSION_JPEG,
            tile,
        ))
        .add_directory(DirectoryBuilder::plain(200, 100, COMPRESSION_JPEG))
        .build();
    let reader = TrackingMockReader::new(data, "lzw.scn");

    assert!(!can_open(&reader).await);
}

#[tokio::test]
async fn test_bad_macro_keeps_slide() {
    let tile = create_solid_jpeg(256, 256, [1, 2, 3]);
    let data = leica_builder(&leica_descriptor(), tile.clone()).build();
    let with_macro = open(data).await.unwrap();
    assert_eq!(with_macro.associated_images().len(), 1);

    // Same slide, but the macro directory is LZW
    let data = TiffBuilder::new()
        .with_bigtiff(true)
        .add_directory(
            DirectoryBuilder::tiled(1024, 768, 256, 256, COMPRESSION_JPEG, tile.clone())
                .ascii(TAG_IMAGE_DESCRIPTION, &leica_descriptor()),
        )
        .add_directory(DirectoryBuilder::tiled(
            512,
            384,
            256,
            256,
            COMPRESSION_JPEG,
            tile.clone(),
        ))
        .add_directory(DirectoryBuilder::tiled(
            256,
            192,
            256,
            256,
            COMPRESSION_JPEG,
            tile,
        ))
        .add_directory(DirectoryBuilder::plain(200, 100, 5))
        .build();
    let without_macro = open(data).await.unwrap();

    assert!(without_macro.associated_images().is_empty());
    assert_eq!(without_macro.level_count(), 3);
}

#[tokio::test]
async fn test_not_a_tiff() {
    let reader = TrackingMockReader::new(b"GIF89a not a tiff at all".to_vec(), "x.gif");
    assert!(!can_open(&reader).await);
    assert!(matches!(
        Slide::open(reader).await,
        Err(FormatError::Tiff(_))
    ));
}
