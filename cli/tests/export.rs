use std::io::Read;

use cli::{write_archive_file, CliConfig};
use cutout::{
    encode_png, DirectoryStore, ExportRequest, ExtractionSession, RasterImage,
};
use image::{Rgb, RgbImage};

fn scan() -> Vec<u8> {
    let mut img = RgbImage::from_pixel(120, 120, Rgb([255, 255, 255]));
    for (x0, y0) in [(10, 10), (70, 60)] {
        for y in y0..y0 + 40 {
            for x in x0..x0 + 40 {
                img.put_pixel(x, y, Rgb([30, 60, 90]));
            }
        }
    }
    encode_png(&RasterImage::from(img)).unwrap()
}

#[test]
fn extract_then_export_to_archive() {
    let dir = tempfile::tempdir().unwrap();
    let config = CliConfig::from_toml("[segmentation]\nmin_area = 100\n").unwrap();

    let store = DirectoryStore::create(dir.path().join("store")).unwrap();
    let session = ExtractionSession::with_config(store, &config.cutout);
    let summaries = session.extract(&scan()).unwrap();
    assert_eq!(summaries.len(), 2);

    // A fresh session over the same directory sees the stored crops.
    let reopened = ExtractionSession::with_config(
        DirectoryStore::create(dir.path().join("store")).unwrap(),
        &config.cutout,
    );
    assert_eq!(reopened.list().unwrap(), summaries);

    let request = ExportRequest {
        ids: vec!["object-2".into()],
        bg: "custom".into(),
        color: Some("#000000".into()),
    };
    let rendered = reopened.export(&request).unwrap();
    let archive_path = dir.path().join("objects.zip");
    write_archive_file(&archive_path, &rendered).unwrap();

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);

    let mut bytes = Vec::new();
    archive.by_name("object-2.png").unwrap().read_to_end(&mut bytes).unwrap();
    let png = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(png.dimensions(), (40, 40));
    assert_eq!(png.get_pixel(0, 0).0, [30, 60, 90]);
}
