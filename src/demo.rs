use geo::{Coord, MultiPolygon, Rect};
use image::{Rgba, RgbaImage};

use crate::{CityCatalog, CityRecord, Dataset, RegionMap, RegionPolygon};

pub const DEMO_PHOTO_SIZE: (u32, u32) = (120, 160);

/// (number, name as written in the table, specialties, info, population,
/// area, lon/lat square west edge, south edge)
type DemoEntry = (u32, &'static str, &'static str, &'static str, u64, f64, f64, f64);

const SQUARE_SIDE: f64 = 0.4;

fn demo_entries() -> Vec<DemoEntry> {
    vec![
        (1, "札幌市", "時計台/ラーメン", "道庁所在地", 1_973_395, 1121.26, 141.0, 42.8),
        (2, "函館市", "朝市/夜景", "港町", 251_084, 677.87, 140.5, 41.7),
        (4, " 小樽市", "ガラス細工/寿司", "運河の街", 111_299, 243.83, 140.4, 43.0),
        (5, "旭川市", "旭山動物園/醤油ラーメン", "道北の中心", 329_306, 747.66, 142.2, 43.6),
        (13, "釧路市 ", "炉端焼き/湿原", "霧の街", 165_077, 1362.90, 144.0, 42.9),
        (39, "稚内市", "宗谷岬", "日本最北端の市", 32_617, 761.47, 141.6, 45.2),
    ]
}

pub fn demo_catalog() -> CityCatalog {
    let records = demo_entries()
        .into_iter()
        .map(
            |(number, name, points, info, population, area, _, _)| CityRecord {
                number,
                name: name.to_string(),
                points: crate::city::split_points(points),
                info: info.to_string(),
                population,
                area,
            },
        )
        .collect();

    CityCatalog::new(records).unwrap_or_default()
}

/// One square per demo city plus an unnamed square with no city.
pub fn demo_region() -> RegionMap {
    let mut polygons: Vec<RegionPolygon> = demo_entries()
        .into_iter()
        .map(|(_, name, _, _, _, _, west, south)| RegionPolygon {
            municipality: Some(name.trim().to_string()),
            geometry: square(west, south),
        })
        .collect();

    polygons.push(RegionPolygon {
        municipality: None,
        geometry: square(143.0, 44.2),
    });

    RegionMap::new(polygons)
}

pub fn demo_dataset() -> Dataset {
    Dataset::new(demo_catalog(), demo_region()).expect("demo cities all have polygons")
}

/// A stand-in sign: a blue panel with a white name plate across the bottom.
pub fn demo_photo(number: u32) -> RgbaImage {
    let (width, height) = DEMO_PHOTO_SIZE;
    let tint = (number * 37 % 200) as u8;

    RgbaImage::from_fn(width, height, |_, y| {
        if y >= height * 3 / 4 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([20, tint, 160, 255])
        }
    })
}

fn square(west: f64, south: f64) -> MultiPolygon<f64> {
    let rect = Rect::new(
        Coord { x: west, y: south },
        Coord {
            x: west + SQUARE_SIDE,
            y: south + SQUARE_SIDE,
        },
    );
    MultiPolygon::new(vec![rect.to_polygon()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_sparse_ids() {
        let catalog = demo_catalog();

        assert_eq!(catalog.valid_ids(), &[1, 2, 4, 5, 13, 39]);
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn region_includes_unnamed_polygon() {
        let region = demo_region();

        assert_eq!(region.len(), 7);
        assert!(region.contains_name("小樽市"));
    }

    #[test]
    fn dataset_joins_every_city() {
        assert!(demo_dataset().unmatched_cities().is_empty());
    }

    #[test]
    fn photo_has_plate_in_bottom_quarter() {
        let photo = demo_photo(4);

        assert_eq!(photo.dimensions(), DEMO_PHOTO_SIZE);
        assert_eq!(*photo.get_pixel(60, 150), Rgba([255, 255, 255, 255]));
        assert_ne!(*photo.get_pixel(60, 10), Rgba([255, 255, 255, 255]));
    }
}
