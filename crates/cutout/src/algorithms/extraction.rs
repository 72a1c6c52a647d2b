use geo_types::{Coord, LineString, Polygon};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::{
    contours::{BorderType, Contour},
    region_labelling::{connected_components, Connectivity},
};
use crate::{config::AreaMethod, traits::ComponentFinder, types::BoundingBox};

/// Per-pixel component labels; 0 is background
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// An outer connected component of a foreground mask
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Label of the component's own pixels in [`ComponentMap::labels`]
    pub label: u32,
    pub bbox: BoundingBox,
    /// Foreground pixels belonging to this component
    pub pixel_area: u64,
    /// Shoelace area of the traced outer boundary
    pub contour_area: f64,
    /// Labels drawn as part of this object: its own plus any components
    /// sitting inside its holes.
    pub members: Vec<u32>,
}

impl Component {
    pub fn area(&self, method: AreaMethod) -> f64 {
        match method {
            AreaMethod::PixelCount => self.pixel_area as f64,
            AreaMethod::Polygon => self.contour_area,
        }
    }
}

/// Labelled mask together with its outer components
#[derive(Debug, Clone)]
pub struct ComponentMap {
    pub labels: LabelImage,
    pub components: Vec<Component>,
}

impl ComponentMap {
    /// Object mask for `component`, cropped to its bounding box.
    pub fn mask_for(&self, component: &Component) -> GrayImage {
        let BoundingBox { x, y, width, height } = component.bbox;
        GrayImage::from_fn(width, height, |dx, dy| {
            let label = self.labels.get_pixel(x + dx, y + dy)[0];
            if label != 0 && component.members.contains(&label) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixels: u64,
}

impl Extent {
    fn new(x: u32, y: u32) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y, pixels: 0 }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixels += 1;
    }

    fn bbox(&self) -> BoundingBox {
        BoundingBox::from_extent(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

fn polygon_area(contour: &Contour<i32>) -> f64 {
    use geo::Area;

    let coords: Vec<Coord<f64>> = contour
        .points
        .iter()
        .map(|p| Coord { x: f64::from(p.x), y: f64::from(p.y) })
        .collect();
    Polygon::new(LineString::new(coords), vec![]).unsigned_area()
}

/// Border following on a copy of `mask` with a one-pixel empty frame, so
/// objects touching the image edge still get a closed outer border. Points are
/// shifted back into `mask` coordinates.
fn trace_borders(mask: &GrayImage) -> Vec<Contour<i32>> {
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut framed, mask, 1, 1);

    let mut contours = imageproc::contours::find_contours::<i32>(&framed);
    for contour in &mut contours {
        for point in &mut contour.points {
            point.x -= 1;
            point.y -= 1;
        }
    }
    contours
}

/// Outermost ancestor of contour `index`
fn root_of(contours: &[Contour<i32>], mut index: usize) -> usize {
    while let Some(parent) = contours[index].parent {
        index = parent;
    }
    index
}

/// Component finder combining 8-connected labelling with border following.
///
/// Labelling gives exact pixel areas and extents; the contour hierarchy decides
/// which components are external and fixes their discovery (raster) order.
#[derive(Debug, Clone, Default)]
pub struct ContourComponentFinder;

impl ComponentFinder for ContourComponentFinder {
    fn find_components(&self, mask: &GrayImage) -> ComponentMap {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

        let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0);
        let mut extents: Vec<Option<Extent>> = vec![None; max_label as usize + 1];
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0];
            if label == 0 {
                continue;
            }
            extents[label as usize]
                .get_or_insert_with(|| Extent::new(x, y))
                .include(x, y);
        }

        let contours = trace_borders(mask);
        let label_at = |contour: &Contour<i32>| {
            contour
                .points
                .first()
                .filter(|p| p.x >= 0 && p.y >= 0)
                .map(|p| labels.get_pixel(p.x as u32, p.y as u32)[0])
                .filter(|&label| label != 0)
        };

        // Root outer borders become components, in the order they were traced.
        let mut components: Vec<Component> = Vec::new();
        let mut component_of_contour = vec![None; contours.len()];
        for (index, contour) in contours.iter().enumerate() {
            if contour.border_type != BorderType::Outer || contour.parent.is_some() {
                continue;
            }
            let Some(label) = label_at(contour) else {
                continue;
            };
            let Some(extent) = extents[label as usize] else {
                continue;
            };
            component_of_contour[index] = Some(components.len());
            components.push(Component {
                label,
                bbox: extent.bbox(),
                pixel_area: extent.pixels,
                contour_area: polygon_area(contour),
                members: vec![label],
            });
        }

        // Outer borders inside holes are folded into their root component.
        for (index, contour) in contours.iter().enumerate() {
            if contour.border_type != BorderType::Outer || contour.parent.is_none() {
                continue;
            }
            let (Some(label), Some(owner)) =
                (label_at(contour), component_of_contour[root_of(&contours, index)])
            else {
                continue;
            };
            let members = &mut components[owner].members;
            if !members.contains(&label) {
                members.push(label);
            }
        }

        ComponentMap { labels, components }
    }
}
