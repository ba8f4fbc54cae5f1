use std::path::{Path, PathBuf};

use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

const MATCHED_COLOR: [u8; 3] = [0, 255, 0];
const UNMATCHED_COLOR: [u8; 3] = [255, 0, 0];
pub const DEFAULT_THICKNESS: i32 = 2;

/// Saves a copy of a query image with every detected face outlined.
///
/// Faces that matched a gallery identity are outlined green, the rest red.
/// Identity names are not drawn; the report lists them per face, in the
/// same order and with the same regions.
pub struct BoxAnnotator {
    writer: Box<dyn ImageWriter>,
    output_dir: PathBuf,
    thickness: i32,
}

impl BoxAnnotator {
    pub fn new(writer: Box<dyn ImageWriter>, output_dir: PathBuf, thickness: i32) -> Self {
        Self {
            writer,
            output_dir,
            thickness: thickness.max(1),
        }
    }

    /// Writes `<output_dir>/<file name of source>` and returns that path.
    pub fn annotate(
        &self,
        source: &Path,
        frame: &Frame,
        faces: &[(Region, bool)],
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let name = source
            .file_name()
            .ok_or_else(|| format!("No file name in {}", source.display()))?;
        let mut canvas = frame.clone();
        for (region, matched) in faces {
            let color = if *matched {
                MATCHED_COLOR
            } else {
                UNMATCHED_COLOR
            };
            draw_rect(&mut canvas, region, self.thickness, color);
        }
        let path = self.output_dir.join(name);
        self.writer.write(&path, &canvas)?;
        Ok(path)
    }
}

fn draw_rect(frame: &mut Frame, region: &Region, thickness: i32, color: [u8; 3]) {
    let Some(r) = region.clamp(frame.width(), frame.height()) else {
        return;
    };
    let w = frame.width() as usize;
    let ch = frame.channels() as usize;
    let (x1, y1) = (r.x, r.y);
    let (x2, y2) = (r.x + r.width - 1, r.y + r.height - 1);
    let data = frame.data_mut();

    for y in y1..=y2 {
        for x in x1..=x2 {
            let on_border = x - x1 < thickness
                || x2 - x < thickness
                || y - y1 < thickness
                || y2 - y < thickness;
            if on_border {
                let offset = (y as usize * w + x as usize) * ch;
                data[offset..offset + 3].copy_from_slice(&color);
            }
        }
    }
}
