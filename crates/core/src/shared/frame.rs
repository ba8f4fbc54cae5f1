use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A decoded image: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 3)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies out the part of the frame covered by `region`.
    ///
    /// The region is clamped to the frame first; `None` when nothing
    /// of it lies inside.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        let r = region.clamp(self.width, self.height)?;
        let ch = self.channels as usize;
        let stride = self.width as usize * ch;
        let (x, y, w, h) = (r.x as usize, r.y as usize, r.width as usize, r.height as usize);

        let mut data = Vec::with_capacity(w * h * ch);
        for row in y..y + h {
            let start = row * stride + x * ch;
            data.extend_from_slice(&self.data[start..start + w * ch]);
        }
        Some(Frame::new(data, w as u32, h as u32, self.channels))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
