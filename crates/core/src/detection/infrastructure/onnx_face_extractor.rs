/// Face extraction backed by two ONNX Runtime sessions.
///
/// A YOLO face model finds boxes (letterbox, confidence filter, NMS), then
/// an ArcFace model turns the square crop around each box into an
/// L2-normalized descriptor.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::face_extractor::{DetectedFace, FaceExtractor};
use crate::detection::infrastructure::execution_provider::build_session;
use crate::detection::infrastructure::math::{self, RawDetection};
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Fallback detector input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Faces smaller than this (in either dimension) carry too little detail to embed.
const MIN_FACE_PIXELS: i32 = 16;

const EMBED_INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxFaceExtractor {
    detector: Mutex<ort::session::Session>,
    embedder: Mutex<ort::session::Session>,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceExtractor {
    /// Loads both models.
    ///
    /// The detector input resolution is read from its input shape (NCHW),
    /// falling back to 640 when dynamic.
    pub fn new(
        detector_path: &Path,
        embedder_path: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = build_session(detector_path)?;
        let embedder = build_session(embedder_path)?;

        let input_size = detector
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            detector: Mutex::new(detector),
            embedder: Mutex::new(embedder),
            confidence,
            input_size,
        })
    }

    fn detect(&self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;

        let mut session = self
            .detector
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Face detection model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected detector output shape: {shape:?}").into());
        }
        // [1, features, detections] or [1, detections, features]
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Err(format!("Detector output has {num_feats} features, need 5").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let feature = |det: usize, f: usize| -> f64 {
            if transposed {
                data[f * num_dets + det] as f64
            } else {
                data[det * num_feats + f] as f64
            }
        };

        let mut raw = Vec::new();
        for i in 0..num_dets {
            let conf = feature(i, 4);
            if conf < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            raw.push(RawDetection {
                bbox: [
                    ((cx - w / 2.0) - pad_x as f64) / scale,
                    ((cy - h / 2.0) - pad_y as f64) / scale,
                    ((cx + w / 2.0) - pad_x as f64) / scale,
                    ((cy + h / 2.0) - pad_y as f64) / scale,
                ],
                confidence: conf,
            });
        }

        let regions = math::nms(&mut raw, NMS_IOU_THRESH)
            .iter()
            .map(|d| Region::from_corners(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]))
            .filter_map(|r| r.clamp(frame.width(), frame.height()))
            .filter(|r| r.width >= MIN_FACE_PIXELS && r.height >= MIN_FACE_PIXELS)
            .collect();
        Ok(regions)
    }

    fn embed(&self, crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
        let tensor = preprocess_crop(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .embedder
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let mut values = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        math::l2_normalize(&mut values);
        Ok(Embedding::new(values))
    }
}

impl FaceExtractor for OnnxFaceExtractor {
    fn extract(&self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let mut faces = Vec::new();
        for region in self.detect(frame)? {
            let Some(crop) = frame.crop(&region.squared()) else {
                continue;
            };
            faces.push(DetectedFace {
                region,
                embedding: self.embed(&crop)?,
            });
        }
        Ok(faces)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, the YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

/// Resize crop to 112x112, normalize to [-1, 1], NCHW layout.
fn preprocess_crop(crop: &Frame) -> ndarray::Array4<f32> {
    let src = crop.as_ndarray();
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let s = EMBED_INPUT_SIZE;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, v: u8) -> Frame {
        Frame::new(vec![v; (w * h * 3) as usize], w, h, 3)
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → 640: scale 3.2, content 640x320, vertical padding 160
        let (tensor, scale, pad_x, pad_y) = letterbox(&solid(200, 100, 255), 640);
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert!((scale - 3.2).abs() < 1e-9);
        assert_eq!(pad_x, 0);
        assert_eq!(pad_y, 160);
    }

    #[test]
    fn test_letterbox_pads_with_gray() {
        let (tensor, _, _, pad_y) = letterbox(&solid(200, 100, 255), 640);
        let gray = 114.0 / 255.0;
        assert!((tensor[[0, 0, 0, 0]] - gray).abs() < 1e-6);
        assert!((tensor[[0, 0, pad_y as usize, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_crop_shape() {
        let tensor = preprocess_crop(&solid(50, 50, 128));
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_crop_normalization_range() {
        let max = preprocess_crop(&solid(10, 10, 255));
        let min = preprocess_crop(&solid(10, 10, 0));
        assert!((max[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((min[[0, 2, 111, 111]] + 1.0).abs() < 0.01);
    }
}
