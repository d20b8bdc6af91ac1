// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame to pixel buffer conversion
//!
//! Decoders that binarize luminance read the Y plane directly and never
//! touch chroma. Decoders that want colour get RGB: the frame's chroma is
//! first gathered into a contiguous NV21 sequence (Y rows, then interleaved
//! V/U pairs) regardless of the source layout, which is then expanded with
//! fixed-point BT.601 arithmetic.

use crate::camera::{Frame, FrameFormat};
use crate::errors::FrameError;
use crate::media::{BufferFormat, PixelBuffer};
use image::{GrayImage, RgbImage};
use tracing::trace;

/// Convert a frame to the layout a decoder consumes
pub fn convert(frame: &Frame, target: BufferFormat) -> Result<PixelBuffer, FrameError> {
    let start = std::time::Instant::now();

    let buffer = match target {
        BufferFormat::Luma => PixelBuffer::Luma(extract_luma(frame)?),
        BufferFormat::Rgb => {
            let nv21 = gather_nv21(frame)?;
            PixelBuffer::Rgb(nv21_to_rgb(
                &nv21,
                frame.width as usize,
                frame.height as usize,
            )?)
        }
    };

    trace!(
        width = frame.width,
        height = frame.height,
        format = ?frame.format,
        target = ?target,
        conversion_us = start.elapsed().as_micros(),
        "Converted frame"
    );

    Ok(buffer)
}

/// Check plane count and sizes against the declared geometry
pub fn validate(frame: &Frame) -> Result<(), FrameError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(FrameError::EmptyFrame);
    }

    let expected = frame.format.plane_count();
    if frame.planes.len() < expected {
        return Err(FrameError::PlaneCount {
            expected,
            actual: frame.planes.len(),
        });
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let (chroma_width, chroma_height) = chroma_dimensions(width, height);

    for (index, plane) in frame.planes.iter().take(expected).enumerate() {
        if plane.row_stride == 0 || plane.pixel_stride == 0 {
            return Err(FrameError::InvalidStride { plane: index });
        }

        let required = match (frame.format, index) {
            (_, 0) => plane.required_len(width, height),
            (FrameFormat::Yuv420, _) => plane.required_len(chroma_width, chroma_height),
            // NV21/NV12 chroma: rows of interleaved pairs
            _ => (chroma_height - 1) * plane.row_stride + chroma_width * 2,
        };

        if plane.data.len() < required {
            return Err(FrameError::PlaneTooShort {
                plane: index,
                required,
                actual: plane.data.len(),
            });
        }
    }

    Ok(())
}

/// Copy the luminance plane without stride padding
pub fn extract_luma(frame: &Frame) -> Result<GrayImage, FrameError> {
    validate(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let plane = frame.plane(0)?;

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        if plane.pixel_stride == 1 {
            let row_start = row * plane.row_stride;
            data.extend_from_slice(&plane.data[row_start..row_start + width]);
        } else {
            data.extend((0..width).map(|col| plane.sample(col, row)));
        }
    }

    GrayImage::from_raw(frame.width, frame.height, data).ok_or(FrameError::PlaneTooShort {
        plane: 0,
        required: width * height,
        actual: plane.data.len(),
    })
}

/// Gather the frame into a contiguous NV21 byte sequence
///
/// Luminance-only frames get neutral chroma.
pub fn gather_nv21(frame: &Frame) -> Result<Vec<u8>, FrameError> {
    let luma = extract_luma(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let (chroma_width, chroma_height) = chroma_dimensions(width, height);

    let mut data = luma.into_raw();
    data.reserve(chroma_width * chroma_height * 2);

    for cy in 0..chroma_height {
        for cx in 0..chroma_width {
            let (u, v) = chroma_at(frame, cx, cy);
            data.push(v);
            data.push(u);
        }
    }

    Ok(data)
}

/// (U, V) for one chroma sample; the frame must already be validated
#[inline]
fn chroma_at(frame: &Frame, cx: usize, cy: usize) -> (u8, u8) {
    match frame.format {
        FrameFormat::Yuv420 => (frame.planes[1].sample(cx, cy), frame.planes[2].sample(cx, cy)),
        FrameFormat::Nv21 => {
            let plane = &frame.planes[1];
            let offset = cy * plane.row_stride + cx * 2;
            (plane.data[offset + 1], plane.data[offset])
        }
        FrameFormat::Nv12 => {
            let plane = &frame.planes[1];
            let offset = cy * plane.row_stride + cx * 2;
            (plane.data[offset], plane.data[offset + 1])
        }
        FrameFormat::Gray8 => (128, 128),
    }
}

/// Chroma plane dimensions for 4:2:0 subsampling
pub fn chroma_dimensions(width: usize, height: usize) -> (usize, usize) {
    (width.div_ceil(2), height.div_ceil(2))
}

/// Expand a contiguous NV21 sequence to RGB
fn nv21_to_rgb(nv21: &[u8], width: usize, height: usize) -> Result<RgbImage, FrameError> {
    let (chroma_width, chroma_height) = chroma_dimensions(width, height);
    let required = width * height + chroma_width * chroma_height * 2;
    if nv21.len() < required {
        return Err(FrameError::PlaneTooShort {
            plane: 0,
            required,
            actual: nv21.len(),
        });
    }

    let (y_plane, vu_plane) = nv21.split_at(width * height);
    let mut rgb_data = vec![0u8; width * height * 3];

    for y_idx in 0..height {
        process_row(
            y_plane,
            vu_plane,
            &mut rgb_data,
            y_idx,
            width,
            chroma_width * 2,
        );
    }

    RgbImage::from_raw(width as u32, height as u32, rgb_data).ok_or(FrameError::EmptyFrame)
}

#[inline]
fn process_row(
    y_plane: &[u8],
    vu_plane: &[u8],
    rgb_data: &mut [u8],
    y_idx: usize,
    width: usize,
    vu_stride: usize,
) {
    let y_row_start = y_idx * width;
    let vu_row_start = (y_idx / 2) * vu_stride;
    let rgb_row_start = y_idx * width * 3;

    // Pixels in pairs share one V/U sample
    for x_idx in (0..width).step_by(2) {
        let vu_offset = vu_row_start + x_idx;
        let v = vu_plane[vu_offset] as i32 - 128;
        let u = vu_plane[vu_offset + 1] as i32 - 128;

        let r_v = (179 * v) >> 7;
        let g_u = (44 * u) >> 7;
        let g_v = (91 * v) >> 7;
        let b_u = (227 * u) >> 7;

        for px in x_idx..(x_idx + 2).min(width) {
            let luma = ((y_plane[y_row_start + px] as i32 - 16) * 149) >> 7;
            let rgb_offset = rgb_row_start + px * 3;
            rgb_data[rgb_offset] = (luma + r_v).clamp(0, 255) as u8;
            rgb_data[rgb_offset + 1] = (luma - g_u - g_v).clamp(0, 255) as u8;
            rgb_data[rgb_offset + 2] = (luma + b_u).clamp(0, 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FrameRotation, Plane};

    fn yuv420_frame(width: usize, height: usize, y: u8, u: u8, v: u8) -> Frame {
        let (cw, ch) = chroma_dimensions(width, height);
        Frame::new(
            width as u32,
            height as u32,
            FrameFormat::Yuv420,
            vec![
                Plane::packed(vec![y; width * height], width),
                Plane::packed(vec![u; cw * ch], cw),
                Plane::packed(vec![v; cw * ch], cw),
            ],
            FrameRotation::None,
        )
    }

    #[test]
    fn test_neutral_gray_conversion() {
        let frame = yuv420_frame(16, 16, 128, 128, 128);
        let buffer = convert(&frame, BufferFormat::Rgb).unwrap();

        let PixelBuffer::Rgb(img) = buffer else {
            panic!("Expected RGB buffer");
        };
        assert_eq!(img.dimensions(), (16, 16));
        // (128 - 16) * 149 >> 7
        assert!(img.pixels().all(|p| p.0 == [130, 130, 130]));
    }

    #[test]
    fn test_strong_v_is_red() {
        let frame = yuv420_frame(4, 4, 128, 128, 240);
        let PixelBuffer::Rgb(img) = convert(&frame, BufferFormat::Rgb).unwrap() else {
            panic!("Expected RGB buffer");
        };
        let [r, g, b] = img.get_pixel(0, 0).0;
        assert!(r > g && r > b);
    }

    #[test]
    fn test_luma_strips_stride_padding() {
        // 3x2 luma with 2 bytes of padding per row
        let data = vec![1, 2, 3, 0, 0, 4, 5, 6, 0, 0];
        let frame = Frame::new(
            3,
            2,
            FrameFormat::Gray8,
            vec![Plane::packed(data, 5)],
            FrameRotation::None,
        );

        let luma = extract_luma(&frame).unwrap();
        assert_eq!(luma.into_raw(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_semi_planar_yuv420_matches_nv21() {
        // Android-style semi-planar: U and V planes alias one interleaved VU buffer
        let width = 4;
        let height = 2;
        let y = vec![100u8; width * height];
        let vu: Vec<u8> = vec![200, 50, 210, 60];

        let yuv = Frame::new(
            width as u32,
            height as u32,
            FrameFormat::Yuv420,
            vec![
                Plane::packed(y.clone(), width),
                Plane::new(vu[1..].to_vec(), 4, 2),
                Plane::new(vu.clone(), 4, 2),
            ],
            FrameRotation::None,
        );
        let nv21 = Frame::new(
            width as u32,
            height as u32,
            FrameFormat::Nv21,
            vec![Plane::packed(y, width), Plane::packed(vu, 4)],
            FrameRotation::None,
        );

        let expected = vec![100, 100, 100, 100, 100, 100, 100, 100, 200, 50, 210, 60];
        assert_eq!(gather_nv21(&nv21).unwrap(), expected);
        assert_eq!(gather_nv21(&yuv).unwrap(), expected);
    }

    #[test]
    fn test_nv12_swaps_chroma_order() {
        let frame = Frame::new(
            2,
            2,
            FrameFormat::Nv12,
            vec![Plane::packed(vec![0u8; 4], 2), Plane::packed(vec![10, 20], 2)],
            FrameRotation::None,
        );
        assert_eq!(&gather_nv21(&frame).unwrap()[4..], &[20, 10]);
    }

    #[test]
    fn test_odd_dimensions() {
        let frame = yuv420_frame(5, 3, 128, 128, 128);
        let PixelBuffer::Rgb(img) = convert(&frame, BufferFormat::Rgb).unwrap() else {
            panic!("Expected RGB buffer");
        };
        assert_eq!(img.dimensions(), (5, 3));
    }

    #[test]
    fn test_short_chroma_plane_rejected() {
        let frame = Frame::new(
            4,
            4,
            FrameFormat::Yuv420,
            vec![
                Plane::packed(vec![0u8; 16], 4),
                Plane::packed(vec![0u8; 4], 2),
                Plane::packed(vec![0u8; 3], 2),
            ],
            FrameRotation::None,
        );

        assert_eq!(
            convert(&frame, BufferFormat::Rgb).unwrap_err(),
            FrameError::PlaneTooShort {
                plane: 2,
                required: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_missing_planes_rejected() {
        let frame = Frame::new(
            4,
            4,
            FrameFormat::Yuv420,
            vec![Plane::packed(vec![0u8; 16], 4)],
            FrameRotation::None,
        );
        assert!(matches!(
            convert(&frame, BufferFormat::Luma),
            Err(FrameError::PlaneCount {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let frame = Frame::new(0, 4, FrameFormat::Gray8, vec![], FrameRotation::None);
        assert_eq!(validate(&frame), Err(FrameError::EmptyFrame));
    }
}
