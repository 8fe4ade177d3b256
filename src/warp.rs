use kurbo::{Affine, Point};

use crate::{
    error::{FramewarpError, FramewarpResult},
    stream::StreamHeader,
};

/// Forward scatter of input pixels into an output frame under a fixed
/// affine map.
///
/// Coordinates are normalized so the origin sits at the frame center
/// before the map is applied, then denormalized and rounded to the
/// nearest pixel (ties away from zero). Each hit copies `pixel_size`
/// raw bytes; the transformer never interprets channel contents.
///
/// The transform is a scatter, not a gather: destinations no source
/// pixel rounds to stay zero, and colliding destinations keep the
/// last-written source pixel in row-major source order. Matrix
/// producers depend on these semantics, holes included.
#[derive(Clone, Copy, Debug)]
pub struct Warp {
    affine: Affine,
    width: usize,
    pixel_size: usize,
    row_size: usize,
    frame_size: usize,
    x_center: f64,
    y_center: f64,
}

impl Warp {
    pub fn new(affine: Affine, header: &StreamHeader) -> FramewarpResult<Self> {
        Ok(Self {
            affine,
            width: header.width as usize,
            pixel_size: header.pixfmt.pixel_size(),
            row_size: header.row_size()?,
            frame_size: header.frame_size()?,
            x_center: f64::from(header.width) / 2.0,
            y_center: f64::from(header.height) / 2.0,
        })
    }

    /// Scatters one input row at index `y_in` into `out`.
    ///
    /// The caller zeroes `out` once per frame; rows only ever add to it.
    pub fn scatter_row(&self, row: &[u8], y_in: usize, out: &mut [u8]) -> FramewarpResult<()> {
        if row.len() != self.row_size || out.len() != self.frame_size {
            return Err(FramewarpError::validation(
                "scatter_row expects one input row and a full output frame",
            ));
        }

        let y = y_in as f64 - self.y_center;
        for x_in in 0..self.width {
            let x = x_in as f64 - self.x_center;
            let mapped = self.affine * Point::new(x, y);
            let x_out = (mapped.x + self.x_center).round() as i64;
            let y_out = (mapped.y + self.y_center).round() as i64;

            // Bounds are checked on the flat byte offset only; an x
            // overflow whose offset stays in range lands at the start
            // of the next row. Offsets that do not fit are dropped
            // like any other out-of-frame pixel.
            let offset = y_out
                .checked_mul(self.width as i64)
                .and_then(|v| v.checked_add(x_out))
                .and_then(|v| v.checked_mul(self.pixel_size as i64));
            let Some(offset) = offset else { continue };
            let Ok(dst) = usize::try_from(offset) else {
                continue;
            };
            if dst >= self.frame_size {
                continue;
            }

            // The offset is a whole pixel index, so pixel_size more
            // bytes always fit below frame_size.
            let src = x_in * self.pixel_size;
            out[dst..dst + self.pixel_size].copy_from_slice(&row[src..src + self.pixel_size]);
        }
        Ok(())
    }

    /// Scatters a whole frame row by row. The caller zeroes `out` first.
    pub fn scatter_frame(&self, frame: &[u8], out: &mut [u8]) -> FramewarpResult<()> {
        if frame.len() != self.frame_size {
            return Err(FramewarpError::validation(
                "scatter_frame expects a full input frame",
            ));
        }
        for (y_in, row) in frame.chunks_exact(self.row_size).enumerate() {
            self.scatter_row(row, y_in, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::pixfmt::PixelFormat;

    use super::*;

    fn rgba_header(width: u32, height: u32) -> StreamHeader {
        StreamHeader {
            width,
            height,
            pixfmt: PixelFormat::Rgba,
        }
    }

    fn affine(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Affine {
        Affine::new([a, d, b, e, c, f])
    }

    fn px(v: u8) -> [u8; 4] {
        [v, v, v, v]
    }

    fn frame_of(pixels: &[[u8; 4]]) -> Vec<u8> {
        pixels.concat()
    }

    #[test]
    fn identity_reproduces_the_frame() {
        let header = rgba_header(2, 2);
        let warp = Warp::new(Affine::IDENTITY, &header).unwrap();
        let input = frame_of(&[px(1), px(2), px(3), px(4)]);
        let mut out = vec![0u8; input.len()];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn unit_translation_shifts_and_wraps_at_in_range_offsets() {
        // x_out = x_in + 1. Row-ends whose flat offset is still inside
        // the frame wrap to the next row's left edge; only the very
        // last pixel falls off the end.
        let header = rgba_header(2, 2);
        let warp = Warp::new(affine(1.0, 0.0, 1.0, 0.0, 1.0, 0.0), &header).unwrap();
        let input = frame_of(&[px(1), px(2), px(3), px(4)]);
        let mut out = vec![0u8; input.len()];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert_eq!(out, frame_of(&[px(0), px(1), px(2), px(3)]));
    }

    #[test]
    fn negative_offsets_are_dropped() {
        // y_out = y_in - 1: the first input row maps above the frame.
        let header = rgba_header(2, 2);
        let warp = Warp::new(affine(1.0, 0.0, 0.0, 0.0, 1.0, -1.0), &header).unwrap();
        let input = frame_of(&[px(1), px(2), px(3), px(4)]);
        let mut out = vec![0u8; input.len()];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert_eq!(out, frame_of(&[px(3), px(4), px(0), px(0)]));
    }

    #[test]
    fn far_translation_leaves_the_frame_zero() {
        let header = rgba_header(4, 4);
        let warp = Warp::new(affine(1.0, 0.0, 1e9, 0.0, 1.0, 0.0), &header).unwrap();
        let input = vec![0xAB; 64];
        let mut out = vec![0u8; 64];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn non_finite_coefficients_stay_in_bounds() {
        // NaN casts to 0 and -inf saturates to i64::MIN, so the first
        // input row overflows the offset math and is dropped, while
        // the second collapses onto destination (0, 0).
        let header = rgba_header(2, 2);
        let warp = Warp::new(affine(f64::NAN, 0.0, 0.0, 0.0, f64::INFINITY, 0.0), &header).unwrap();
        let input = frame_of(&[px(1), px(2), px(3), px(4)]);
        let mut out = vec![0u8; input.len()];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert_eq!(out, frame_of(&[px(4), px(0), px(0), px(0)]));
    }

    #[test]
    fn colliding_destinations_keep_the_later_source_pixel() {
        // a = 0 collapses every column onto x_out = 1, so within each
        // row the rightmost source pixel lands last and wins.
        let header = rgba_header(2, 2);
        let warp = Warp::new(affine(0.0, 0.0, 0.0, 0.0, 1.0, 0.0), &header).unwrap();
        let input = frame_of(&[px(1), px(2), px(3), px(4)]);
        let mut out = vec![0u8; input.len()];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert_eq!(out, frame_of(&[px(0), px(2), px(0), px(4)]));
    }

    #[test]
    fn buffer_length_mismatches_are_rejected() {
        let header = rgba_header(2, 2);
        let warp = Warp::new(Affine::IDENTITY, &header).unwrap();
        let mut out = vec![0u8; 16];
        assert!(warp.scatter_row(&[0u8; 4], 0, &mut out).is_err());
        assert!(warp.scatter_row(&[0u8; 8], 0, &mut [0u8; 4]).is_err());
        assert!(warp.scatter_frame(&[0u8; 8], &mut out).is_err());
    }

    #[test]
    fn xyza_pixels_copy_as_opaque_bytes() {
        let header = StreamHeader {
            width: 2,
            height: 1,
            pixfmt: PixelFormat::Xyza,
        };
        let warp = Warp::new(Affine::IDENTITY, &header).unwrap();
        let mut input = vec![0u8; 64];
        for (i, b) in input.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut out = vec![0u8; 64];
        warp.scatter_frame(&input, &mut out).unwrap();
        assert_eq!(out, input);
    }
}
