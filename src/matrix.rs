use kurbo::Affine;

use crate::{
    error::{FramewarpError, FramewarpResult},
    pixfmt::PixelFormat,
    stream::StreamHeader,
};

/// Required geometry of the matrix stream: 3x3 pixels, `xyza` format.
pub const MATRIX_DIM: u32 = 3;

/// Byte length of one matrix frame (9 xyza pixels).
pub const MATRIX_FRAME_LEN: usize = (MATRIX_DIM * MATRIX_DIM) as usize * COEFF_STRIDE;

// One xyza pixel is four f64 channels; a coefficient occupies the
// first channel of its pixel, so consecutive coefficients sit one
// pixel stride apart.
const COEFF_STRIDE: usize = PixelFormat::Xyza.pixel_size();

/// Rejects any matrix stream that is not exactly 3x3 `xyza`.
pub fn check_matrix_stream(header: &StreamHeader) -> FramewarpResult<()> {
    if header.width != MATRIX_DIM || header.height != MATRIX_DIM {
        return Err(FramewarpError::validation(format!(
            "matrix stream must have {MATRIX_DIM}x{MATRIX_DIM} geometry, got {}x{}",
            header.width, header.height
        )));
    }
    if header.pixfmt != PixelFormat::Xyza {
        return Err(FramewarpError::validation(format!(
            "matrix stream pixel format must be xyza, got {}",
            header.pixfmt
        )));
    }
    Ok(())
}

/// Extracts the six affine coefficients `(a, b, c, d, e, f)` from one
/// matrix frame and returns them as the map
/// `(x, y) -> (a*x + b*y + c, d*x + e*y + f)`.
///
/// Coefficients occupy the first channel of the first six pixels in
/// row-major order, as native-endian f64. The bottom pixel row and the
/// other channels are padding.
pub fn decode_affine(frame: &[u8]) -> Affine {
    debug_assert_eq!(frame.len(), MATRIX_FRAME_LEN);
    let coeff = |i: usize| {
        let at = i * COEFF_STRIDE;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&frame[at..at + 8]);
        f64::from_ne_bytes(raw)
    };
    let [a, b, c, d, e, f] = [coeff(0), coeff(1), coeff(2), coeff(3), coeff(4), coeff(5)];
    // kurbo stores column-major [xx, yx, xy, yy, tx, ty].
    Affine::new([a, d, b, e, c, f])
}

/// Writes six coefficients into the slots [`decode_affine`] reads them
/// from. Padding bytes in `frame` are left untouched.
pub fn encode_affine(coeffs: [f64; 6], frame: &mut [u8]) {
    debug_assert_eq!(frame.len(), MATRIX_FRAME_LEN);
    for (i, c) in coeffs.into_iter().enumerate() {
        let at = i * COEFF_STRIDE;
        frame[at..at + 8].copy_from_slice(&c.to_ne_bytes());
    }
}
