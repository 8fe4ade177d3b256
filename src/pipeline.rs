use std::io::{BufRead, Write};

use crate::{error::FramewarpResult, matrix, stream::FrameStream, warp::Warp};

/// Drives the transform loop: one matrix frame selects the map for one
/// input frame, which is scattered row by row into the output buffer
/// and emitted to `sink`.
///
/// The loop ends cleanly when the matrix stream is exhausted. If the
/// input stream ends mid-frame the partially-filled output frame is
/// still emitted at full size, then the loop ends. The three working
/// buffers (input row, matrix frame, output frame) are allocated once
/// and reused across iterations.
#[tracing::instrument(skip(input, matrices, sink))]
pub fn run<R1, R2, W>(
    input: &mut FrameStream<R1>,
    matrices: &mut FrameStream<R2>,
    sink: &mut W,
) -> FramewarpResult<()>
where
    R1: BufRead,
    R2: BufRead,
    W: Write,
{
    matrix::check_matrix_stream(matrices.header())?;

    let height = input.header().height as usize;
    let mut row = vec![0u8; input.row_size()];
    let mut mat = vec![0u8; matrices.frame_size()];
    let mut out = vec![0u8; input.frame_size()];

    let mut frame_index: u64 = 0;
    while matrices.read_frame(&mut mat)? {
        let warp = Warp::new(matrix::decode_affine(&mat), input.header())?;

        out.fill(0);
        let mut input_ended = false;
        let mut rows_in = 0;
        for y_in in 0..height {
            if !input.read_row(&mut row)? {
                tracing::debug!(frame_index, rows = y_in, "input stream ended mid-frame");
                input_ended = true;
                break;
            }
            warp.scatter_row(&row, y_in, &mut out)?;
            rows_in += 1;
        }

        // Emitted at full size even when the input ran out; undrawn
        // rows keep their zeroed state. A short write here is fatal.
        sink.write_all(&out)?;
        tracing::trace!(frame_index, rows_in, "frame emitted");
        frame_index += 1;

        if input_ended {
            break;
        }
    }
    Ok(())
}
