use anyhow::{Context, Result};

/// Row pitch of a readback buffer for an RGBA8 image `width` pixels wide.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Appends the tightly packed rows of a padded readback into `out`.
pub(crate) fn unpad_rows(padded: &[u8], width: u32, height: u32, pitch: u32, out: &mut Vec<u8>) {
    let row = (width * 4) as usize;
    out.reserve(row * height as usize);
    for chunk in padded.chunks(pitch as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row]);
    }
}

/// Copies an RGBA8 texture into host memory, blocking until the GPU is done.
pub(crate) fn read_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    out: &mut Vec<u8>,
) -> Result<()> {
    let pitch = padded_bytes_per_row(width);
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camrec readback"),
        size: pitch as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("camrec readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(pitch),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("device poll failed during readback")?;
    rx.recv()
        .context("readback callback dropped")?
        .context("failed to map readback buffer")?;

    {
        let data = slice.get_mapped_range();
        unpad_rows(&data, width, height, pitch, out);
    }
    staging.unmap();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_is_aligned() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn unpad_drops_row_padding() {
        // 2x2 image, 4-byte pixels, 12-byte pitch
        let padded: Vec<u8> = (0u8..24).collect();
        let mut out = Vec::new();
        unpad_rows(&padded, 2, 2, 12, &mut out);
        assert_eq!(out, [0, 1, 2, 3, 4, 5, 6, 7, 12, 13, 14, 15, 16, 17, 18, 19]);
    }
}
