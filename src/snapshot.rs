//! Configuration export: render the scene off screen and encode it to PNG.
//!
//! Capture draws into its own surface-format texture at the window size,
//! reads it back over a mapped buffer, and strips the copy alignment
//! padding before encoding. Filenames come from [`ExportStamper`], which
//! keeps stamps strictly increasing even when captures land on the same
//! clock millisecond.

use std::{
    io::Cursor,
    iter,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{bail, Context as _};
use image::{ImageFormat, RgbaImage};
use log::info;

use crate::{context::Context, data_structures::texture::Texture, render::SceneRenderer};

pub const EXPORT_PREFIX: &str = "showroom-configuration-";

/// A finished export: the file name and the encoded PNG bytes.
pub struct Snapshot {
    pub filename: String,
    pub png: Vec<u8>,
}

/// Issues export stamps. Wall-clock milliseconds, bumped past the last
/// stamp whenever the clock reads the same or an earlier value, so two
/// captures never collide on a name.
#[derive(Debug, Default)]
pub struct ExportStamper {
    last_millis: u128,
}

impl ExportStamper {
    pub fn new() -> Self {
        Self { last_millis: 0 }
    }

    pub fn next(&mut self) -> u128 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        self.last_millis = if now > self.last_millis {
            now
        } else {
            self.last_millis + 1
        };
        self.last_millis
    }

    pub fn filename(&mut self) -> String {
        format!("{}{}.png", EXPORT_PREFIX, self.next())
    }
}

/// Render the scene into an offscreen texture and encode it as PNG.
///
/// Blocks on the GPU readback; an export is a user action, not a per-frame
/// path.
pub fn capture(
    ctx: &Context,
    renderer: &SceneRenderer,
    clear_colour: wgpu::Color,
    stamper: &mut ExportStamper,
) -> anyhow::Result<Snapshot> {
    let width = ctx.config.width;
    let height = ctx.config.height;
    if width == 0 || height == 0 {
        bail!("window has no drawable area");
    }

    // Same format as the surface so the scene pipelines apply unchanged.
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Snapshot Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctx.config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let depth =
        Texture::create_depth_texture(&ctx.device, [width, height], "snapshot_depth_texture");

    let bytes_per_pixel = std::mem::size_of::<u32>() as u32;
    let unpadded_bytes_per_row = bytes_per_pixel * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Snapshot Buffer"),
        size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Snapshot Encoder"),
        });
    renderer.draw(ctx, &mut encoder, &view, &depth.view, clear_colour);
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(iter::once(encoder.finish()));

    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(5)),
        })
        .context("waiting for the snapshot readback")?;
    rx.recv().context("snapshot map callback dropped")??;

    let mut data = {
        let mapped = buffer_slice.get_mapped_range();
        let mut rows = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for chunk in mapped.chunks_exact(padded_bytes_per_row as usize) {
            rows.extend_from_slice(&chunk[..unpadded_bytes_per_row as usize]);
        }
        rows
    };
    output_buffer.unmap();

    if matches!(
        ctx.config.format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    ) {
        for pixel in data.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }

    let image =
        RgbaImage::from_raw(width, height, data).context("assembling the snapshot image")?;
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let filename = stamper.filename();
    info!("captured {} ({}x{})", filename, width, height);
    Ok(Snapshot { filename, png })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_strictly_increase() {
        let mut stamper = ExportStamper::new();
        let first = stamper.next();
        let second = stamper.next();
        let third = stamper.next();
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn clock_regression_still_bumps_the_stamp() {
        // The recorded stamp sits far past anything the clock will read.
        let mut stamper = ExportStamper {
            last_millis: u128::MAX - 10,
        };
        assert_eq!(stamper.next(), u128::MAX - 9);
        assert_eq!(stamper.next(), u128::MAX - 8);
    }

    #[test]
    fn filenames_carry_prefix_stamp_and_extension() {
        let mut stamper = ExportStamper::new();
        let name = stamper.filename();
        assert!(name.starts_with(EXPORT_PREFIX));
        assert!(name.ends_with(".png"));
        let stamp = &name[EXPORT_PREFIX.len()..name.len() - 4];
        assert!(stamp.parse::<u128>().unwrap() > 0);
    }
}
