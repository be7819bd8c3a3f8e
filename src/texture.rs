use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel};

use crate::gpu::GpuContext;

/// How the decoded image's channels are interpreted on upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureChannels {
    /// Grayscale, uploaded as `R8Unorm`.
    Single,
    /// RGB, expanded to sRGB RGBA with opaque alpha.
    Rgb,
    /// RGBA, uploaded as sRGB RGBA.
    Rgba,
}

impl TextureChannels {
    /// Picks the interpretation for a decoded image.
    ///
    /// Gray+alpha images have no single-channel equivalent and are treated as
    /// RGBA.
    pub fn of(image: &DynamicImage) -> Self {
        match image.color().channel_count() {
            1 => Self::Single,
            3 => Self::Rgb,
            _ => Self::Rgba,
        }
    }

    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Single => wgpu::TextureFormat::R8Unorm,
            Self::Rgb | Self::Rgba => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub channels: TextureChannels,
    pub mip_level_count: u32,
}

impl Texture {
    /// Create a single-level texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        Self::upload(
            gpu,
            data,
            width,
            height,
            1,
            TextureChannels::Rgba,
            label,
        )
    }

    /// A 1x1 opaque white texture, bound for entities without an image.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "Default White Texture")
    }

    /// Load a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        let img = image::open(path)?;
        Ok(Self::from_image(gpu, img, &path.display().to_string()))
    }

    /// Flips the image so row 0 is the bottom, builds the mip chain and
    /// uploads every level.
    pub fn from_image(gpu: &GpuContext, img: DynamicImage, label: &str) -> Self {
        let channels = TextureChannels::of(&img);
        let img = img.flipv();

        let (width, height, levels) = match channels {
            TextureChannels::Single => pack_mips(img.to_luma8()),
            TextureChannels::Rgb | TextureChannels::Rgba => pack_mips(img.to_rgba8()),
        };
        let mip_level_count = mip_level_count(width, height);

        log::debug!(
            "Texture '{}': {}x{} {:?}, {} mip levels",
            label,
            width,
            height,
            channels,
            mip_level_count
        );

        Self::upload(
            gpu,
            &levels,
            width,
            height,
            mip_level_count,
            channels,
            label,
        )
    }

    fn upload(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        mip_level_count: u32,
        channels: TextureChannels,
        label: &str,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: channels.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Trilinear minification, bilinear magnification, tiled UVs.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            channels,
            mip_level_count,
        }
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Builds every mip level, base level first, halving each side (min 1).
pub fn mip_chain<P>(base: ImageBuffer<P, Vec<u8>>) -> Vec<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let count = mip_level_count(base.width(), base.height());
    let mut levels = Vec::with_capacity(count as usize);
    levels.push(base);

    for _ in 1..count {
        let Some(prev) = levels.last() else { break };
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let next = imageops::resize(prev, w, h, FilterType::Triangle);
        levels.push(next);
    }

    levels
}

/// Base dimensions plus every mip level packed back to back.
fn pack_mips<P>(base: ImageBuffer<P, Vec<u8>>) -> (u32, u32, Vec<u8>)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = base.dimensions();
    (width, height, concat_levels(mip_chain(base)))
}

fn concat_levels<P>(levels: Vec<ImageBuffer<P, Vec<u8>>>) -> Vec<u8>
where
    P: Pixel<Subpixel = u8>,
{
    levels.into_iter().flat_map(ImageBuffer::into_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn mip_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(300, 20), 9);
    }

    #[test]
    fn mip_chain_halves_down_to_one() {
        let base = RgbaImage::from_pixel(8, 2, Rgba([10, 20, 30, 255]));
        let levels = mip_chain(base);
        let sizes: Vec<_> = levels.iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        let smallest = levels[3].get_pixel(0, 0).0;
        for (got, want) in smallest.iter().zip([10u8, 20, 30, 255]) {
            assert!(got.abs_diff(want) <= 1);
        }
    }

    #[test]
    fn concatenated_levels_are_tightly_packed() {
        let levels = mip_chain(GrayImage::from_pixel(4, 4, Luma([7])));
        let data = concat_levels(levels);
        assert_eq!(data.len(), 16 + 4 + 1);
    }

    #[test]
    fn channel_interpretation() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(1, 1));
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([1, 2, 3])));
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(1, 1));
        let gray_alpha = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(1, 1));

        assert_eq!(TextureChannels::of(&gray), TextureChannels::Single);
        assert_eq!(TextureChannels::of(&rgb), TextureChannels::Rgb);
        assert_eq!(TextureChannels::of(&rgba), TextureChannels::Rgba);
        assert_eq!(TextureChannels::of(&gray_alpha), TextureChannels::Rgba);

        assert_eq!(
            TextureChannels::Single.format(),
            wgpu::TextureFormat::R8Unorm
        );
        assert_eq!(
            TextureChannels::Rgb.format(),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
    }

    #[test]
    fn flip_puts_first_row_at_bottom() {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        let flipped = DynamicImage::ImageRgba8(img).flipv().to_rgba8();
        assert_eq!(flipped.get_pixel(0, 1), &Rgba([255, 0, 0, 255]));
    }
}
