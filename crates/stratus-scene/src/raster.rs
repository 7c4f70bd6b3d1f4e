use stratus_core::types::Rgb;

/// One RGBA8 texel (matches an `Rgba8Unorm` upload layout).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Filled square in raster-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Packed `0xRRGGBB`.
    pub color: u32,
    pub alpha: f32,
}

/// CPU-side texture for one fragment, sized to its bounding box.
#[derive(Debug, Clone)]
pub struct RasterTarget {
    width: u32,
    height: u32,
    texels: Vec<Rgba8>,
    redraws: u32,
}

impl RasterTarget {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![Rgba8::default(); width as usize * height as usize],
            redraws: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Times this target has been re-rasterized.
    pub fn redraw_count(&self) -> u32 {
        self.redraws
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get((y * self.width + x) as usize).copied()
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn clear(&mut self) {
        self.texels.fill(Rgba8::default());
    }

    /// Source-over fill of a rect, clipped to the target.
    pub fn fill_rect(&mut self, rect: &DrawRect) {
        let alpha = rect.alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 || rect.size <= 0.0 {
            return;
        }
        let x0 = rect.x.floor().max(0.0) as u32;
        let y0 = rect.y.floor().max(0.0) as u32;
        let x1 = ((rect.x + rect.size).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((rect.y + rect.size).ceil().max(0.0) as u32).min(self.height);

        let src = Rgb::unpack(rect.color);
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for x in x0..x1 {
                let dst = &mut self.texels[row + x as usize];
                *dst = blend_over(*dst, src, alpha);
            }
        }
    }

    /// Clear and draw `rects` in order.
    pub fn rasterize(&mut self, rects: &[DrawRect]) {
        self.clear();
        for rect in rects {
            self.fill_rect(rect);
        }
        self.redraws += 1;
    }
}

fn blend_over(dst: Rgba8, src: Rgb, alpha: f32) -> Rgba8 {
    let dst_a = dst.a as f32 / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return Rgba8::default();
    }
    let mix = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * alpha + d as f32 * dst_a * (1.0 - alpha)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba8 {
        r: mix(src.r, dst.r),
        g: mix(src.g, dst.g),
        b: mix(src.b, dst.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}
