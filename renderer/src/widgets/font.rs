//! Texture fonts
//!
//! Glyph rasterisation is delegated to a [`FontFactory`]; this module
//! packs glyphs into a single-channel texture and lays out strings as
//! textured triangles.

use crate::error::{RenderError, Result};
use crate::gl::{GlRef, PixelFormat, TextureId, TextureParams};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

/// Identifies a font by file, pixel size and covered character range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FontDescriptor {
    pub path: PathBuf,
    pub size: usize,
    pub min_char: u8,
    pub char_count: u8,
}

impl FontDescriptor {
    pub fn new(path: impl Into<PathBuf>, size: usize) -> Self {
        Self {
            path: path.into(),
            size,
            ..Self::default()
        }
    }

    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fonts/SourceSansPro-Regular.otf"),
            size: 13,
            min_char: b' ',
            char_count: 96,
        }
    }
}

/// Square single-channel texture holding the glyph cells of a font
///
/// Pixels are kept on the CPU until the first activation uploads them;
/// the CPU copy is released afterwards.
pub struct FontTexture {
    gl: GlRef,
    size: usize,
    buffer: RefCell<Option<Vec<u8>>>,
    texture: Cell<Option<TextureId>>,
}

impl FontTexture {
    /// Smallest power of two that fits `cells_per_row` cells of `cell_size` with margins
    pub fn compute_size(cells_per_row: usize, cell_size: usize, margin: usize) -> usize {
        let min_size = margin + cells_per_row * (cell_size + margin);
        min_size.max(1).next_power_of_two()
    }

    pub fn new(gl: GlRef, cells_per_row: usize, cell_size: usize, margin: usize) -> Self {
        let size = Self::compute_size(cells_per_row, cell_size, margin);
        Self {
            gl,
            size,
            buffer: RefCell::new(Some(vec![0; size * size])),
            texture: Cell::new(None),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_uploaded(&self) -> bool {
        self.texture.get().is_some()
    }

    /// Set one pixel before the upload; ignored afterwards
    pub fn put_pixel(&self, x: usize, y: usize, value: u8) {
        if x >= self.size || y >= self.size {
            return;
        }
        if let Some(buffer) = self.buffer.borrow_mut().as_mut() {
            buffer[y * self.size + x] = value;
        }
    }

    pub fn activate(&self) -> Result<()> {
        if let Some(texture) = self.texture.get() {
            self.gl.bind_texture(Some(texture));
            return Ok(());
        }

        let texture = self.gl.create_texture()?;
        self.gl.active_texture(0);
        self.gl.bind_texture(Some(texture));
        self.gl.tex_parameters(TextureParams::default());
        if let Some(pixels) = self.buffer.borrow_mut().take() {
            let size = self.size as u32;
            self.gl.tex_image_2d(size, size, PixelFormat::Red, &pixels);
        }
        self.texture.set(Some(texture));
        debug!(size = self.size, "Uploaded font texture");
        Ok(())
    }

    pub fn deactivate(&self) {
        self.gl.bind_texture(None);
    }
}

impl Drop for FontTexture {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.gl.delete_texture(texture);
        }
    }
}

/// Placement of one glyph in the font texture, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub advance: usize,
}

pub struct TextureFont {
    texture: FontTexture,
    glyphs: Vec<Glyph>,
    line_height: usize,
    min_char: u8,
}

impl TextureFont {
    pub fn new(texture: FontTexture, glyphs: Vec<Glyph>, line_height: usize, min_char: u8) -> Self {
        Self {
            texture,
            glyphs,
            line_height,
            min_char,
        }
    }

    pub fn line_height(&self) -> usize {
        self.line_height
    }

    pub fn texture(&self) -> &FontTexture {
        &self.texture
    }

    fn glyph(&self, c: char) -> Option<&Glyph> {
        let index = u32::from(c).checked_sub(u32::from(self.min_char))?;
        self.glyphs.get(index as usize).or_else(|| {
            let fallback = u32::from(b'?').checked_sub(u32::from(self.min_char))?;
            self.glyphs.get(fallback as usize)
        })
    }

    /// Size of the laid out string in pixels
    pub fn measure(&self, text: &str) -> Vec2 {
        let mut width = 0usize;
        let mut lines = 0usize;
        for line in text.split('\n') {
            lines += 1;
            let line_width: usize = line.chars().filter_map(|c| self.glyph(c)).map(|g| g.advance).sum();
            width = width.max(line_width);
        }
        Vec2::new(width as f32, (lines * self.line_height) as f32)
    }

    /// Position and texture coordinate pairs for the string, six per glyph
    ///
    /// The first line is at the top; the bottom left of the last line is at
    /// `offset`.
    pub fn quads(&self, text: &str, offset: Vec2) -> Vec<(Vec2, Vec2)> {
        let lines: Vec<&str> = text.split('\n').collect();
        let texture_size = self.texture.size() as f32;
        let mut vertices = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            let y = offset.y + ((lines.len() - 1 - row) * self.line_height) as f32;
            let mut x = offset.x;
            for glyph in line.chars().filter_map(|c| self.glyph(c)) {
                if glyph.width > 0 && glyph.height > 0 {
                    let p0 = Vec2::new(x, y);
                    let p1 = p0 + Vec2::new(glyph.width as f32, glyph.height as f32);
                    // Texture rows grow downwards from the glyph's top edge
                    let t0 = Vec2::new(glyph.x as f32, (glyph.y + glyph.height) as f32) / texture_size;
                    let t1 = Vec2::new((glyph.x + glyph.width) as f32, glyph.y as f32) / texture_size;
                    vertices.extend([
                        (p0, t0),
                        (Vec2::new(p1.x, p0.y), Vec2::new(t1.x, t0.y)),
                        (p1, t1),
                        (p0, t0),
                        (p1, t1),
                        (Vec2::new(p0.x, p1.y), Vec2::new(t0.x, t1.y)),
                    ]);
                }
                x += glyph.advance as f32;
            }
        }
        vertices
    }

    pub fn activate(&self) -> Result<()> {
        self.texture.activate()
    }

    pub fn deactivate(&self) {
        self.texture.deactivate();
    }
}

/// Rasterises fonts into textures
pub trait FontFactory {
    fn create_font(&self, gl: &GlRef, descriptor: &FontDescriptor) -> Result<TextureFont>;
}

/// Monospace placeholder font drawing every printable glyph as a box
///
/// Used where no rasteriser is available; labels keep their layout and
/// measurements.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridFontFactory;

impl GridFontFactory {
    const MARGIN: usize = 2;
}

impl FontFactory for GridFontFactory {
    fn create_font(&self, gl: &GlRef, descriptor: &FontDescriptor) -> Result<TextureFont> {
        if descriptor.size == 0 || descriptor.char_count == 0 {
            return Err(RenderError::Font(format!(
                "{} at size {}",
                descriptor.name(),
                descriptor.size
            )));
        }
        let cell = descriptor.size;
        let glyph_width = (cell * 3 / 5).max(1);
        let count = usize::from(descriptor.char_count);
        let cells_per_row = (count as f64).sqrt().ceil() as usize;
        let texture = FontTexture::new(Rc::clone(gl), cells_per_row, cell, Self::MARGIN);

        let mut glyphs = Vec::with_capacity(count);
        for i in 0..count {
            let x = Self::MARGIN + (i % cells_per_row) * (cell + Self::MARGIN);
            let y = Self::MARGIN + (i / cells_per_row) * (cell + Self::MARGIN);
            let c = descriptor.min_char.saturating_add(i as u8);
            if c.is_ascii_graphic() {
                for px in 0..glyph_width {
                    for py in 0..cell {
                        let border = px == 0 || py == 0 || px + 1 == glyph_width || py + 1 == cell;
                        if border {
                            texture.put_pixel(x + px, y + py, 0xFF);
                        }
                    }
                }
            }
            glyphs.push(Glyph {
                x,
                y,
                width: glyph_width,
                height: cell,
                advance: glyph_width + 1,
            });
        }

        info!("Created placeholder font {} ({}px)", descriptor.name(), cell);
        Ok(TextureFont::new(texture, glyphs, cell, descriptor.min_char))
    }
}

/// Creates fonts on first use and caches them per descriptor
pub struct FontManager {
    gl: GlRef,
    factory: Box<dyn FontFactory>,
    fonts: RefCell<HashMap<FontDescriptor, Rc<TextureFont>>>,
}

impl FontManager {
    pub fn new(gl: GlRef, factory: Box<dyn FontFactory>) -> Self {
        Self {
            gl,
            factory,
            fonts: RefCell::new(HashMap::new()),
        }
    }

    pub fn font(&self, descriptor: &FontDescriptor) -> Result<Rc<TextureFont>> {
        if let Some(font) = self.fonts.borrow().get(descriptor) {
            return Ok(Rc::clone(font));
        }
        let font = Rc::new(self.factory.create_font(&self.gl, descriptor)?);
        self.fonts
            .borrow_mut()
            .insert(descriptor.clone(), Rc::clone(&font));
        Ok(font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{GlCall, RecordingGl};

    fn font(recording: &Rc<RecordingGl>) -> TextureFont {
        let gl: GlRef = recording.clone();
        GridFontFactory
            .create_font(&gl, &FontDescriptor::new("fonts/Test.ttf", 10))
            .unwrap()
    }

    #[test]
    fn test_texture_size_is_power_of_two() {
        assert_eq!(FontTexture::compute_size(10, 10, 2), 128);
        assert_eq!(FontTexture::compute_size(4, 13, 2), 64);
        assert_eq!(FontTexture::compute_size(1, 1, 0), 1);
    }

    #[test]
    fn test_measure() {
        let recording = Rc::new(RecordingGl::new());
        let font = font(&recording);
        // 6px glyphs advance by 7
        assert_eq!(font.measure("abc"), Vec2::new(21.0, 10.0));
        assert_eq!(font.measure("ab\nabcd"), Vec2::new(28.0, 20.0));
    }

    #[test]
    fn test_quads_six_vertices_per_glyph() {
        let recording = Rc::new(RecordingGl::new());
        let font = font(&recording);
        let quads = font.quads("ab\nc", Vec2::ZERO);
        assert_eq!(quads.len(), 18);
        // First line sits above the second
        assert_eq!(quads[0].0, Vec2::new(0.0, 10.0));
        assert_eq!(quads[12].0, Vec2::ZERO);
    }

    #[test]
    fn test_lazy_upload() {
        let recording = Rc::new(RecordingGl::new());
        let font = font(&recording);
        assert!(!font.texture().is_uploaded());
        font.activate().unwrap();
        font.activate().unwrap();
        let uploads = recording
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::TexImage2d { format: PixelFormat::Red, .. }))
            .count();
        assert_eq!(uploads, 1);
        drop(font);
        assert_eq!(recording.live_textures(), 0);
    }

    #[test]
    fn test_manager_caches_fonts() {
        let recording = Rc::new(RecordingGl::new());
        let manager = FontManager::new(recording.clone(), Box::new(GridFontFactory));
        let a = manager.font(&FontDescriptor::default()).unwrap();
        let b = manager.font(&FontDescriptor::default()).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(manager.font(&FontDescriptor::new("x.ttf", 0)).is_err());
    }
}
