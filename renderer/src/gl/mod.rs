//! OpenGL seam
//!
//! Everything the renderer needs from OpenGL goes through the [`OpenGl`]
//! trait. [`GlowContext`] forwards to a real context through `glow`,
//! [`RecordingGl`] records calls and simulates enough state for tests.

mod glow_backend;
mod recording;

pub use glow_backend::GlowContext;
pub use recording::{GlCall, RecordingGl};

use crate::error::{RenderError, Result};
use crate::graphics::PrimType;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::ops::BitOr;
use std::rc::Rc;

/// Shared handle to the GL implementation used by all renderer objects
pub type GlRef = Rc<dyn OpenGl>;

macro_rules! gl_handle {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub NonZeroU32);

            impl $name {
                pub fn get(self) -> u32 {
                    self.0.get()
                }
            }
        )*
    };
}

gl_handle!(ProgramId, ShaderId, BufferId, TextureId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    /// Derive the shader kind from a `.vertsh` / `.fragsh` file name
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("vertsh") => Ok(Self::Vertex),
            Some("fragsh") => Ok(Self::Fragment),
            _ => Err(RenderError::UnknownShaderType(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    Blend,
    CullFace,
}

/// Buffers to clear; combine with `|`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearMask(u8);

impl ClearMask {
    pub const COLOR: Self = Self(1);
    pub const DEPTH: Self = Self(2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClearMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringName {
    Vendor,
    Renderer,
    Version,
    ShadingLanguageVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One byte per pixel, sampled from the red channel
    Red,
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Red => 1,
            Self::Rgba => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
        }
    }
}

/// Scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl ComponentType {
    pub const fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }
}

/// Maps a Rust scalar to its GL component type
pub trait GlComponent: bytemuck::Pod {
    const COMPONENT_TYPE: ComponentType;
}

macro_rules! gl_component {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl GlComponent for $ty {
            const COMPONENT_TYPE: ComponentType = ComponentType::$variant;
        })*
    };
}

gl_component!(
    i8 => Byte,
    u8 => UnsignedByte,
    i16 => Short,
    u16 => UnsignedShort,
    i32 => Int,
    u32 => UnsignedInt,
    f32 => Float,
);

/// Blend function factor, convertible from and to its GL enum name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

const BLEND_FACTOR_NAMES: [(BlendFactor, &str); 15] = [
    (BlendFactor::Zero, "GL_ZERO"),
    (BlendFactor::One, "GL_ONE"),
    (BlendFactor::SrcColor, "GL_SRC_COLOR"),
    (BlendFactor::OneMinusSrcColor, "GL_ONE_MINUS_SRC_COLOR"),
    (BlendFactor::DstColor, "GL_DST_COLOR"),
    (BlendFactor::OneMinusDstColor, "GL_ONE_MINUS_DST_COLOR"),
    (BlendFactor::SrcAlpha, "GL_SRC_ALPHA"),
    (BlendFactor::OneMinusSrcAlpha, "GL_ONE_MINUS_SRC_ALPHA"),
    (BlendFactor::DstAlpha, "GL_DST_ALPHA"),
    (BlendFactor::OneMinusDstAlpha, "GL_ONE_MINUS_DST_ALPHA"),
    (BlendFactor::ConstantColor, "GL_CONSTANT_COLOR"),
    (BlendFactor::OneMinusConstantColor, "GL_ONE_MINUS_CONSTANT_COLOR"),
    (BlendFactor::ConstantAlpha, "GL_CONSTANT_ALPHA"),
    (BlendFactor::OneMinusConstantAlpha, "GL_ONE_MINUS_CONSTANT_ALPHA"),
    (BlendFactor::SrcAlphaSaturate, "GL_SRC_ALPHA_SATURATE"),
];

impl BlendFactor {
    pub fn from_name(name: &str) -> Result<Self> {
        BLEND_FACTOR_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(factor, _)| *factor)
            .ok_or_else(|| RenderError::UnknownEnum(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        BLEND_FACTOR_NAMES
            .iter()
            .find(|(factor, _)| *factor == self)
            .map(|(_, n)| *n)
            .unwrap_or("GL_ZERO")
    }
}

impl TryFrom<String> for BlendFactor {
    type Error = RenderError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_name(&value)
    }
}

impl From<BlendFactor> for String {
    fn from(value: BlendFactor) -> Self {
        value.name().to_string()
    }
}

/// Value uploaded to a uniform location; matrices are column-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

/// The OpenGL entry points used by the renderer
///
/// All methods must be called on the thread that owns the context.
pub trait OpenGl {
    // Shaders
    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderId>;
    fn shader_source(&self, shader: ShaderId, source: &str);
    fn compile_shader(&self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&self, shader: ShaderId);

    // Programs
    fn create_program(&self) -> Result<ProgramId>;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&self, program: ProgramId, shader: ShaderId);
    fn link_program(&self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);
    fn current_program(&self) -> Option<ProgramId>;
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, location: UniformLocation, data: UniformData);

    // Buffers and vertex attributes
    fn create_buffer(&self) -> Result<BufferId>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>);
    fn buffer_data_size(&self, target: BufferTarget, size: usize, usage: BufferUsage);
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferId);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn disable_vertex_attrib_array(&self, index: u32);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        component: ComponentType,
        normalized: bool,
        stride: i32,
        offset: usize,
    );

    // Drawing
    fn draw_arrays(&self, prim: PrimType, first: i32, count: i32);
    fn draw_elements(&self, prim: PrimType, count: i32, offset: usize);

    // Pipeline state
    fn enable(&self, capability: Capability);
    fn disable(&self, capability: Capability);
    fn clear(&self, mask: ClearMask);
    fn depth_mask(&self, enabled: bool);
    fn depth_range(&self, near: f32, far: f32);
    fn line_width(&self, width: f32);
    fn blend_func(&self, src: BlendFactor, dst: BlendFactor);

    // Textures
    fn create_texture(&self) -> Result<TextureId>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<TextureId>);
    fn tex_parameters(&self, params: TextureParams);
    fn tex_image_2d(&self, width: u32, height: u32, format: PixelFormat, data: &[u8]);
    fn delete_texture(&self, texture: TextureId);

    fn get_string(&self, name: StringName) -> String;

    /// Fail with the oldest pending GL error, if any
    ///
    /// Later errors stay pending for the next call.
    fn check_errors(&self) -> Result<()>;
}
