use super::*;
use glow::HasContext;
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// [`OpenGl`] implementation over a `glow` context
///
/// Creates and binds one vertex array object for the lifetime of the
/// context, as required by core profiles. Debug messages of type error are
/// queued and reported one at a time by [`OpenGl::check_errors`]; all
/// others are logged.
pub struct GlowContext {
    gl: glow::Context,
    vertex_array: Option<glow::VertexArray>,
    current_program: Cell<Option<ProgramId>>,
    debug_errors: Arc<Mutex<VecDeque<(u32, String)>>>,
}

impl GlowContext {
    /// Wrap a context that is current on the calling thread
    ///
    /// # Safety
    /// The context must stay current on this thread for as long as the
    /// returned value and every renderer object created from it are alive.
    pub unsafe fn new(mut gl: glow::Context) -> Result<Self> {
        let debug_errors = Arc::new(Mutex::new(VecDeque::new()));

        if gl.supported_extensions().contains("GL_KHR_debug") || gl.version().major >= 4 {
            let queue = Arc::clone(&debug_errors);
            gl.enable(glow::DEBUG_OUTPUT);
            gl.debug_message_callback(move |_source, kind, id, severity, message: &str| {
                if kind == glow::DEBUG_TYPE_ERROR {
                    if let Ok(mut queue) = queue.lock() {
                        queue.push_back((id, message.to_string()));
                    }
                    return;
                }
                match severity {
                    glow::DEBUG_SEVERITY_HIGH => error!(id, "GL: {message}"),
                    glow::DEBUG_SEVERITY_MEDIUM => warn!(id, "GL: {message}"),
                    glow::DEBUG_SEVERITY_LOW => info!(id, "GL: {message}"),
                    _ => debug!(id, "GL: {message}"),
                }
            });
            debug!("Installed GL debug message callback");
        }

        let vertex_array = gl.create_vertex_array().map_err(RenderError::CreateBuffer)?;
        gl.bind_vertex_array(Some(vertex_array));

        Ok(Self {
            gl,
            vertex_array: Some(vertex_array),
            current_program: Cell::new(None),
            debug_errors,
        })
    }

    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }
}

impl Drop for GlowContext {
    fn drop(&mut self) {
        if let Some(vao) = self.vertex_array.take() {
            unsafe { self.gl.delete_vertex_array(vao) };
        }
    }
}

fn native_program(id: ProgramId) -> glow::Program {
    glow::NativeProgram(id.0)
}

fn native_shader(id: ShaderId) -> glow::Shader {
    glow::NativeShader(id.0)
}

fn native_buffer(id: BufferId) -> glow::Buffer {
    glow::NativeBuffer(id.0)
}

fn native_texture(id: TextureId) -> glow::Texture {
    glow::NativeTexture(id.0)
}

fn native_location(location: UniformLocation) -> glow::UniformLocation {
    glow::NativeUniformLocation(location.0)
}

fn shader_kind(kind: ShaderKind) -> u32 {
    match kind {
        ShaderKind::Vertex => glow::VERTEX_SHADER,
        ShaderKind::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
    }
}

fn component_type(component: ComponentType) -> u32 {
    match component {
        ComponentType::Byte => glow::BYTE,
        ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
        ComponentType::Short => glow::SHORT,
        ComponentType::UnsignedShort => glow::UNSIGNED_SHORT,
        ComponentType::Int => glow::INT,
        ComponentType::UnsignedInt => glow::UNSIGNED_INT,
        ComponentType::Float => glow::FLOAT,
    }
}

fn prim_type(prim: PrimType) -> u32 {
    match prim {
        PrimType::Points => glow::POINTS,
        PrimType::Lines => glow::LINES,
        PrimType::LineStrip => glow::LINE_STRIP,
        PrimType::LineLoop => glow::LINE_LOOP,
        PrimType::Triangles => glow::TRIANGLES,
        PrimType::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimType::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::ConstantAlpha => glow::CONSTANT_ALPHA,
        BlendFactor::OneMinusConstantAlpha => glow::ONE_MINUS_CONSTANT_ALPHA,
        BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
    }
}

fn filter(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST as i32,
        TextureFilter::Linear => glow::LINEAR as i32,
    }
}

impl OpenGl for GlowContext {
    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderId> {
        unsafe { self.gl.create_shader(shader_kind(kind)) }
            .map(|s| ShaderId(s.0))
            .map_err(RenderError::CreateShader)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        unsafe { self.gl.shader_source(native_shader(shader), source) }
    }

    fn compile_shader(&self, shader: ShaderId) {
        unsafe { self.gl.compile_shader(native_shader(shader)) }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        unsafe { self.gl.get_shader_compile_status(native_shader(shader)) }
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        unsafe { self.gl.get_shader_info_log(native_shader(shader)) }
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { self.gl.delete_shader(native_shader(shader)) }
    }

    fn create_program(&self) -> Result<ProgramId> {
        unsafe { self.gl.create_program() }
            .map(|p| ProgramId(p.0))
            .map_err(RenderError::CreateProgram)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe {
            self.gl
                .attach_shader(native_program(program), native_shader(shader))
        }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe {
            self.gl
                .detach_shader(native_program(program), native_shader(shader))
        }
    }

    fn link_program(&self, program: ProgramId) {
        unsafe { self.gl.link_program(native_program(program)) }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        unsafe { self.gl.get_program_link_status(native_program(program)) }
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        unsafe { self.gl.get_program_info_log(native_program(program)) }
    }

    fn delete_program(&self, program: ProgramId) {
        if self.current_program.get() == Some(program) {
            self.current_program.set(None);
        }
        unsafe { self.gl.delete_program(native_program(program)) }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.current_program.set(program);
        unsafe { self.gl.use_program(program.map(native_program)) }
    }

    fn current_program(&self) -> Option<ProgramId> {
        self.current_program.get()
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(native_program(program), name) }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(native_program(program), name) }
            .map(|l| UniformLocation(l.0))
    }

    fn set_uniform(&self, location: UniformLocation, data: UniformData) {
        let loc = native_location(location);
        let loc = Some(&loc);
        unsafe {
            match data {
                UniformData::Int(v) => self.gl.uniform_1_i32(loc, v),
                UniformData::Float(v) => self.gl.uniform_1_f32(loc, v),
                UniformData::Vec2([x, y]) => self.gl.uniform_2_f32(loc, x, y),
                UniformData::Vec3([x, y, z]) => self.gl.uniform_3_f32(loc, x, y, z),
                UniformData::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(loc, x, y, z, w),
                UniformData::Mat2(m) => self.gl.uniform_matrix_2_f32_slice(loc, false, &m),
                UniformData::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(loc, false, &m),
                UniformData::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(loc, false, &m),
            }
        }
    }

    fn create_buffer(&self) -> Result<BufferId> {
        unsafe { self.gl.create_buffer() }
            .map(|b| BufferId(b.0))
            .map_err(RenderError::CreateBuffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>) {
        unsafe {
            self.gl
                .bind_buffer(buffer_target(target), buffer.map(native_buffer))
        }
    }

    fn buffer_data_size(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_size(buffer_target(target), size as i32, buffer_usage(usage))
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(buffer_target(target), offset as i32, data)
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(native_buffer(buffer)) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        component: ComponentType,
        normalized: bool,
        stride: i32,
        offset: usize,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                size,
                component_type(component),
                normalized,
                stride,
                offset as i32,
            )
        }
    }

    fn draw_arrays(&self, prim: PrimType, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(prim_type(prim), first, count) }
    }

    fn draw_elements(&self, prim: PrimType, count: i32, offset: usize) {
        unsafe {
            self.gl
                .draw_elements(prim_type(prim), count, glow::UNSIGNED_INT, offset as i32)
        }
    }

    fn enable(&self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) }
    }

    fn disable(&self, cap: Capability) {
        unsafe { self.gl.disable(capability(cap)) }
    }

    fn clear(&self, mask: ClearMask) {
        let mut bits = 0;
        if mask.contains(ClearMask::COLOR) {
            bits |= glow::COLOR_BUFFER_BIT;
        }
        if mask.contains(ClearMask::DEPTH) {
            bits |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(bits) }
    }

    fn depth_mask(&self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) }
    }

    fn depth_range(&self, near: f32, far: f32) {
        unsafe { self.gl.depth_range_f32(near, far) }
    }

    fn line_width(&self, width: f32) {
        unsafe { self.gl.line_width(width) }
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(blend_factor(src), blend_factor(dst)) }
    }

    fn create_texture(&self) -> Result<TextureId> {
        unsafe { self.gl.create_texture() }
            .map(|t| TextureId(t.0))
            .map_err(RenderError::CreateTexture)
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: Option<TextureId>) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(native_texture))
        }
    }

    fn tex_parameters(&self, params: TextureParams) {
        let wrap = match params.wrap {
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        } as i32;
        unsafe {
            let target = glow::TEXTURE_2D;
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter(params.min_filter));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter(params.mag_filter));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap);
        }
    }

    fn tex_image_2d(&self, width: u32, height: u32, format: PixelFormat, data: &[u8]) {
        let (internal, format) = match format {
            PixelFormat::Red => (glow::R8, glow::RED),
            PixelFormat::Rgba => (glow::RGBA8, glow::RGBA),
        };
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal as i32,
                width as i32,
                height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data)),
            );
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        unsafe { self.gl.delete_texture(native_texture(texture)) }
    }

    fn get_string(&self, name: StringName) -> String {
        let name = match name {
            StringName::Vendor => glow::VENDOR,
            StringName::Renderer => glow::RENDERER,
            StringName::Version => glow::VERSION,
            StringName::ShadingLanguageVersion => glow::SHADING_LANGUAGE_VERSION,
        };
        unsafe { self.gl.get_parameter_string(name) }
    }

    fn check_errors(&self) -> Result<()> {
        let queued = self
            .debug_errors
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        if let Some((id, message)) = queued {
            return Err(RenderError::GlDebug { id, message });
        }

        let code = unsafe { self.gl.get_error() };
        if code != glow::NO_ERROR {
            return Err(RenderError::GlDebug {
                id: code,
                message: "glGetError".to_string(),
            });
        }
        Ok(())
    }
}
