use super::*;
use std::cell::RefCell;
use std::collections::HashMap;

/// A call received by [`RecordingGl`]
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderKind, ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    DetachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    GetAttribLocation(ProgramId, String),
    GetUniformLocation(ProgramId, String),
    SetUniform(UniformLocation, UniformData),
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData {
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    },
    BufferSubData {
        target: BufferTarget,
        offset: usize,
        len: usize,
    },
    DeleteBuffer(BufferId),
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        component: ComponentType,
        normalized: bool,
        stride: i32,
        offset: usize,
    },
    DrawArrays {
        prim: PrimType,
        first: i32,
        count: i32,
    },
    DrawElements {
        prim: PrimType,
        count: i32,
        offset: usize,
    },
    Enable(Capability),
    Disable(Capability),
    Clear(ClearMask),
    DepthMask(bool),
    DepthRange(f32, f32),
    LineWidth(f32),
    BlendFunc(BlendFactor, BlendFactor),
    CreateTexture(TextureId),
    ActiveTexture(u32),
    BindTexture(Option<TextureId>),
    TexParameters(TextureParams),
    TexImage2d {
        width: u32,
        height: u32,
        format: PixelFormat,
        len: usize,
    },
    DeleteTexture(TextureId),
}

impl GlCall {
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::DrawArrays { .. } | Self::DrawElements { .. })
    }
}

struct ShaderState {
    kind: ShaderKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramState {
    shaders: Vec<ShaderId>,
    linked: bool,
    log: String,
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, UniformLocation>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    next_location: u32,
    calls: Vec<GlCall>,
    shaders: HashMap<ShaderId, ShaderState>,
    programs: HashMap<ProgramId, ProgramState>,
    current_program: Option<ProgramId>,
    uniform_values: HashMap<UniformLocation, UniformData>,
    buffers: HashMap<BufferId, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, BufferId>,
    textures: Vec<TextureId>,
    fail_link: Option<String>,
    debug_errors: Vec<(u32, String)>,
    strings: HashMap<StringName, String>,
}

impl State {
    fn next_handle(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::MIN.saturating_add(self.next_id - 1)
    }

    fn bound_buffer_mut(&mut self, target: BufferTarget) -> Option<&mut Vec<u8>> {
        let id = *self.bound_buffers.get(&target)?;
        self.buffers.get_mut(&id)
    }
}

/// Declared name in a GLSL declaration line such as `uniform mat4 u_model;`
fn declared_name(line: &str) -> Option<String> {
    let last = line.split_whitespace().last()?;
    let name = last.trim_end_matches(';');
    let name = name.split('[').next().unwrap_or(name);
    (!name.is_empty()).then(|| name.to_string())
}

/// GPU-free [`OpenGl`] implementation for tests
///
/// Records every call and simulates object lifetimes, program linking and
/// uniform storage. Linking assigns locations to every `uniform`
/// declaration of the attached shaders and to every `in` declaration of
/// the vertex shaders. Sources containing `COMPILE_ERROR` fail to compile.
#[derive(Default)]
pub struct RecordingGl {
    state: RefCell<State>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.is_draw())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Make subsequent links fail with the given info log
    pub fn fail_link(&self, log: Option<&str>) {
        self.state.borrow_mut().fail_link = log.map(str::to_string);
    }

    /// Queue a debug message of type error, as a driver would report it
    pub fn push_debug_error(&self, id: u32, message: &str) {
        self.state
            .borrow_mut()
            .debug_errors
            .push((id, message.to_string()));
    }

    /// Report `value` for `name` instead of the built-in driver string
    pub fn set_string(&self, name: StringName, value: &str) {
        self.state
            .borrow_mut()
            .strings
            .insert(name, value.to_string());
    }

    /// Last value uploaded to the named uniform of a program
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformData> {
        let state = self.state.borrow();
        let location = state.programs.get(&program)?.uniforms.get(name)?;
        state.uniform_values.get(location).copied()
    }

    pub fn buffer_data(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl OpenGl for RecordingGl {
    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderId> {
        let mut state = self.state.borrow_mut();
        let id = ShaderId(state.next_handle());
        state.shaders.insert(
            id,
            ShaderState {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(GlCall::CreateShader(kind, id));
        Ok(id)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(s) = state.shaders.get_mut(&shader) {
            s.compiled = !s.source.contains("COMPILE_ERROR");
            s.log = if s.compiled || s.source.contains("COMPILE_ERROR_SILENT") {
                String::new()
            } else {
                "0:1: error: COMPILE_ERROR".to_string()
            };
        }
        state.calls.push(GlCall::CompileShader(shader));
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        state.shaders.remove(&shader);
        state.calls.push(GlCall::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<ProgramId> {
        let mut state = self.state.borrow_mut();
        let id = ProgramId(state.next_handle());
        state.programs.insert(id, ProgramState::default());
        state.calls.push(GlCall::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = state.programs.get_mut(&program) {
            p.shaders.push(shader);
        }
        state.calls.push(GlCall::AttachShader(program, shader));
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = state.programs.get_mut(&program) {
            p.shaders.retain(|s| *s != shader);
        }
        state.calls.push(GlCall::DetachShader(program, shader));
    }

    fn link_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::LinkProgram(program));

        let failure = state.fail_link.clone();
        let Some(shader_ids) = state.programs.get(&program).map(|p| p.shaders.clone()) else {
            return;
        };

        let mut attributes = Vec::new();
        let mut uniforms = Vec::new();
        for id in shader_ids {
            let Some(shader) = state.shaders.get(&id) else {
                continue;
            };
            for line in shader.source.lines().map(str::trim) {
                if line.starts_with("uniform ") {
                    uniforms.extend(declared_name(line));
                } else if line.starts_with("in ") && shader.kind == ShaderKind::Vertex {
                    attributes.extend(declared_name(line));
                }
            }
        }

        let mut locations = HashMap::new();
        for name in uniforms {
            if !locations.contains_key(&name) {
                let location = UniformLocation(state.next_location);
                state.next_location += 1;
                locations.insert(name, location);
            }
        }

        if let Some(p) = state.programs.get_mut(&program) {
            match failure {
                Some(log) => {
                    p.linked = false;
                    p.log = log;
                    p.attributes.clear();
                    p.uniforms.clear();
                }
                None => {
                    p.linked = true;
                    p.log.clear();
                    p.attributes = attributes
                        .into_iter()
                        .enumerate()
                        .map(|(i, name)| (name, i as u32))
                        .collect();
                    p.uniforms = locations;
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.calls.push(GlCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        state.current_program = program;
        state.calls.push(GlCall::UseProgram(program));
    }

    fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(GlCall::GetAttribLocation(program, name.to_string()));
        state.programs.get(&program)?.attributes.get(name).copied()
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(GlCall::GetUniformLocation(program, name.to_string()));
        state.programs.get(&program)?.uniforms.get(name).copied()
    }

    fn set_uniform(&self, location: UniformLocation, data: UniformData) {
        let mut state = self.state.borrow_mut();
        state.uniform_values.insert(location, data);
        state.calls.push(GlCall::SetUniform(location, data));
    }

    fn create_buffer(&self) -> Result<BufferId> {
        let mut state = self.state.borrow_mut();
        let id = BufferId(state.next_handle());
        state.buffers.insert(id, Vec::new());
        state.calls.push(GlCall::CreateBuffer(id));
        Ok(id)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferId>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(id) => state.bound_buffers.insert(target, id),
            None => state.bound_buffers.remove(&target),
        };
        state.calls.push(GlCall::BindBuffer(target, buffer));
    }

    fn buffer_data_size(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        if let Some(data) = state.bound_buffer_mut(target) {
            *data = vec![0; size];
        }
        state
            .calls
            .push(GlCall::BufferData { target, size, usage });
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        if let Some(buffer) = state.bound_buffer_mut(target) {
            let end = (offset + data.len()).min(buffer.len());
            if offset < end {
                buffer[offset..end].copy_from_slice(&data[..end - offset]);
            }
        }
        state.calls.push(GlCall::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        state.bound_buffers.retain(|_, b| *b != buffer);
        state.calls.push(GlCall::DeleteBuffer(buffer));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::DisableVertexAttribArray(index));
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
        self.record(GlCall::VertexAttribPointer {
            index,
            size,
            component,
            normalized,
            stride,
            offset,
        });
    }

    fn draw_arrays(&self, prim: PrimType, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { prim, first, count });
    }

    fn draw_elements(&self, prim: PrimType, count: i32, offset: usize) {
        self.record(GlCall::DrawElements {
            prim,
            count,
            offset,
        });
    }

    fn enable(&self, capability: Capability) {
        self.record(GlCall::Enable(capability));
    }

    fn disable(&self, capability: Capability) {
        self.record(GlCall::Disable(capability));
    }

    fn clear(&self, mask: ClearMask) {
        self.record(GlCall::Clear(mask));
    }

    fn depth_mask(&self, enabled: bool) {
        self.record(GlCall::DepthMask(enabled));
    }

    fn depth_range(&self, near: f32, far: f32) {
        self.record(GlCall::DepthRange(near, far));
    }

    fn line_width(&self, width: f32) {
        self.record(GlCall::LineWidth(width));
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        self.record(GlCall::BlendFunc(src, dst));
    }

    fn create_texture(&self) -> Result<TextureId> {
        let mut state = self.state.borrow_mut();
        let id = TextureId(state.next_handle());
        state.textures.push(id);
        state.calls.push(GlCall::CreateTexture(id));
        Ok(id)
    }

    fn active_texture(&self, unit: u32) {
        self.record(GlCall::ActiveTexture(unit));
    }

    fn bind_texture(&self, texture: Option<TextureId>) {
        self.record(GlCall::BindTexture(texture));
    }

    fn tex_parameters(&self, params: TextureParams) {
        self.record(GlCall::TexParameters(params));
    }

    fn tex_image_2d(&self, width: u32, height: u32, format: PixelFormat, data: &[u8]) {
        self.record(GlCall::TexImage2d {
            width,
            height,
            format,
            len: data.len(),
        });
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        state.textures.retain(|t| *t != texture);
        state.calls.push(GlCall::DeleteTexture(texture));
    }

    fn get_string(&self, name: StringName) -> String {
        if let Some(value) = self.state.borrow().strings.get(&name) {
            return value.clone();
        }
        match name {
            StringName::Vendor => "Recording",
            StringName::Renderer => "RecordingGl",
            StringName::Version => "3.3 (recorded)",
            StringName::ShadingLanguageVersion => "3.30",
        }
        .to_string()
    }

    fn check_errors(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.debug_errors.is_empty() {
            return Ok(());
        }
        let (id, message) = state.debug_errors.remove(0);
        Err(RenderError::GlDebug { id, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330 core\nuniform mat4 u_model;\nin vec3 a_position;\nin vec4 a_color;\nvoid main() {}\n";
    const FRAGMENT: &str = "#version 330 core\nuniform vec4 u_color;\nin vec4 v_color;\nvoid main() {}\n";

    fn linked_program(gl: &RecordingGl) -> ProgramId {
        let program = gl.create_program().unwrap();
        for (kind, source) in [(ShaderKind::Vertex, VERTEX), (ShaderKind::Fragment, FRAGMENT)] {
            let shader = gl.create_shader(kind).unwrap();
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            assert!(gl.shader_compile_status(shader));
            gl.attach_shader(program, shader);
        }
        gl.link_program(program);
        program
    }

    #[test]
    fn test_link_assigns_locations() {
        let gl = RecordingGl::new();
        let program = linked_program(&gl);
        assert!(gl.program_link_status(program));
        assert_eq!(gl.attrib_location(program, "a_position"), Some(0));
        assert_eq!(gl.attrib_location(program, "a_color"), Some(1));
        assert_eq!(gl.attrib_location(program, "v_color"), None);
        assert!(gl.uniform_location(program, "u_model").is_some());
        assert!(gl.uniform_location(program, "u_color").is_some());
        assert!(gl.uniform_location(program, "u_missing").is_none());
    }

    #[test]
    fn test_uniform_values_are_stored() {
        let gl = RecordingGl::new();
        let program = linked_program(&gl);
        let loc = gl.uniform_location(program, "u_color").unwrap();
        gl.set_uniform(loc, UniformData::Vec4([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(
            gl.uniform_value(program, "u_color"),
            Some(UniformData::Vec4([1.0, 0.0, 0.0, 1.0]))
        );
    }

    #[test]
    fn test_compile_failure() {
        let gl = RecordingGl::new();
        let shader = gl.create_shader(ShaderKind::Vertex).unwrap();
        gl.shader_source(shader, "COMPILE_ERROR");
        gl.compile_shader(shader);
        assert!(!gl.shader_compile_status(shader));
        assert!(!gl.shader_info_log(shader).is_empty());
    }

    #[test]
    fn test_link_failure() {
        let gl = RecordingGl::new();
        gl.fail_link(Some("missing main"));
        let program = linked_program(&gl);
        assert!(!gl.program_link_status(program));
        assert_eq!(gl.program_info_log(program), "missing main");
    }

    #[test]
    fn test_buffer_data() {
        let gl = RecordingGl::new();
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(BufferTarget::Array, Some(buffer));
        gl.buffer_data_size(BufferTarget::Array, 4, BufferUsage::StaticDraw);
        gl.buffer_sub_data(BufferTarget::Array, 1, &[7, 8]);
        assert_eq!(gl.buffer_data(buffer), Some(vec![0, 7, 8, 0]));
        gl.delete_buffer(buffer);
        assert_eq!(gl.live_buffers(), 0);
    }

    #[test]
    fn test_debug_errors_surface_once() {
        let gl = RecordingGl::new();
        gl.push_debug_error(1281, "invalid value");
        let err = gl.check_errors().unwrap_err();
        assert_eq!(err.to_string(), "OpenGL error: 1281 (invalid value)");
        assert!(gl.check_errors().is_ok());
    }

    #[test]
    fn test_debug_errors_surface_in_order() {
        let gl = RecordingGl::new();
        gl.push_debug_error(1280, "invalid enum");
        gl.push_debug_error(1282, "invalid operation");
        assert!(matches!(
            gl.check_errors(),
            Err(RenderError::GlDebug { id: 1280, .. })
        ));
        assert!(matches!(
            gl.check_errors(),
            Err(RenderError::GlDebug { id: 1282, .. })
        ));
        assert!(gl.check_errors().is_ok());
    }
}
