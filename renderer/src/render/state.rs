use super::RenderContext;
use crate::core::{Camera, Transformation};
use crate::error::Result;
use crate::gl::OpenGl;
use crate::shaders::ShaderManager;
use glam::{Mat4, Vec3};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    TwoD,
    ThreeD,
}

/// Visibility of the selection guide for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionGuide {
    Show,
    Hide,
    ForceShow,
    ForceHide,
}

/// Per-frame rendering state of one view
///
/// Holds the camera, the transformation stacks initialised from it, the
/// shared [`RenderContext`] and the display flags of the view.
pub struct RenderState<'a> {
    mode: RenderMode,
    camera: &'a Camera,
    transformation: Transformation,
    context: &'a RenderContext,

    show_textures: bool,
    show_faces: bool,
    show_edges: bool,
    shade_faces: bool,
    show_point_entities: bool,
    show_point_entity_models: bool,
    show_entity_classnames: bool,
    show_group_bounds: bool,
    show_brush_entity_bounds: bool,
    show_point_entity_bounds: bool,
    show_fog: bool,
    show_grid: bool,
    grid_size: f32,
    soft_map_bounds: Option<(Vec3, Vec3)>,
    hide_selection: bool,
    tint_selection: bool,
    selection_guide: SelectionGuide,
}

impl<'a> RenderState<'a> {
    pub fn new(mode: RenderMode, camera: &'a Camera, context: &'a RenderContext) -> Self {
        Self {
            mode,
            camera,
            transformation: Transformation::new(camera.projection_matrix(), camera.view_matrix()),
            context,
            show_textures: true,
            show_faces: true,
            show_edges: true,
            shade_faces: true,
            show_point_entities: true,
            show_point_entity_models: true,
            show_entity_classnames: true,
            show_group_bounds: true,
            show_brush_entity_bounds: true,
            show_point_entity_bounds: true,
            show_fog: false,
            show_grid: true,
            grid_size: 4.0,
            soft_map_bounds: None,
            hide_selection: false,
            tint_selection: true,
            selection_guide: SelectionGuide::Hide,
        }
    }

    pub fn render_2d(&self) -> bool {
        self.mode == RenderMode::TwoD
    }

    pub fn render_3d(&self) -> bool {
        self.mode == RenderMode::ThreeD
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn camera(&self) -> &'a Camera {
        self.camera
    }

    pub fn context(&self) -> &'a RenderContext {
        self.context
    }

    pub fn gl(&self) -> &'a dyn OpenGl {
        self.context.gl().as_ref()
    }

    pub fn shader_manager(&self) -> &'a ShaderManager {
        self.context.shader_manager()
    }

    pub fn transformation(&self) -> &Transformation {
        &self.transformation
    }

    /// Run `f` with the given projection and view on top of the stacks
    ///
    /// The model stack is reset to identity for the duration of `f`.
    pub fn with_replaced_transformation<R>(
        &mut self,
        projection: Mat4,
        view: Mat4,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.transformation
            .push_transformation(projection, view, Mat4::IDENTITY);
        let result = self.sync_current_program().and_then(|_| f(self));
        self.transformation.pop_transformation();
        self.sync_current_program()?;
        result
    }

    /// Run `f` with `matrix` multiplied onto the current model matrix
    pub fn with_multiplied_model_matrix<R>(
        &mut self,
        matrix: Mat4,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.transformation.push_model_matrix(matrix);
        self.scoped_model(f)
    }

    /// Run `f` with `matrix` as the model matrix
    pub fn with_replaced_model_matrix<R>(
        &mut self,
        matrix: Mat4,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.transformation.replace_and_push_model_matrix(matrix);
        self.scoped_model(f)
    }

    fn scoped_model<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let result = self.sync_model().and_then(|_| f(self));
        self.transformation.pop_model_matrix();
        self.sync_model()?;
        result
    }

    fn sync_model(&self) -> Result<()> {
        if let Some(program) = self.shader_manager().current_program() {
            trace!(program = program.name(), "Updating model matrix");
            program.set("u_model", self.transformation.model())?;
        }
        Ok(())
    }

    fn sync_current_program(&self) -> Result<()> {
        if let Some(program) = self.shader_manager().current_program() {
            program.set("u_projection", self.transformation.projection())?;
            program.set("u_view", self.transformation.view())?;
            program.set("u_model", self.transformation.model())?;
        }
        Ok(())
    }

    pub fn show_textures(&self) -> bool {
        self.show_textures
    }

    pub fn set_show_textures(&mut self, show: bool) {
        self.show_textures = show;
    }

    /// Faces are only drawn in 3D views
    pub fn show_faces(&self) -> bool {
        self.render_3d() && self.show_faces
    }

    pub fn set_show_faces(&mut self, show: bool) {
        self.show_faces = show;
    }

    /// Edges are always drawn in 2D views
    pub fn show_edges(&self) -> bool {
        self.render_2d() || self.show_edges
    }

    pub fn set_show_edges(&mut self, show: bool) {
        self.show_edges = show;
    }

    pub fn shade_faces(&self) -> bool {
        self.shade_faces
    }

    pub fn set_shade_faces(&mut self, shade: bool) {
        self.shade_faces = shade;
    }

    pub fn show_point_entities(&self) -> bool {
        self.show_point_entities
    }

    pub fn set_show_point_entities(&mut self, show: bool) {
        self.show_point_entities = show;
    }

    pub fn show_point_entity_models(&self) -> bool {
        self.show_point_entity_models
    }

    pub fn set_show_point_entity_models(&mut self, show: bool) {
        self.show_point_entity_models = show;
    }

    pub fn show_entity_classnames(&self) -> bool {
        self.show_entity_classnames
    }

    pub fn set_show_entity_classnames(&mut self, show: bool) {
        self.show_entity_classnames = show;
    }

    pub fn show_group_bounds(&self) -> bool {
        self.show_group_bounds
    }

    pub fn set_show_group_bounds(&mut self, show: bool) {
        self.show_group_bounds = show;
    }

    pub fn show_brush_entity_bounds(&self) -> bool {
        self.show_brush_entity_bounds
    }

    pub fn set_show_brush_entity_bounds(&mut self, show: bool) {
        self.show_brush_entity_bounds = show;
    }

    pub fn show_point_entity_bounds(&self) -> bool {
        self.show_point_entity_bounds
    }

    pub fn set_show_point_entity_bounds(&mut self, show: bool) {
        self.show_point_entity_bounds = show;
    }

    pub fn show_fog(&self) -> bool {
        self.show_fog
    }

    pub fn set_show_fog(&mut self, show: bool) {
        self.show_fog = show;
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    pub fn set_grid_size(&mut self, size: f32) {
        self.grid_size = size;
    }

    /// Bounds outside of which geometry is tinted, if any
    pub fn soft_map_bounds(&self) -> Option<(Vec3, Vec3)> {
        self.soft_map_bounds
    }

    pub fn set_soft_map_bounds(&mut self, bounds: Option<(Vec3, Vec3)>) {
        self.soft_map_bounds = bounds;
    }

    pub fn hide_selection(&self) -> bool {
        self.hide_selection
    }

    pub fn set_hide_selection(&mut self) {
        self.hide_selection = true;
    }

    pub fn tint_selection(&self) -> bool {
        self.tint_selection
    }

    pub fn set_tint_selection(&mut self, tint: bool) {
        self.tint_selection = tint;
    }

    pub fn selection_guide(&self) -> SelectionGuide {
        self.selection_guide
    }

    pub fn show_selection_guide(&self) -> bool {
        matches!(
            self.selection_guide,
            SelectionGuide::Show | SelectionGuide::ForceShow
        )
    }

    /// Show the guide unless another request already decided otherwise
    pub fn set_show_selection_guide(&mut self) {
        if self.selection_guide == SelectionGuide::Hide {
            self.selection_guide = SelectionGuide::Show;
        }
    }

    pub fn set_hide_selection_guide(&mut self) {
        if self.selection_guide == SelectionGuide::Show {
            self.selection_guide = SelectionGuide::Hide;
        }
    }

    pub fn set_force_show_selection_guide(&mut self) {
        self.selection_guide = SelectionGuide::ForceShow;
    }

    pub fn set_force_hide_selection_guide(&mut self) {
        if self.selection_guide != SelectionGuide::ForceShow {
            self.selection_guide = SelectionGuide::ForceHide;
        }
    }
}
