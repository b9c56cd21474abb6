//! Projection / view / model matrix stacks
//!
//! Mirrors the fixed-function matrix stack convention: three parallel
//! stacks whose tops describe the current transformation. The stacks are
//! created with a base entry which is never popped, so the getters always
//! have a value to return.

use glam::Mat4;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Transformation {
    projection_stack: Vec<Mat4>,
    view_stack: Vec<Mat4>,
    model_stack: Vec<Mat4>,
}

impl Transformation {
    /// Create stacks with the given projection and view and an identity model
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self::with_model(projection, view, Mat4::IDENTITY)
    }

    pub fn with_model(projection: Mat4, view: Mat4, model: Mat4) -> Self {
        Self {
            projection_stack: vec![projection],
            view_stack: vec![view],
            model_stack: vec![model],
        }
    }

    /// New stacks holding only the current top entries
    pub fn slice(&self) -> Self {
        Self::with_model(*self.projection(), *self.view(), *self.model())
    }

    pub fn projection(&self) -> &Mat4 {
        self.projection_stack.last().unwrap_or(&Mat4::IDENTITY)
    }

    pub fn view(&self) -> &Mat4 {
        self.view_stack.last().unwrap_or(&Mat4::IDENTITY)
    }

    pub fn model(&self) -> &Mat4 {
        self.model_stack.last().unwrap_or(&Mat4::IDENTITY)
    }

    /// Number of entries on the projection/view stacks
    pub fn depth(&self) -> usize {
        self.projection_stack.len()
    }

    /// Number of entries on the model stack
    pub fn model_depth(&self) -> usize {
        self.model_stack.len()
    }

    pub fn push_transformation(&mut self, projection: Mat4, view: Mat4, model: Mat4) {
        self.projection_stack.push(projection);
        self.view_stack.push(view);
        self.model_stack.push(model);
    }

    pub fn pop_transformation(&mut self) {
        if self.projection_stack.len() <= 1
            || self.view_stack.len() <= 1
            || self.model_stack.len() <= 1
        {
            warn!("Attempted to pop the base transformation");
            return;
        }
        self.projection_stack.pop();
        self.view_stack.pop();
        self.model_stack.pop();
    }

    /// Push the product of the current model matrix and `matrix`
    pub fn push_model_matrix(&mut self, matrix: Mat4) {
        let top = *self.model() * matrix;
        self.model_stack.push(top);
    }

    /// Push `matrix` as the new model matrix, ignoring the current one
    pub fn replace_and_push_model_matrix(&mut self, matrix: Mat4) {
        self.model_stack.push(matrix);
    }

    pub fn pop_model_matrix(&mut self) {
        if self.model_stack.len() <= 1 {
            warn!("Attempted to pop the base model matrix");
            return;
        }
        self.model_stack.pop();
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}
