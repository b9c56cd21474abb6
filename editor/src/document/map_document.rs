use super::{ChangeFaceAttributesRequest, Face, FaceAttributes, FaceId};
use crate::command::{ChangeFaceAttributes, CommandProcessor, UndoableCommand};
use crate::error::Result;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// The document operations commands are allowed to use
pub trait DocumentCommandFacade {
    fn faces(&self) -> &[Face];
    fn face(&self, id: FaceId) -> Option<&Face>;
    fn selected_faces(&self) -> Vec<FaceId>;

    fn has_selected_faces(&self) -> bool {
        !self.selected_faces().is_empty()
    }

    /// Apply `request` to the selected faces, returning their previous attributes
    fn perform_change_face_attributes(
        &mut self,
        request: &ChangeFaceAttributesRequest,
    ) -> Vec<(FaceId, FaceAttributes)>;

    fn restore_face_attributes(&mut self, snapshot: &[(FaceId, FaceAttributes)]);

    fn modification_count(&self) -> usize;
    fn inc_modification_count(&mut self, delta: usize);
    fn dec_modification_count(&mut self, delta: usize);
}

/// Faces, selection and modification count
#[derive(Debug, Default)]
pub struct DocumentState {
    faces: Vec<Face>,
    selection: BTreeSet<FaceId>,
    modification_count: usize,
}

impl DocumentState {
    pub fn add_face(&mut self, face: Face) -> FaceId {
        self.faces.push(face);
        FaceId(self.faces.len() - 1)
    }

    pub fn select_faces(&mut self, ids: impl IntoIterator<Item = FaceId>) {
        let count = self.faces.len();
        self.selection
            .extend(ids.into_iter().filter(|id| id.0 < count));
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }
}

impl DocumentCommandFacade for DocumentState {
    fn faces(&self) -> &[Face] {
        &self.faces
    }

    fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.0)
    }

    fn selected_faces(&self) -> Vec<FaceId> {
        self.selection.iter().copied().collect()
    }

    fn has_selected_faces(&self) -> bool {
        !self.selection.is_empty()
    }

    fn perform_change_face_attributes(
        &mut self,
        request: &ChangeFaceAttributesRequest,
    ) -> Vec<(FaceId, FaceAttributes)> {
        let mut snapshot = Vec::with_capacity(self.selection.len());
        for id in &self.selection {
            if let Some(face) = self.faces.get_mut(id.0) {
                let previous = face.attributes().clone();
                let mut attributes = previous.clone();
                request.evaluate(&mut attributes);
                face.set_attributes(attributes);
                snapshot.push((*id, previous));
            }
        }
        snapshot
    }

    fn restore_face_attributes(&mut self, snapshot: &[(FaceId, FaceAttributes)]) {
        for (id, attributes) in snapshot {
            if let Some(face) = self.faces.get_mut(id.0) {
                face.set_attributes(attributes.clone());
            }
        }
    }

    fn modification_count(&self) -> usize {
        self.modification_count
    }

    fn inc_modification_count(&mut self, delta: usize) {
        self.modification_count += delta;
    }

    fn dec_modification_count(&mut self, delta: usize) {
        self.modification_count = self.modification_count.saturating_sub(delta);
    }
}

/// A document together with its command history
pub struct MapDocument {
    state: DocumentState,
    processor: CommandProcessor,
}

impl Default for MapDocument {
    fn default() -> Self {
        Self {
            state: DocumentState::default(),
            processor: CommandProcessor::default(),
        }
    }
}

impl MapDocument {
    pub fn new(collation_interval: Duration) -> Self {
        Self {
            state: DocumentState::default(),
            processor: CommandProcessor::new(collation_interval),
        }
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    pub fn add_face(&mut self, face: Face) -> FaceId {
        self.state.add_face(face)
    }

    pub fn select_faces(&mut self, ids: impl IntoIterator<Item = FaceId>) {
        self.state.select_faces(ids);
    }

    pub fn deselect_all(&mut self) {
        self.state.deselect_all();
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.state.face(id)
    }

    pub fn selected_faces(&self) -> Vec<FaceId> {
        self.state.selected_faces()
    }

    pub fn modification_count(&self) -> usize {
        self.state.modification_count()
    }

    pub fn is_modified(&self) -> bool {
        self.state.modification_count() > 0
    }

    pub fn submit(&mut self, command: Box<dyn UndoableCommand>) -> Result<bool> {
        self.processor.submit_and_store(&mut self.state, command)
    }

    /// Change the attributes of every selected face
    pub fn set_face_attributes(&mut self, request: ChangeFaceAttributesRequest) -> Result<bool> {
        if request.is_empty() {
            return Ok(false);
        }
        self.submit(Box::new(ChangeFaceAttributes::command(request)))
    }

    pub fn undo(&mut self) -> Result<bool> {
        self.processor.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.processor.redo(&mut self.state)
    }

    pub fn repeat_last_commands(&mut self) -> Result<bool> {
        self.processor.repeat_last_commands(&mut self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.processor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.processor.can_redo()
    }

    pub fn start_transaction(&mut self, name: impl Into<String>) {
        self.processor.start_transaction(name);
    }

    pub fn commit_transaction(&mut self) -> Result<()> {
        debug!(modifications = self.modification_count(), "Committing document transaction");
        self.processor.commit_transaction()
    }

    pub fn rollback_transaction(&mut self) -> Result<()> {
        self.processor.rollback_transaction(&mut self.state)
    }
}
