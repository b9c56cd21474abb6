use super::{CommandType, DocumentCommand, DocumentOperation};
use crate::document::{ChangeFaceAttributesRequest, DocumentCommandFacade, FaceAttributes, FaceId};
use crate::error::Result;
use once_cell::sync::Lazy;

pub static CHANGE_FACE_ATTRIBUTES: Lazy<CommandType> = Lazy::new(CommandType::free_type);

pub type ChangeFaceAttributesCommand = DocumentCommand<ChangeFaceAttributes>;

/// Applies a [`ChangeFaceAttributesRequest`] to the selected faces
#[derive(Debug, Clone)]
pub struct ChangeFaceAttributes {
    request: ChangeFaceAttributesRequest,
    /// Attributes of every face before the first application
    snapshot: Vec<(FaceId, FaceAttributes)>,
}

impl ChangeFaceAttributes {
    pub fn new(request: ChangeFaceAttributesRequest) -> Self {
        Self {
            request,
            snapshot: Vec::new(),
        }
    }

    pub fn command(request: ChangeFaceAttributesRequest) -> ChangeFaceAttributesCommand {
        DocumentCommand::new(Self::new(request))
    }

    pub fn request(&self) -> &ChangeFaceAttributesRequest {
        &self.request
    }
}

impl DocumentOperation for ChangeFaceAttributes {
    fn command_type(&self) -> CommandType {
        *CHANGE_FACE_ATTRIBUTES
    }

    fn name(&self) -> &str {
        "Change Face Attributes"
    }

    fn perform_do(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        if !document.has_selected_faces() {
            return Ok(false);
        }
        self.snapshot = document.perform_change_face_attributes(&self.request);
        Ok(true)
    }

    fn perform_undo(&mut self, document: &mut dyn DocumentCommandFacade) -> Result<bool> {
        document.restore_face_attributes(&self.snapshot);
        Ok(true)
    }

    fn is_repeatable(&self, document: &dyn DocumentCommandFacade) -> bool {
        document.has_selected_faces()
    }

    fn repeat(&self, _document: &dyn DocumentCommandFacade) -> Option<Self> {
        Some(Self::new(self.request.clone()))
    }

    fn collate_with(&mut self, other: &Self) -> bool {
        if !self.request.collate_with(&other.request) {
            return false;
        }
        // Keep the oldest attributes of every face either command touched
        for (id, attributes) in &other.snapshot {
            if !self.snapshot.iter().any(|(known, _)| known == id) {
                self.snapshot.push((*id, attributes.clone()));
            }
        }
        true
    }
}
