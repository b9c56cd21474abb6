//! Document editing through the command processor

use editor::command::{ChangeFaceAttributes, CommandGroup, UndoableCommand};
use editor::document::{ChangeFaceAttributesRequest, Face, FaceAttributes, FaceId, MapDocument};
use editor::EditorError;
use glam::{Vec2, Vec3};
use std::time::Duration;

fn wall(x: f32) -> Face {
    Face::new(
        vec![
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x, 64.0, 0.0),
            Vec3::new(x, 64.0, 64.0),
            Vec3::new(x, 0.0, 64.0),
        ],
        FaceAttributes::new("base/wall"),
    )
}

fn document(interval: Duration) -> (MapDocument, FaceId, FaceId) {
    let mut document = MapDocument::new(interval);
    let a = document.add_face(wall(0.0));
    let b = document.add_face(wall(128.0));
    (document, a, b)
}

fn texture(document: &MapDocument, id: FaceId) -> String {
    document
        .face(id)
        .map(|f| f.attributes().texture_name.clone())
        .unwrap_or_default()
}

#[test]
fn test_modification_count_follows_undo_and_redo() {
    let (mut document, a, _) = document(Duration::ZERO);
    document.select_faces([a]);
    assert!(!document.is_modified());

    let mut request = ChangeFaceAttributesRequest::new();
    request.set_texture("base/metal");
    assert!(document.set_face_attributes(request).unwrap());
    assert_eq!(texture(&document, a), "base/metal");
    assert!(document.is_modified());

    document.undo().unwrap();
    assert_eq!(texture(&document, a), "base/wall");
    assert!(!document.is_modified());

    document.redo().unwrap();
    assert_eq!(texture(&document, a), "base/metal");
    assert_eq!(document.modification_count(), 1);
}

#[test]
fn test_empty_request_is_ignored() {
    let (mut document, a, _) = document(Duration::ZERO);
    document.select_faces([a]);
    assert!(!document.set_face_attributes(ChangeFaceAttributesRequest::new()).unwrap());
    assert!(!document.can_undo());
}

#[test]
fn test_quick_edits_collate_into_one_step() {
    let (mut document, a, _) = document(Duration::from_secs(60));
    document.select_faces([a]);
    for _ in 0..3 {
        let mut request = ChangeFaceAttributesRequest::new();
        request.add_offset(Vec2::new(1.0, 0.0));
        document.set_face_attributes(request).unwrap();
    }
    assert_eq!(document.modification_count(), 3);

    document.undo().unwrap();
    assert!(!document.can_undo());
    assert_eq!(document.modification_count(), 0);
    assert_eq!(document.face(a).map(|f| f.attributes().offset), Some(Vec2::ZERO));
}

#[test]
fn test_repeat_on_new_selection() {
    let (mut document, a, b) = document(Duration::ZERO);
    document.select_faces([a]);
    let mut request = ChangeFaceAttributesRequest::new();
    request.set_texture("base/metal");
    document.set_face_attributes(request).unwrap();

    document.deselect_all();
    document.select_faces([b]);
    assert!(document.repeat_last_commands().unwrap());
    assert_eq!(texture(&document, b), "base/metal");

    document.undo().unwrap();
    assert_eq!(texture(&document, b), "base/wall");
    assert_eq!(texture(&document, a), "base/metal");
}

#[test]
fn test_transaction_blocks_undo_until_committed() {
    let (mut document, a, _) = document(Duration::ZERO);
    document.select_faces([a]);
    document.start_transaction("Align");
    let mut request = ChangeFaceAttributesRequest::new();
    request.set_rotation(45.0);
    document.set_face_attributes(request).unwrap();

    assert!(!document.can_undo());
    assert!(matches!(document.undo(), Err(EditorError::Transaction(_))));
    document.commit_transaction().unwrap();
    assert!(document.can_undo());
    assert_eq!(document.processor().undo_name(), Some("Align"));
}

#[test]
fn test_submitted_group_undoes_all_members() {
    let (mut document, a, b) = document(Duration::ZERO);
    document.select_faces([a, b]);

    let mut first = ChangeFaceAttributesRequest::new();
    first.set_scale(Vec2::splat(0.5));
    let mut second = ChangeFaceAttributesRequest::new();
    second.add_rotation(30.0);
    let commands: Vec<Box<dyn UndoableCommand>> = vec![
        Box::new(ChangeFaceAttributes::command(first)),
        Box::new(ChangeFaceAttributes::command(second)),
    ];
    let group = CommandGroup::new("Scale and Rotate", commands);
    assert!(document.submit(Box::new(group)).unwrap());

    for id in [a, b] {
        let attributes = document.face(id).map(|f| f.attributes().clone()).unwrap_or_default();
        assert_eq!(attributes.scale, Vec2::splat(0.5));
        assert_eq!(attributes.rotation, 30.0);
    }
    assert_eq!(document.modification_count(), 2);

    document.undo().unwrap();
    for id in [a, b] {
        assert_eq!(document.face(id).map(|f| f.attributes().rotation), Some(0.0));
    }
    assert_eq!(document.modification_count(), 0);
}
