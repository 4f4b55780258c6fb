//! Shared interaction state
//!
//! [`InteractionContext`] is the single handoff point between the pointer
//! protocol (writer, from input callbacks) and the frame systems (reader).
//! The drag fields are grouped in one [`ActiveDrag`] value so they are set
//! and cleared as a unit: an instance id exists exactly when a drag does.

use std::fmt;

use cagebox_core::InstanceId;
use cagebox_math::{Vec2, Vec3};

/// An in-progress drag
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveDrag {
    pub instance_id: InstanceId,
    /// Latest pointer in normalized device coordinates
    pub current_pointer: Vec2,
    /// Pointer at drag start, in normalized device coordinates
    pub start_pointer: Vec2,
    /// Body position at drag start; recorded by the first drag solve
    pub start_world_position: Option<Vec3>,
}

/// A raycast the frame loop should perform on the protocol's behalf
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingPick {
    /// Gesture that asked for it
    pub gesture: u64,
    /// Pointer in normalized device coordinates
    pub ndc: Vec2,
}

/// Errors from drag bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub enum DragError {
    /// Another instance is already being dragged
    AlreadyDragging(InstanceId),
}

impl fmt::Display for DragError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragError::AlreadyDragging(id) => write!(f, "instance {} is already being dragged", id),
        }
    }
}

impl std::error::Error for DragError {}

/// Drag state plus the press and tap picks awaiting a raycast
#[derive(Clone, Debug, Default)]
pub struct InteractionContext {
    drag: Option<ActiveDrag>,
    pub pending_press: Option<PendingPick>,
    pub pending_tap: Option<PendingPick>,
}

impl InteractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging `instance_id`; fails if a drag is already active
    pub fn begin_drag(&mut self, instance_id: InstanceId, pointer: Vec2) -> Result<(), DragError> {
        if let Some(active) = &self.drag {
            return Err(DragError::AlreadyDragging(active.instance_id.clone()));
        }
        self.drag = Some(ActiveDrag {
            instance_id,
            current_pointer: pointer,
            start_pointer: pointer,
            start_world_position: None,
        });
        Ok(())
    }

    /// Move the drag pointer. Returns false when nothing is being dragged.
    pub fn update_drag_pointer(&mut self, pointer: Vec2) -> bool {
        match self.drag.as_mut() {
            Some(drag) => {
                drag.current_pointer = pointer;
                true
            }
            None => false,
        }
    }

    /// Record where the dragged body was when the drag began
    pub fn record_drag_origin(&mut self, position: Vec3) {
        if let Some(drag) = self.drag.as_mut() {
            drag.start_world_position.get_or_insert(position);
        }
    }

    /// Clear the drag, returning what it was
    pub fn end_drag(&mut self) -> Option<ActiveDrag> {
        self.drag.take()
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag(&self) -> Option<&ActiveDrag> {
        self.drag.as_ref()
    }

    pub fn dragged_instance(&self) -> Option<&InstanceId> {
        self.drag.as_ref().map(|d| &d.instance_id)
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.drag = None;
        self.pending_press = None;
        self.pending_tap = None;
    }
}
