//! Dial DragDrop Utilities
//!
//! Framework-free drag-and-drop gesture tracking driven by pointer events.
//! Uses a movement threshold to distinguish click from drag.
//!
//! The gesture is generic over the dragged payload `S` (captured once on
//! press and never changed for the gesture's lifetime) and the drop target
//! type `T` supplied by whoever hit-tests the pointer.

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// Gesture phase
#[derive(Clone, Debug, PartialEq)]
pub enum DragPhase<S, T> {
    /// No pointer interaction
    Idle,
    /// Pointer is down on a draggable but has not moved past the threshold
    Pending { source: S, start_x: i32, start_y: i32 },
    /// Dragging; `hover` is the drop target currently under the pointer
    Dragging { source: S, hover: Option<T> },
}

/// Result of releasing the pointer
#[derive(Clone, Debug, PartialEq)]
pub enum Release<S, T> {
    /// Released over a valid target while dragging
    Dropped { source: S, target: T },
    /// Pointer went up before the threshold was crossed
    Click(S),
    /// Dragging ended outside any target
    Cancelled(S),
    /// Nothing was pressed
    Ignored,
}

/// DnD gesture state
#[derive(Clone, Debug)]
pub struct DragGesture<S, T> {
    phase: DragPhase<S, T>,
    threshold_px: i32,
    /// Set when a drag ends so the trailing click can be swallowed
    drag_just_ended: bool,
}

impl<S, T> Default for DragGesture<S, T> {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD_PX)
    }
}

impl<S, T> DragGesture<S, T> {
    pub fn new(threshold_px: i32) -> Self {
        Self {
            phase: DragPhase::Idle,
            threshold_px,
            drag_just_ended: false,
        }
    }

    pub fn phase(&self) -> &DragPhase<S, T> {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }

    /// Payload of the pending or active gesture
    pub fn source(&self) -> Option<&S> {
        match &self.phase {
            DragPhase::Idle => None,
            DragPhase::Pending { source, .. } | DragPhase::Dragging { source, .. } => Some(source),
        }
    }

    /// Target currently highlighted, if any
    pub fn hover(&self) -> Option<&T> {
        match &self.phase {
            DragPhase::Dragging { hover, .. } => hover.as_ref(),
            _ => None,
        }
    }

    pub fn drag_just_ended(&self) -> bool {
        self.drag_just_ended
    }

    /// Acknowledge the end-of-drag marker (the trailing click was consumed)
    pub fn clear_drag_just_ended(&mut self) {
        self.drag_just_ended = false;
    }

    /// Primary-button press on a draggable; records a pending drag with position.
    /// Presses while a gesture is already in progress are ignored.
    pub fn press(&mut self, source: S, x: i32, y: i32) {
        if self.is_idle() {
            self.drag_just_ended = false;
            self.phase = DragPhase::Pending { source, start_x: x, start_y: y };
        }
    }

    /// Start a drag immediately, bypassing the threshold (native drag-start events)
    pub fn start(&mut self, source: S) {
        self.drag_just_ended = false;
        self.phase = DragPhase::Dragging { source, hover: None };
    }

    /// Pointer moved; starts dragging once it moved far enough.
    /// Returns true when this motion started the drag.
    pub fn motion(&mut self, x: i32, y: i32) -> bool {
        let crossed = match &self.phase {
            DragPhase::Pending { start_x, start_y, .. } => {
                (x - start_x).abs() > self.threshold_px || (y - start_y).abs() > self.threshold_px
            }
            _ => false,
        };
        if crossed {
            let phase = std::mem::replace(&mut self.phase, DragPhase::Idle);
            if let DragPhase::Pending { source, .. } = phase {
                self.phase = DragPhase::Dragging { source, hover: None };
            }
        }
        crossed
    }

    /// Pointer entered a drop target. `accepts` rejects targets such as the
    /// dragged item itself.
    pub fn enter<F>(&mut self, target: T, accepts: F)
    where
        F: FnOnce(&S, &T) -> bool,
    {
        if let DragPhase::Dragging { source, hover } = &mut self.phase {
            if accepts(source, &target) {
                *hover = Some(target);
            }
        }
    }

    /// Pointer left the current target
    pub fn leave(&mut self) {
        if let DragPhase::Dragging { hover, .. } = &mut self.phase {
            *hover = None;
        }
    }

    /// Pointer released. Hover state is always cleared.
    pub fn release(&mut self) -> Release<S, T> {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => Release::Ignored,
            DragPhase::Pending { source, .. } => Release::Click(source),
            DragPhase::Dragging { source, hover } => {
                self.drag_just_ended = true;
                match hover {
                    Some(target) => Release::Dropped { source, target },
                    None => Release::Cancelled(source),
                }
            }
        }
    }

    /// Abort the gesture without a drop (escape key, window blur)
    pub fn cancel(&mut self) -> Option<S> {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => None,
            DragPhase::Pending { source, .. } => Some(source),
            DragPhase::Dragging { source, .. } => {
                self.drag_just_ended = true;
                Some(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_below_threshold() {
        let mut g: DragGesture<u32, u32> = DragGesture::default();
        g.press(7, 100, 100);
        assert!(!g.motion(103, 104));
        assert!(!g.is_dragging());
        assert_eq!(g.release(), Release::Click(7));
        assert!(!g.drag_just_ended());
    }

    #[test]
    fn test_drag_and_drop_on_target() {
        let mut g: DragGesture<u32, u32> = DragGesture::default();
        g.press(1, 0, 0);
        assert!(g.motion(10, 0));
        g.enter(2, |s, t| s != t);
        assert_eq!(g.hover(), Some(&2));
        assert_eq!(g.release(), Release::Dropped { source: 1, target: 2 });
        assert!(g.is_idle());
        assert!(g.drag_just_ended());
    }

    #[test]
    fn test_enter_rejects_self() {
        let mut g: DragGesture<u32, u32> = DragGesture::default();
        g.start(3);
        g.enter(3, |s, t| s != t);
        assert_eq!(g.hover(), None);
        assert_eq!(g.release(), Release::Cancelled(3));
    }

    #[test]
    fn test_leave_clears_hover() {
        let mut g: DragGesture<u32, u32> = DragGesture::default();
        g.start(1);
        g.enter(5, |_, _| true);
        g.leave();
        assert_eq!(g.release(), Release::Cancelled(1));
    }

    #[test]
    fn test_press_ignored_mid_gesture() {
        let mut g: DragGesture<u32, u32> = DragGesture::default();
        g.start(1);
        g.press(9, 0, 0);
        assert_eq!(g.source(), Some(&1));
        assert_eq!(g.cancel(), Some(1));
        assert!(g.is_idle());
    }
}
