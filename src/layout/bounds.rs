//! # Bounding Boxes
//!
//! Every drawing call happens inside a box. Boxes nest: each one is placed
//! relative to its parent's top-left corner and carries its own vertical
//! cursor, so the composer can say "move down 10" without knowing where on
//! the page it is. Translation to page space happens in one place,
//! [`BoxStack::to_absolute`].
//!
//! Boxes are either fixed-height or stretchy (`height: None`). A stretchy
//! box is as tall as the furthest point anything was drawn at.

use crate::error::{FolioError, Result};
use crate::render::Point;

/// Tolerance for floating point comparisons against box and page limits.
pub const EPSILON: f64 = 1e-6;

/// Proof of a `push`; only the matching handle can pop the box again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHandle {
    serial: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    /// Top-left corner relative to the parent box (or the page for the root).
    pub origin: Point,
    pub width: f64,
    /// `None` for a stretchy box.
    pub height: Option<f64>,
    cursor: f64,
    extent: f64,
    /// Vertical offset applied when a page break moves the box up.
    shift: f64,
    serial: u64,
}

impl BoundingBox {
    /// Local cursor, 0 at the top edge.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Furthest local y anything has reached inside this box.
    pub fn extent(&self) -> f64 {
        self.extent.max(self.cursor)
    }

    /// Top edge relative to the parent on the current page.
    pub fn top(&self) -> f64 {
        self.origin.y + self.shift
    }

    /// Local y of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.height.unwrap_or_else(|| self.extent())
    }

    fn place_cursor(&mut self, y: f64, strict: bool) -> Result<()> {
        let max = self.height.unwrap_or(f64::INFINITY);
        let clamped = y.clamp(0.0, max.max(0.0));
        if strict && (y - clamped).abs() > EPSILON {
            return Err(FolioError::LayoutInvariant(format!(
                "cursor {:.2} outside box of height {:.2}",
                y, max
            )));
        }
        self.cursor = clamped;
        self.extent = self.extent.max(clamped);
        Ok(())
    }
}

/// The stack of active boxes. The top is where drawing happens.
#[derive(Debug, Default)]
pub struct BoxStack {
    frames: Vec<BoundingBox>,
    next_serial: u64,
}

impl BoxStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, origin: Point, width: f64, height: Option<f64>) -> BoxHandle {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.frames.push(BoundingBox {
            origin,
            width,
            height,
            cursor: 0.0,
            extent: 0.0,
            shift: 0.0,
            serial,
        });
        BoxHandle { serial }
    }

    /// Pop the top box. The parent's cursor moves down to the child's bottom
    /// edge, never up.
    pub fn pop(&mut self, handle: BoxHandle, strict: bool) -> Result<BoundingBox> {
        match self.frames.last() {
            None => {
                return Err(FolioError::LayoutInvariant(
                    "pop on an empty box stack".to_string(),
                ))
            }
            Some(top) if top.serial != handle.serial => {
                return Err(FolioError::LayoutInvariant(format!(
                    "box {} popped while box {} is on top",
                    handle.serial, top.serial
                )))
            }
            Some(_) => {}
        }
        let child = match self.frames.pop() {
            Some(child) => child,
            None => return Err(FolioError::LayoutInvariant("box stack underflow".to_string())),
        };

        if let Some(parent) = self.frames.last_mut() {
            let child_bottom = child.top() + child.bottom();
            if child_bottom > parent.cursor {
                parent.place_cursor(child_bottom, strict)?;
            }
        }
        Ok(child)
    }

    pub fn active(&self) -> Result<&BoundingBox> {
        self.frames
            .last()
            .ok_or_else(|| FolioError::LayoutInvariant("no active bounding box".to_string()))
    }

    fn active_mut(&mut self) -> Result<&mut BoundingBox> {
        self.frames
            .last_mut()
            .ok_or_else(|| FolioError::LayoutInvariant("no active bounding box".to_string()))
    }

    /// Translate a point local to the active box into page coordinates.
    pub fn to_absolute(&self, local: Point) -> Result<Point> {
        self.active()?;
        Ok(self.frames.iter().fold(local, |p, frame| {
            Point::new(p.x + frame.origin.x, p.y + frame.top())
        }))
    }

    /// Page-space y of the active cursor.
    pub fn absolute_cursor(&self) -> Result<f64> {
        let cursor = self.active()?.cursor;
        Ok(self.to_absolute(Point::new(0.0, cursor))?.y)
    }

    pub fn move_down(&mut self, dy: f64, strict: bool) -> Result<()> {
        let frame = self.active_mut()?;
        let target = frame.cursor + dy;
        frame.place_cursor(target, strict)
    }

    pub fn move_cursor_to(&mut self, y: f64, strict: bool) -> Result<()> {
        self.active_mut()?.place_cursor(y, strict)
    }

    /// The tightest page-space bottom edge imposed by any fixed-height box
    /// in the active chain.
    pub fn fixed_bottom(&self) -> Option<f64> {
        let mut top = 0.0;
        let mut limit: Option<f64> = None;
        for frame in &self.frames {
            top += frame.top();
            if let Some(h) = frame.height {
                let bottom = top + h;
                limit = Some(limit.map_or(bottom, |l: f64| l.min(bottom)));
            }
        }
        limit
    }

    /// Reset every cursor for a fresh page so flow resumes at page-space
    /// `continuation_top`. A box whose top edge sits below that line is
    /// moved up to it; its children follow.
    pub fn restart_page(&mut self, continuation_top: f64) {
        let mut parent_top = 0.0;
        for frame in &mut self.frames {
            let top = parent_top + frame.top();
            if top > continuation_top {
                frame.shift -= top - continuation_top;
            }
            let top = parent_top + frame.top();
            parent_top = top;
            let local = (continuation_top - top).max(0.0);
            let local = frame.height.map_or(local, |h| local.min(h));
            frame.cursor = local;
            frame.extent = local;
        }
    }
}
