//! # Page Break Decisions
//!
//! Flowing content (lines of text, images, table rows) is placed one
//! unbreakable unit at a time. Before each unit the layout asks this module
//! whether it stays on the current page.

/// What to do with the next unit of flowing content.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// It fits; place it here.
    Place,
    /// Start a new page and place it there.
    MoveToNextPage,
    /// Taller than a whole fresh page. Placed anyway; it will be clipped.
    Oversized,
}

/// Decide whether a unit of `height` fits in `remaining` space.
///
/// `keep_with_next` is the height of a unit that must land on the same page
/// (a table header and the first body row). `at_page_top` is true when
/// nothing has been drawn on the current page yet, in which case moving on
/// would not gain anything.
pub fn decide_break(
    remaining: f64,
    fresh_page_height: f64,
    height: f64,
    keep_with_next: Option<f64>,
    at_page_top: bool,
) -> BreakDecision {
    let needed = height + keep_with_next.unwrap_or(0.0);
    if needed <= remaining + super::bounds::EPSILON {
        return BreakDecision::Place;
    }

    if !at_page_top {
        return BreakDecision::MoveToNextPage;
    }

    if height > fresh_page_height + super::bounds::EPSILON {
        BreakDecision::Oversized
    } else {
        // Nothing gained by moving: the pair can't share any page.
        BreakDecision::Place
    }
}
