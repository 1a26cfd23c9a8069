//! Bidirectional page navigation.
//!
//! One state machine owns the current page. User-confirmed navigation
//! updates it optimistically and emits a scroll command; scroll-driven
//! reports update it and ask the input display to refresh. Both directions
//! short-circuit when the value is already current, which is what keeps the
//! two sync paths from feeding each other.

/// Instruction for the virtualization engine: bring this item to the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub item_index: u32,
}

#[derive(Debug)]
pub struct NavigationController {
    /// 1-based. Meaningful only while `ready`.
    current_page: u32,
    page_count: u32,
    ready: bool,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self { current_page: 1, page_count: 0, ready: false }
    }

    /// Document geometry and metadata are in; the input may now display.
    pub fn document_ready(&mut self, page_count: u32) {
        self.page_count = page_count;
        self.current_page = 1;
        self.ready = true;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Committed input text. The shell writes this into the page input after
    /// load, after a confirmed navigation, and after a rejected edit.
    pub fn display_text(&self) -> String {
        if self.ready {
            self.current_page.to_string()
        } else {
            String::new()
        }
    }

    /// User-confirmed navigation target. Out-of-range pages are rejected
    /// (ignored, never clamped); an already-current page is a no-op. On
    /// acceptance the current page updates immediately, without waiting for
    /// the scroll to be observed.
    pub fn request_page(&mut self, page: u32) -> Option<ScrollCommand> {
        if !self.ready || page < 1 || page > self.page_count {
            return None;
        }
        if page == self.current_page {
            return None;
        }

        self.current_page = page;
        Some(ScrollCommand { item_index: page - 1 })
    }

    /// Relative navigation (buttons, PageDown/PageUp) funnels through the
    /// same validation as typed input.
    pub fn request_step(&mut self, delta: i64) -> Option<ScrollCommand> {
        if !self.ready {
            return None;
        }
        let target = self.current_page as i64 + delta;
        if target < 1 || target > self.page_count as i64 {
            return None;
        }
        self.request_page(target as u32)
    }

    /// Scroll-driven report of the top visible item. Returns `true` when the
    /// current page changed and the input display must refresh; an unchanged
    /// page short-circuits so programmatic scrolls do not echo.
    pub fn observe_top_page(&mut self, first_visible_index: u32) -> bool {
        if !self.ready || self.page_count == 0 {
            return false;
        }

        let page = (first_visible_index + 1).min(self.page_count);
        if page == self.current_page {
            return false;
        }

        self.current_page = page;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_controller(page_count: u32) -> NavigationController {
        let mut controller = NavigationController::new();
        controller.document_ready(page_count);
        controller
    }

    #[test]
    fn input_is_blank_until_the_document_is_ready() {
        let controller = NavigationController::new();
        assert_eq!(controller.display_text(), "");

        let ready = ready_controller(10);
        assert_eq!(ready.display_text(), "1");
        assert_eq!(ready.current_page(), 1);
    }

    #[test]
    fn valid_request_updates_immediately_and_commands_a_scroll() {
        let mut controller = ready_controller(10);

        let command = controller.request_page(7).expect("in-range target should navigate");
        assert_eq!(command, ScrollCommand { item_index: 6 });
        assert_eq!(controller.current_page(), 7);
        assert_eq!(controller.display_text(), "7");
    }

    #[test]
    fn out_of_range_request_changes_nothing() {
        let mut controller = ready_controller(3);

        assert_eq!(controller.request_page(0), None);
        assert_eq!(controller.request_page(5), None);
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.display_text(), "1");
    }

    #[test]
    fn requesting_the_current_page_is_a_no_op() {
        let mut controller = ready_controller(3);
        assert_eq!(controller.request_page(1), None);
    }

    #[test]
    fn requests_before_ready_are_ignored() {
        let mut controller = NavigationController::new();
        assert_eq!(controller.request_page(1), None);
        assert_eq!(controller.observe_top_page(0), false);
    }

    #[test]
    fn scroll_reports_update_page_and_refresh_display() {
        let mut controller = ready_controller(10);

        assert!(controller.observe_top_page(4));
        assert_eq!(controller.current_page(), 5);

        // Same top page again: the short-circuit that breaks the feedback
        // loop between programmatic scrolls and scroll reports.
        assert!(!controller.observe_top_page(4));
    }

    #[test]
    fn scroll_report_after_navigation_does_not_echo() {
        let mut controller = ready_controller(10);
        let _ = controller.request_page(7);

        assert!(!controller.observe_top_page(6), "confirming scroll must not re-trigger");
        assert_eq!(controller.current_page(), 7);
    }

    #[test]
    fn steps_clamp_by_rejection_at_the_edges() {
        let mut controller = ready_controller(2);

        assert_eq!(controller.request_step(-1), None);
        assert!(controller.request_step(1).is_some());
        assert_eq!(controller.current_page(), 2);
        assert_eq!(controller.request_step(1), None);
        assert_eq!(controller.current_page(), 2);
    }

    #[test]
    fn empty_document_accepts_no_navigation() {
        let mut controller = ready_controller(0);
        assert_eq!(controller.request_page(1), None);
        assert!(!controller.observe_top_page(0));
    }
}
