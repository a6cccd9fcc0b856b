use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_timer::Delay;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NoticeTicket(pub u64);

/// Tracks which notice is currently on screen. Only the latest ticket may hide it.
#[derive(Clone, Debug, Default)]
pub struct NoticeBoard {
    latest: Arc<AtomicU64>,
}

impl NoticeBoard {
    pub fn issue(&self) -> NoticeTicket {
        NoticeTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: NoticeTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Pending auto-hide of a transient notice.
///
/// The host runs [`NoticeDismissal::expire`] on its executor. If another notice
/// was shown in the meantime the older dismissal leaves it alone.
pub struct NoticeDismissal {
    after: Duration,
    ticket: NoticeTicket,
    board: NoticeBoard,
    hide: Box<dyn FnOnce()>,
}

impl NoticeDismissal {
    pub(crate) fn new(
        after: Duration,
        ticket: NoticeTicket,
        board: NoticeBoard,
        hide: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            after,
            ticket,
            board,
            hide: Box::new(hide),
        }
    }

    pub fn after(&self) -> Duration {
        self.after
    }

    pub fn ticket(&self) -> NoticeTicket {
        self.ticket
    }

    /// Waits out the delay and hides the notice. Returns whether it was hidden.
    pub async fn expire(self) -> bool {
        Delay::new(self.after).await;
        self.hide_now()
    }

    /// Hides the notice immediately, skipping the delay.
    pub fn hide_now(self) -> bool {
        if !self.board.is_latest(self.ticket) {
            return false;
        }
        (self.hide)();
        true
    }
}

impl Debug for NoticeDismissal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeDismissal")
            .field("after", &self.after)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    fn dismissal(board: &NoticeBoard, hidden: &Rc<Cell<u32>>) -> NoticeDismissal {
        let hidden = hidden.clone();
        NoticeDismissal::new(
            Duration::from_millis(5),
            board.issue(),
            board.clone(),
            move || hidden.set(hidden.get() + 1),
        )
    }

    #[test]
    fn expire_hides_after_delay() {
        let board = NoticeBoard::default();
        let hidden = Rc::new(Cell::new(0));
        let pending = dismissal(&board, &hidden);
        assert_eq!(hidden.get(), 0);
        assert!(block_on(pending.expire()));
        assert_eq!(hidden.get(), 1);
    }

    #[test]
    fn stale_dismissal_keeps_newer_notice() {
        let board = NoticeBoard::default();
        let hidden = Rc::new(Cell::new(0));
        let first = dismissal(&board, &hidden);
        let second = dismissal(&board, &hidden);
        assert!(!block_on(first.expire()));
        assert_eq!(hidden.get(), 0);
        assert!(second.hide_now());
        assert_eq!(hidden.get(), 1);
    }
}
