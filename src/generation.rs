//! Generation counters that let screens discard responses which arrive after
//! the user has navigated away or a newer load has been issued.

/// Which part of the UI a load feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Profile resolution after a session change.
    Session,
    /// The current full screen (project list, dashboard, board).
    Screen,
    /// A modal over the board (task detail, invite).
    Modal,
}

impl Slot {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            Slot::Session => 0,
            Slot::Screen => 1,
            Slot::Modal => 2,
        }
    }
}

/// Proof that a load was issued at a given generation of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    generation: u64,
}

impl Ticket {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

#[derive(Debug, Default)]
pub struct Generations {
    counters: [u64; Slot::COUNT],
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new load for `slot`, superseding every earlier ticket.
    pub fn issue(&mut self, slot: Slot) -> Ticket {
        let counter = &mut self.counters[slot.index()];
        *counter += 1;
        Ticket {
            slot,
            generation: *counter,
        }
    }

    /// Invalidates outstanding tickets for `slot` without issuing a new one.
    pub fn invalidate(&mut self, slot: Slot) {
        self.counters[slot.index()] += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.counters[ticket.slot.index()] == ticket.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut generations = Generations::new();
        let first = generations.issue(Slot::Screen);
        assert!(generations.is_current(first));

        let second = generations.issue(Slot::Screen);
        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
    }

    #[test]
    fn invalidate_discards_outstanding_tickets() {
        let mut generations = Generations::new();
        let ticket = generations.issue(Slot::Modal);
        generations.invalidate(Slot::Modal);
        assert!(!generations.is_current(ticket));
    }

    #[test]
    fn slots_are_independent() {
        let mut generations = Generations::new();
        let screen = generations.issue(Slot::Screen);
        let modal = generations.issue(Slot::Modal);
        generations.invalidate(Slot::Modal);

        assert!(generations.is_current(screen));
        assert!(!generations.is_current(modal));
        assert_eq!(screen.slot(), Slot::Screen);
    }
}
