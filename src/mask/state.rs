#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeState {
    /// Masking tool not active; no paint surface exists.
    #[default]
    Inactive,
    Idle,
    Stroking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeEvent {
    Enter,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Clear,
    Exit,
}

/// Transition table for one masking session.
///
/// Events that have no transition from the current state are ignored by the
/// caller rather than reported, since they come from pointer timing races.
#[derive(Debug, Default)]
pub struct StrokeMachine {
    state: StrokeState,
}

impl StrokeMachine {
    pub const fn new() -> Self {
        Self {
            state: StrokeState::Inactive,
        }
    }

    pub const fn state(&self) -> StrokeState {
        self.state
    }

    pub fn can_transition(&self, event: StrokeEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: StrokeEvent) -> Option<StrokeState> {
        use StrokeEvent::*;
        match (self.state, event) {
            (_, Enter) => Some(StrokeState::Idle),
            (StrokeState::Idle, PointerDown) => Some(StrokeState::Stroking),
            (StrokeState::Stroking, PointerMove) => Some(StrokeState::Stroking),
            (StrokeState::Stroking, PointerUp | PointerLeave) => Some(StrokeState::Idle),
            (StrokeState::Idle | StrokeState::Stroking, Clear) => Some(StrokeState::Idle),
            (_, Exit) => Some(StrokeState::Inactive),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: StrokeEvent) -> Option<StrokeState> {
        let next = self.next_state(event);
        match next {
            Some(next) => {
                if next != self.state {
                    tracing::debug!(
                        from = ?self.state,
                        event = ?event,
                        to = ?next,
                        "mask stroke transition"
                    );
                }
                self.state = next;
            }
            None => {
                tracing::trace!(from = ?self.state, event = ?event, "mask event ignored");
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_cycle_follows_down_move_up() {
        let mut machine = StrokeMachine::new();
        assert_eq!(machine.transition(StrokeEvent::Enter), Some(StrokeState::Idle));
        assert_eq!(
            machine.transition(StrokeEvent::PointerDown),
            Some(StrokeState::Stroking)
        );
        assert_eq!(
            machine.transition(StrokeEvent::PointerMove),
            Some(StrokeState::Stroking)
        );
        assert_eq!(machine.transition(StrokeEvent::PointerUp), Some(StrokeState::Idle));
    }

    #[test]
    fn pointer_events_while_idle_or_inactive_are_ignored() {
        let mut machine = StrokeMachine::new();
        assert!(!machine.can_transition(StrokeEvent::PointerDown));
        assert_eq!(machine.transition(StrokeEvent::PointerMove), None);
        assert_eq!(machine.state(), StrokeState::Inactive);

        machine.transition(StrokeEvent::Enter);
        assert_eq!(machine.transition(StrokeEvent::PointerMove), None);
        assert_eq!(machine.transition(StrokeEvent::PointerUp), None);
        assert_eq!(machine.state(), StrokeState::Idle);
    }

    #[test]
    fn pointer_down_does_not_reenter_an_active_stroke() {
        let mut machine = StrokeMachine::new();
        machine.transition(StrokeEvent::Enter);
        machine.transition(StrokeEvent::PointerDown);
        assert_eq!(machine.transition(StrokeEvent::PointerDown), None);
        assert_eq!(machine.state(), StrokeState::Stroking);
    }

    #[test]
    fn clear_and_exit_interrupt_a_stroke() {
        let mut machine = StrokeMachine::new();
        machine.transition(StrokeEvent::Enter);
        machine.transition(StrokeEvent::PointerDown);
        assert_eq!(machine.transition(StrokeEvent::Clear), Some(StrokeState::Idle));

        machine.transition(StrokeEvent::PointerDown);
        assert_eq!(
            machine.transition(StrokeEvent::Exit),
            Some(StrokeState::Inactive)
        );
        assert!(!machine.can_transition(StrokeEvent::Clear));
    }
}
