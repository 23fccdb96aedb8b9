//! Edge-triggered stepping control.
//!
//! Drives a paused/running simulation from per-frame key state. All edge
//! detection is against explicit previous-frame input; holding a key down
//! never repeats an action.

/// Key state sampled once per frame by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInput {
    /// Single-step key is currently down.
    pub step_pressed: bool,
    /// Run/pause toggle key is currently down.
    pub run_toggle_pressed: bool,
}

/// Paused/running state plus the previous frame's input.
#[derive(Debug, Default)]
pub struct StepController {
    running: bool,
    previous: StepInput,
}

impl StepController {
    /// Starts paused.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feed one frame of input; returns whether the simulation should
    /// advance one step this frame. The run toggle flips on its rising
    /// edge; while paused, the step key's rising edge advances exactly
    /// once.
    pub fn advance(&mut self, input: StepInput) -> bool {
        let step_edge = input.step_pressed && !self.previous.step_pressed;
        let toggle_edge = input.run_toggle_pressed && !self.previous.run_toggle_pressed;
        self.previous = input;

        if toggle_edge {
            self.running = !self.running;
        }
        self.running || step_edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: StepInput = StepInput {
        step_pressed: true,
        run_toggle_pressed: false,
    };
    const TOGGLE: StepInput = StepInput {
        step_pressed: false,
        run_toggle_pressed: true,
    };
    const IDLE: StepInput = StepInput {
        step_pressed: false,
        run_toggle_pressed: false,
    };

    #[test]
    fn test_held_step_key_advances_once() {
        let mut control = StepController::new();
        assert!(control.advance(STEP));
        assert!(!control.advance(STEP));
        assert!(!control.advance(STEP));
        // release and press again for another step
        assert!(!control.advance(IDLE));
        assert!(control.advance(STEP));
    }

    #[test]
    fn test_run_toggle_flips_on_rising_edge() {
        let mut control = StepController::new();
        assert!(!control.is_running());
        assert!(control.advance(TOGGLE));
        assert!(control.is_running());
        // held toggle does not flip back
        assert!(control.advance(TOGGLE));
        assert!(control.is_running());
        // while running, every frame advances
        assert!(control.advance(IDLE));
        assert!(control.advance(IDLE));
        // release then toggle again to pause
        assert!(!control.advance(TOGGLE));
        assert!(!control.is_running());
        assert!(!control.advance(IDLE));
    }

    #[test]
    fn test_step_key_is_ignored_while_running() {
        let mut control = StepController::new();
        control.advance(TOGGLE);
        assert!(control.is_running());
        assert!(control.advance(STEP));
        assert!(control.advance(STEP));
        assert!(control.is_running());
    }
}
