/// Behavior of a stage or normalization layer during a forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Batch statistics are used and running statistics are updated.
    Train,
    /// Running statistics are used and never updated.
    #[default]
    Eval,
}

impl Mode {
    pub fn from_training(training: bool) -> Self {
        if training {
            Mode::Train
        } else {
            Mode::Eval
        }
    }

    pub fn is_train(self) -> bool {
        self == Mode::Train
    }

    /// Training behavior only if both sides allow it.
    pub fn and(self, other: Mode) -> Mode {
        if self.is_train() && other.is_train() {
            Mode::Train
        } else {
            Mode::Eval
        }
    }
}
