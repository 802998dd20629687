use crate::core::game::TurnEvent;

pub trait EmitterPort: Send + Sync {
    fn emit(&self, event: &TurnEvent);
}
