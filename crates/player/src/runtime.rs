use crate::PlayerEvent;

pub trait PlayerRuntime: Send + Sync + 'static {
    fn emit(&self, event: PlayerEvent);
}
