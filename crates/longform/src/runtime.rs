use crate::LongFormEvent;

pub trait LongFormRuntime: lumen_storage::StorageRuntime {
    fn emit(&self, event: LongFormEvent);
}
