use std::{
    cell::{Cell, RefCell},
    ops::Deref,
    rc::Rc,
};

use log::warn;

use crate::serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use super::property_mutate::PropertyMutator;

/// A client-visible callback observing a replicated field change.
///
/// Invoked with `(old, new)` after the new value has already been stored, so
/// a hook reading current state through other paths sees the new value. A
/// re-entrancy flag keeps a hook that itself triggers replication from
/// recursing into itself; re-entrant invocations are skipped with a warning.
pub struct ChangeHook<T> {
    func: Rc<RefCell<dyn FnMut(&T, &T)>>,
    entered: Rc<Cell<bool>>,
}

impl<T> ChangeHook<T> {
    pub fn new<F: FnMut(&T, &T) + 'static>(func: F) -> Self {
        Self {
            func: Rc::new(RefCell::new(func)),
            entered: Rc::new(Cell::new(false)),
        }
    }

    fn invoke(&self, old: &T, new: &T) {
        if self.entered.get() {
            warn!("change hook invoked re-entrantly, skipping");
            return;
        }
        self.entered.set(true);
        (self.func.borrow_mut())(old, new);
        self.entered.set(false);
    }
}

impl<T> Clone for ChangeHook<T> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            entered: self.entered.clone(),
        }
    }
}

/// A replicated field of a component.
///
/// All access goes through the generated accessor pair: reads deref into the
/// contained value, writes go through [`Property::set`], which compares by
/// value equality before marking the field's dirty bit. `index` is the
/// field's position in the component's flattened declaration order (base
/// segments first) and doubles as its bit in the dirty mask.
pub struct Property<T: Serde> {
    inner: T,
    index: u8,
    mutator: Option<PropertyMutator>,
    hook: Option<ChangeHook<T>>,
}

impl<T: Serde> Property<T> {
    pub fn new(value: T, index: u8) -> Self {
        Self {
            inner: value,
            index,
            mutator: None,
            hook: None,
        }
    }

    /// Set a PropertyMutator to track changes to the Property
    pub fn set_mutator(&mut self, mutator: &PropertyMutator) {
        self.mutator = Some(mutator.clone_new());
    }

    /// Register a client-visible change hook
    pub fn on_change(&mut self, hook: ChangeHook<T>) {
        self.hook = Some(hook);
    }

    /// Writes the new value if it differs from the current one by value
    /// equality. Unchanged values are a no-op: no dirty bit, no hook.
    pub fn set(&mut self, value: T) {
        if self.inner == value {
            return;
        }
        let old = std::mem::replace(&mut self.inner, value);
        self.mutate();
        if let Some(hook) = &self.hook {
            hook.invoke(&old, &self.inner);
        }
    }

    /// Set value to the value of another Property, queueing an update if it
    /// differs
    pub fn mirror(&mut self, other: &Self) {
        self.set(other.inner.clone());
    }

    /// Writes contained value into outgoing payload bytes
    pub fn write(&self, writer: &mut ByteWriter) {
        self.inner.ser(writer);
    }

    /// Given a cursor into incoming payload bytes, updates the Property with
    /// the synced value. The value is assigned before the hook runs.
    pub fn read(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        let value = T::de(reader)?;
        if self.inner == value {
            return Ok(());
        }
        let old = std::mem::replace(&mut self.inner, value);
        if let Some(hook) = &self.hook {
            hook.invoke(&old, &self.inner);
        }
        Ok(())
    }

    fn mutate(&mut self) {
        let Some(mutator) = &mut self.mutator else {
            warn!("Property should have a mutator immediately after registration");
            return;
        };
        let _success = mutator.mutate(self.index);
    }
}

impl<T: Serde> Deref for Property<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
