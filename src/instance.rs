//! Instances and the receiver handed to their callables.
//!
//! An [`Instance`] is the public surface of one constructed object. It owns a
//! private state container holding every member value (public data included)
//! and a shared layout listing the public names. Only names in the layout can
//! be reached from outside; everything else in the container is visible to
//! callables alone, through the [`Receiver`] they are invoked with.

use core::hash::BuildHasherDefault;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use seahash::SeaHasher;
use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

use crate::construct::{Factory, FactoryId};
use crate::error::{BuilderError, Result};
use crate::value::{Callable, Value};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Layout -------------
/// How a public name was declared. Decided once per build from the kind of
/// the public table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Accessor {
    Field,
    Method,
}

pub(crate) type Layout = IndexMap<String, Accessor>;

// ------------- State -------------
/// The private state container of a single instance.
#[derive(Debug, Default)]
pub(crate) struct State {
    slots: HashMap<String, Value, OtherHasher>,
}
impl State {
    pub(crate) fn seed<'a, I>(&mut self, members: I)
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        for (name, value) in members {
            // clone copies data values, so every instance starts from its own storage
            self.slots.insert(name.to_owned(), value.clone());
        }
    }
}

struct Surface {
    factory: FactoryId,
    layout: Arc<Layout>,
    state: Mutex<State>,
}
impl Surface {
    // The lock is only held for one slot access and never while a callable
    // runs. A poisoned lock still guards a consistent map.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
    fn read(&self, name: &str) -> Option<Value> {
        self.state().slots.get(name).cloned()
    }
    fn write(&self, name: &str, value: Value) {
        self.state().slots.insert(name.to_owned(), value);
    }
    fn callable(&self, name: &str) -> Result<Callable> {
        match self.state().slots.get(name) {
            Some(Value::Function(f)) => Ok(f.clone()),
            Some(_) => Err(BuilderError::NotCallable { name: name.to_owned() }),
            None => Err(BuilderError::MemberNotFound { name: name.to_owned() }),
        }
    }
}

// ------------- Instance -------------
/// One constructed object. Clones are handles to the same object.
#[derive(Clone)]
pub struct Instance(Arc<Surface>);

impl Instance {
    pub(crate) fn new(factory: FactoryId, layout: Arc<Layout>, state: State) -> Self {
        Self(Arc::new(Surface {
            factory,
            layout,
            state: Mutex::new(state),
        }))
    }
    pub(crate) fn receiver(&self) -> Receiver {
        Receiver {
            instance: self.clone(),
        }
    }
    pub fn factory_id(&self) -> FactoryId {
        self.0.factory
    }
    pub fn is_instance_of(&self, factory: &Factory) -> bool {
        factory.is_instance(self)
    }
    /// Reads a public member. Public methods read as their current callable,
    /// any other name is absent.
    pub fn get(&self, name: &str) -> Option<Value> {
        if !self.0.layout.contains_key(name) {
            return None;
        }
        Some(self.0.read(name).unwrap_or_default())
    }
    /// Writes a public data member. The surface is sealed, so names that are
    /// not public cannot be added from outside.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.0.layout.get(name) {
            Some(Accessor::Field) => {
                self.0.write(name, value.into());
                Ok(())
            }
            Some(Accessor::Method) => Err(BuilderError::ReadOnly { name: name.to_owned() }),
            None => Err(BuilderError::MemberNotFound { name: name.to_owned() }),
        }
    }
    /// Calls a public member with this instance as receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        if !self.0.layout.contains_key(name) {
            return Err(BuilderError::MemberNotFound { name: name.to_owned() });
        }
        self.receiver().call(name, args)
    }
    pub fn has(&self, name: &str) -> bool {
        self.0.layout.contains_key(name)
    }
    /// The public names, in the order they were declared.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.layout.keys().map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.0.layout.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.layout.is_empty()
    }
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
    /// The public data members as a JSON object. Methods and members holding
    /// `Undefined` or a callable are left out.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| BuilderError::Execution(e.to_string()))
    }
    fn public_data(&self) -> Vec<(&str, Value)> {
        let state = self.0.state();
        self.0
            .layout
            .iter()
            .filter(|(_, accessor)| **accessor == Accessor::Field)
            .filter_map(|(name, _)| {
                state
                    .slots
                    .get(name)
                    .filter(|v| !v.is_undefined() && !v.is_callable())
                    .map(|v| (name.as_str(), v.clone()))
            })
            .collect()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Private state never shows up in debug output.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Instance")
            .field("factory", &self.0.factory)
            .field("public", &self.0.layout.keys().collect::<Vec<_>>())
            .finish()
    }
}

thread_local! {
    // instances currently being serialized on this thread, to reject cycles
    static SERIALIZING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

struct CycleGuard(usize);
impl CycleGuard {
    fn enter(instance: &Instance) -> Option<Self> {
        let key = Arc::as_ptr(&instance.0) as usize;
        SERIALIZING.with(|s| {
            let mut s = s.borrow_mut();
            if s.contains(&key) {
                None
            } else {
                s.push(key);
                Some(Self(key))
            }
        })
    }
}
impl Drop for CycleGuard {
    fn drop(&mut self) {
        SERIALIZING.with(|s| s.borrow_mut().retain(|k| *k != self.0));
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let _guard = CycleGuard::enter(self)
            .ok_or_else(|| S::Error::custom("cyclic instance cannot be serialized"))?;
        let members = self.public_data();
        let mut map = serializer.serialize_map(Some(members.len()))?;
        for (name, value) in &members {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ------------- Receiver -------------
/// The context a callable runs in. It resolves every name against the
/// instance's state container, where private members shadow public ones.
pub struct Receiver {
    instance: Instance,
}

impl Receiver {
    pub fn get(&self, name: &str) -> Value {
        self.instance.0.read(name).unwrap_or_default()
    }
    /// Writes a member. A name that was never declared is created in the
    /// container and stays unreachable from the surface.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.instance.0.write(name, value.into());
    }
    pub fn has(&self, name: &str) -> bool {
        self.instance.0.state().slots.contains_key(name)
    }
    /// Calls any member, public or private, with this same receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let callable = self.instance.0.callable(name)?;
        callable.invoke(self, args)
    }
    /// The public surface of the instance this receiver belongs to.
    ///
    /// The returned handle keeps the container alive. Storing an instance
    /// inside itself keeps it alive until the slot is cleared.
    pub fn instance(&self) -> Instance {
        self.instance.clone()
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Receiver").field("instance", &self.instance).finish()
    }
}
