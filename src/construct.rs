use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// member tables remember the order in which names were declared
use indexmap::IndexMap;
use tracing::{debug, trace};

// our own stuff that we need
use crate::error::Result;
use crate::instance::{Accessor, Instance, Layout, Receiver, State};
use crate::value::{Callable, Value};

// ------------- MemberTable -------------
/// Names mapped to member definitions. A `Value::Function` entry is a
/// callable member, anything else is a data member.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemberTable {
    members: IndexMap<String, Value>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }
    /// Inserts or replaces a member. A replaced member keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.members.insert(name.into(), value.into())
    }
    pub fn insert_method<F>(&mut self, name: impl Into<String>, body: F) -> Option<Value>
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(name, Value::function(body))
    }
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.members.shift_remove(name)
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn len(&self) -> usize {
        self.members.len()
    }
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
    fn layout(&self) -> Layout {
        self.members
            .iter()
            .map(|(name, value)| {
                let accessor = if value.is_callable() { Accessor::Method } else { Accessor::Field };
                (name.clone(), accessor)
            })
            .collect()
    }
}

// ------------- Template -------------
#[derive(Clone, Debug)]
struct Template {
    public: MemberTable,
    private: MemberTable,
    initializer: Callable,
}
impl Default for Template {
    fn default() -> Self {
        Self {
            public: MemberTable::new(),
            private: MemberTable::new(),
            initializer: Callable::noop(),
        }
    }
}

// ------------- FactoryId -------------
static NEXT_FACTORY: AtomicU64 = AtomicU64::new(1);

/// Identifies the build a factory came from. Clones of a factory share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(u64);
impl FactoryId {
    fn allocate() -> Self {
        Self(NEXT_FACTORY.fetch_add(1, Ordering::Relaxed))
    }
}
impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "factory#{}", self.0)
    }
}

// ------------- Builder -------------
/// Collects a public table, a private table and an initializer, and turns
/// them into factories.
///
/// The template sits behind an `Arc` that factories share. Mutating the
/// builder after a build copies the template first, so factories that were
/// already built keep the tables they were built with.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    template: Arc<Template>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn public(&self) -> &MemberTable {
        &self.template.public
    }
    pub fn public_mut(&mut self) -> &mut MemberTable {
        &mut Arc::make_mut(&mut self.template).public
    }
    pub fn private(&self) -> &MemberTable {
        &self.template.private
    }
    pub fn private_mut(&mut self) -> &mut MemberTable {
        &mut Arc::make_mut(&mut self.template).private
    }
    pub fn initializer(&self) -> &Callable {
        &self.template.initializer
    }
    /// Installs the initializer. It runs with the instance's receiver after
    /// all members are wired, and gets the arguments given to the factory.
    pub fn set_initializer<F>(&mut self, body: F)
    where
        F: Fn(&Receiver, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.template).initializer =
            Callable::new(move |receiver, args| body(receiver, args).map(|()| Value::Undefined));
    }
    /// Installs a callable value as initializer. Anything that is not
    /// callable falls back to the no-op default.
    pub fn set_initializer_value(&mut self, value: Value) {
        match value {
            Value::Function(callable) => Arc::make_mut(&mut self.template).initializer = callable,
            other => {
                debug!(found = other.type_name(), "initializer is not callable, using the default");
                self.reset_initializer();
            }
        }
    }
    pub fn reset_initializer(&mut self) {
        Arc::make_mut(&mut self.template).initializer = Callable::noop();
    }
    pub fn build(&self) -> Factory {
        let id = FactoryId::allocate();
        debug!(
            factory = %id,
            public = self.template.public.len(),
            private = self.template.private.len(),
            "built factory"
        );
        Factory {
            id,
            layout: Arc::new(self.template.public.layout()),
            template: Arc::clone(&self.template),
        }
    }
}

// ------------- Factory -------------
/// Constructs instances of one build of a template.
#[derive(Clone, Debug)]
pub struct Factory {
    id: FactoryId,
    template: Arc<Template>,
    layout: Arc<Layout>,
}

impl Factory {
    pub fn id(&self) -> FactoryId {
        self.id
    }
    pub fn public_names(&self) -> impl Iterator<Item = &str> {
        self.layout.keys().map(String::as_str)
    }
    pub fn is_instance(&self, instance: &Instance) -> bool {
        instance.factory_id() == self.id
    }
    /// Builds a new instance and runs the initializer on it with `args`.
    /// An error from the initializer is returned and the instance dropped.
    pub fn instantiate(&self, args: &[Value]) -> Result<Instance> {
        let mut state = State::default();
        // private goes last so it shadows public on overlapping names
        state.seed(self.template.public.iter());
        state.seed(self.template.private.iter());
        let instance = Instance::new(self.id, Arc::clone(&self.layout), state);
        self.template.initializer.invoke(&instance.receiver(), args)?;
        trace!(factory = %self.id, args = args.len(), "constructed instance");
        Ok(instance)
    }
}
