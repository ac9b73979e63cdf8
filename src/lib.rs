//! Classbuilder – runtime public/private object templates.
//!
//! A [`Builder`] holds two member tables and an initializer:
//! * the *public* table names everything an instance exposes;
//! * the *private* table names members only the instance's own callables
//!   can reach;
//! * the *initializer* runs once per instance, after the members are wired.
//!
//! Members are [`Value`]s. A [`Value::Function`] entry is a callable member,
//! anything else is a data member.
//!
//! [`Builder::build`] returns a [`Factory`]; every call to
//! [`Factory::instantiate`] produces an [`Instance`] with its own state
//! container. The instance surface only knows the public names. Public data
//! is read and written through accessors that go to the container, public
//! callables are invoked with a [`Receiver`] bound to the container, and
//! private names are simply absent.
//!
//! ## Receiver
//! Callables never see the instance surface directly. They get a
//! [`Receiver`] that resolves names against the container, where private
//! members shadow public ones. Through it a public method reads and mutates
//! private state and private methods see public state.
//!
//! ## Quick Start
//! ```
//! use classbuilder::{Builder, Value};
//! let mut b = Builder::new();
//! b.private_mut().insert("counter", 0);
//! b.public_mut().insert_method("increment", |rx, _| {
//!     let n = rx.get("counter").expect_int()?;
//!     rx.set("counter", n + 1);
//!     Ok(Value::Undefined)
//! });
//! b.public_mut().insert_method("getCounter", |rx, _| Ok(rx.get("counter")));
//! let counter = b.build();
//! let c = counter.instantiate(&[]).unwrap();
//! c.call("increment", &[]).unwrap();
//! assert_eq!(c.call("getCounter", &[]).unwrap(), Value::Int(1));
//! assert!(c.get("counter").is_none());
//! ```
//!
//! ## Templates from configuration
//! The [`template`] module fills member tables with data members read through
//! the `config` crate, so defaults can live in a file or the environment while
//! callables are attached in code.

pub mod construct;
pub mod error;
pub mod instance;
pub mod template;
pub mod value;

pub use construct::{Builder, Factory, FactoryId, MemberTable};
pub use error::{BuilderError, Result};
pub use instance::{Instance, Receiver};
pub use value::{Callable, Value};
