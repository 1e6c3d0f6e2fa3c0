//! CFSM reference machine.
//!
//! Executes the transition protocol that generated code implements, driven
//! directly by a finalized namespace. Used to check the protocol without a
//! C compiler and as an executable statement of the contract.
//!
//! ```ignore
//! let spec = MachineSpec::from_namespace(namespace.root())?;
//! let mut machine = Machine::new(&spec, spec.state_index("CLOSED").unwrap())?;
//! let mut hooks = ScriptedHooks::new().always("has_key", false);
//! assert_eq!(
//!     machine.advance(Request::Event(spec.event_index("lock").unwrap()), &(), &mut hooks),
//!     Status::ErrPrecondition,
//! );
//! ```

mod error;
mod hooks;
mod machine;
mod spec;

pub use cfsm_types::{CallbackOrder, Status};
pub use error::{RuntimeError, RuntimeResult};
pub use hooks::{HookCall, HookPhase, Hooks, RecordedCall, ScriptedHooks};
pub use machine::{Machine, Request};
pub use spec::{EdgeSpec, EventSpec, MachineSpec, StateSpec};
