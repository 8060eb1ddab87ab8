//! Cell Runtime
//!
//! An asynchronous execution channel for user-authored script cells: the
//! application submits code and awaits the result while an isolated
//! execution context, running on its own thread, evaluates one submission
//! at a time against a single long-lived interpreter instance.
//!
//! # Architecture
//!
//! - Each context runs in a dedicated thread that exclusively owns one
//!   lazily-created [`Interpreter`]
//! - The client talks to it over bounded channels using the [`protocol`]
//!   wire vocabulary, correlating responses to calls by id
//! - Interpreter namespaces persist across submissions: `x = 1` in one
//!   cell is visible to the next
//!
//! ```no_run
//! use cell_runtime::{ExecutionService, Interpreter};
//!
//! # struct MyInterpreter;
//! # impl Interpreter for MyInterpreter {
//! #     fn eval(&mut self, _code: &str) -> Result<String, String> { Ok(String::new()) }
//! # }
//! # async fn demo() -> Result<(), cell_runtime::ExecError> {
//! let service = ExecutionService::start("cells", || -> Result<Box<dyn Interpreter>, String> {
//!     Ok(Box::new(MyInterpreter))
//! })?;
//! let result = service.submit("x = 1").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod context;
mod error;
mod interpreter;
pub mod protocol;
mod service;
mod spawn;

pub use client::{ExecutionClient, ProgressEvent, ProgressStage};
pub use error::ExecError;
pub use interpreter::{Interpreter, InterpreterFactory};
pub use service::ExecutionService;
pub use spawn::{spawn_context, spawn_context_with_capacity, ContextHandle, DEFAULT_CHANNEL_CAPACITY};
