//! The interpreter seam.
//!
//! The crate does not embed a guest language itself; it owns the channel
//! around one. Integrations implement [`Interpreter`] for the embedded
//! runtime and [`InterpreterFactory`] for its one-time provisioning
//! (typically fetching the interpreter bundle and any guest packages from a
//! configured source — which source and version is the implementor's
//! concern).
//!
//! Faults cross this seam as plain `String`s; the channel never inspects
//! them, it only forwards the stringified fault to the original caller.

/// An embedded interpreter instance with a persistent namespace.
///
/// The execution context creates exactly one instance per context lifetime
/// and owns it exclusively. Bindings created by one `eval` call must be
/// visible to later calls on the same instance — sequential submissions see
/// each other's side effects, and that statefulness is intentional.
pub trait Interpreter: Send {
    /// Evaluate `code` against the persistent namespace.
    ///
    /// Returns the string representation of the produced value (including
    /// any captured printed output) on success, or the stringified guest
    /// fault on failure. May block for as long as the guest code runs;
    /// there is no interrupt mechanism.
    fn eval(&mut self, code: &str) -> Result<String, String>;
}

/// One-time provisioning of an [`Interpreter`] instance.
///
/// Invoked lazily by the execution context when the first request arrives,
/// and at most once per context lifetime. A failure here is terminal for
/// the context: no retry is attempted, and every later request is answered
/// with an error naming the original fault.
pub trait InterpreterFactory: Send + 'static {
    fn create(&mut self) -> Result<Box<dyn Interpreter>, String>;
}

impl<F> InterpreterFactory for F
where
    F: FnMut() -> Result<Box<dyn Interpreter>, String> + Send + 'static,
{
    fn create(&mut self) -> Result<Box<dyn Interpreter>, String> {
        self()
    }
}
