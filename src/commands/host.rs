use std::io::Write;

/// The process environment a command runs against.
///
/// The binary wires this to the real standard streams and `process::exit`; tests capture everything in memory.
pub trait Host {
    /// Stream for regular command output.
    fn output(&mut self) -> impl Write;

    /// Stream for error reports.
    fn error(&mut self) -> impl Write;

    /// Terminate with the given exit code.
    fn exit(&mut self, code: i32);
}
