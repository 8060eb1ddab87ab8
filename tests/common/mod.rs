//! Scripted guest interpreter used by the integration tests.
//!
//! Understands just enough of a Python-looking surface to exercise the
//! channel: simple assignments, name lookup, `print("...")`, and
//! `raise Exception("...")`. Assignments accumulate in a namespace that
//! lives as long as the instance, mirroring the persistence contract of a
//! real embedded interpreter.

use std::collections::HashMap;

use cell_runtime::Interpreter;

#[derive(Default)]
pub struct ScriptedInterpreter {
    namespace: HashMap<String, String>,
}

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Interpreter for ScriptedInterpreter {
    fn eval(&mut self, code: &str) -> Result<String, String> {
        let code = code.trim();

        if let Some(rest) = code.strip_prefix("raise Exception(\"") {
            let msg = rest.strip_suffix("\")").unwrap_or(rest);
            return Err(format!("Exception: {}", msg));
        }

        if let Some(rest) = code.strip_prefix("print(\"") {
            let text = rest.strip_suffix("\")").unwrap_or(rest);
            // Real interpreters hand back captured stdout, trailing newline
            // included.
            return Ok(format!("{}\n", text));
        }

        if let Some((name, value)) = code.split_once(" = ") {
            let value = value.trim().trim_matches('"').to_string();
            self.namespace.insert(name.trim().to_string(), value);
            return Ok(String::new());
        }

        match self.namespace.get(code) {
            Some(value) => Ok(value.clone()),
            None => Err(format!("NameError: name '{}' is not defined", code)),
        }
    }
}
