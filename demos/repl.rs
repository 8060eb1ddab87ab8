//! Demo for cell-runtime
//!
//! Run with: cargo run --example repl
//!
//! Hosts a toy interpreter (an accumulator with `add N` / `total`
//! commands) behind the execution channel and drives a few cells through
//! it, printing progress events as they arrive.

use cell_runtime::{ExecutionService, Interpreter};

struct Accumulator {
    total: i64,
}

impl Interpreter for Accumulator {
    fn eval(&mut self, code: &str) -> Result<String, String> {
        let code = code.trim();
        if let Some(arg) = code.strip_prefix("add ") {
            let n: i64 = arg
                .parse()
                .map_err(|e| format!("invalid operand {:?}: {}", arg, e))?;
            self.total += n;
            Ok(String::new())
        } else if code == "total" {
            Ok(self.total.to_string())
        } else {
            Err(format!("unknown command: {}", code))
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .init();

    let service = ExecutionService::start("demo", || -> Result<Box<dyn Interpreter>, String> {
        Ok(Box::new(Accumulator { total: 0 }))
    })
    .expect("failed to spawn execution context");

    let mut progress = service.subscribe_progress();
    tokio::spawn(async move {
        while let Ok(event) = progress.recv().await {
            println!("  [progress] id={} {:?}", event.id, event.stage);
        }
    });

    for cell in ["add 2", "add 40", "total", "subtract 1"] {
        match service.submit(cell).await {
            Ok(result) if result.is_empty() => println!("cell {:?} -> ok", cell),
            Ok(result) => println!("cell {:?} -> {}", cell, result),
            Err(e) => println!("cell {:?} -> failed: {}", cell, e),
        }
    }

    service.shutdown();
}
