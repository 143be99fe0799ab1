use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use targetdag::errors::WorkError;
use targetdag::exec::ProcessAdapter;

type Handler = Arc<dyn Fn(&[String]) -> Result<(), WorkError> + Send + Sync>;

/// A fake process adapter that:
/// - records every argument vector it is asked to run
/// - delegates the outcome (and any side effects) to a test-supplied handler.
///
/// Clone it before handing it to the scheduler to keep access to the call
/// log; clones share state.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    handler: Handler,
}

impl FakeProcessAdapter {
    /// Adapter whose every invocation succeeds without side effects.
    pub fn succeeding() -> Self {
        Self::with_handler(|_| Ok(()))
    }

    /// Adapter that runs `handler` for each invocation. The handler gets the
    /// argument vector and typically writes the expected artifact into a
    /// shared mock filesystem.
    pub fn with_handler(
        handler: impl Fn(&[String]) -> Result<(), WorkError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            handler: Arc::new(handler),
        }
    }

    /// Argument vectors seen so far, in invocation order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessAdapter for FakeProcessAdapter {
    fn run(
        &self,
        argv: &[String],
        _deadline: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<(), WorkError>> + Send + '_>> {
        let argv = argv.to_vec();
        let calls = Arc::clone(&self.calls);
        let handler = Arc::clone(&self.handler);

        Box::pin(async move {
            calls.lock().unwrap().push(argv.clone());
            handler(&argv)
        })
    }
}
