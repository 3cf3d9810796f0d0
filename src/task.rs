//! Benchmark task model
//!
//! A [`Task`] pairs a name with the operation under measurement plus optional
//! setup/teardown hooks. The execution mode is declared at registration time
//! through the [`Operation`] variant, so the measurement loop branches once
//! per task and the synchronous path carries no async machinery.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by async operation closures.
pub type BoxFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A measurable unit of work, fixed as sync or suspending at construction.
pub enum Operation {
    Sync(Box<dyn FnMut() -> anyhow::Result<()> + Send>),
    Async(Box<dyn FnMut() -> BoxFuture + Send>),
}

impl Operation {
    /// Run the operation to completion, awaiting if it suspends.
    pub async fn invoke(&mut self) -> anyhow::Result<()> {
        match self {
            Self::Sync(f) => f(),
            Self::Async(f) => f().await,
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Operation::Sync"),
            Self::Async(_) => f.write_str("Operation::Async"),
        }
    }
}

/// How a task's operation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sync,
    Suspending,
}

/// A named benchmark task with optional lifecycle hooks.
///
/// Setup and teardown are excluded from timing. Teardown runs only when
/// setup succeeded, whether or not the measured operation failed.
pub struct Task {
    pub(crate) name: String,
    pub(crate) operation: Operation,
    pub(crate) setup: Option<Operation>,
    pub(crate) teardown: Option<Operation>,
    pub(crate) skip: bool,
    pub(crate) only: bool,
}

impl Task {
    /// Task over a synchronous closure.
    pub fn sync(
        name: impl Into<String>,
        f: impl FnMut() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        Self::new(name, Operation::Sync(Box::new(f)))
    }

    /// Task over a closure producing a future; measured across suspensions.
    pub fn async_fn<F, Fut>(name: impl Into<String>, mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(name, Operation::Async(Box::new(move || Box::pin(f()))))
    }

    fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
            setup: None,
            teardown: None,
            skip: false,
            only: false,
        }
    }

    /// Untimed setup run once before warmup. Setup failure aborts the task:
    /// no measurement, no teardown.
    pub fn with_setup(
        mut self,
        f: impl FnMut() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.setup = Some(Operation::Sync(Box::new(f)));
        self
    }

    /// Async variant of [`with_setup`](Self::with_setup).
    pub fn with_async_setup<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.setup = Some(Operation::Async(Box::new(move || Box::pin(f()))));
        self
    }

    /// Untimed teardown run once after measurement, provided setup succeeded.
    pub fn with_teardown(
        mut self,
        f: impl FnMut() -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.teardown = Some(Operation::Sync(Box::new(f)));
        self
    }

    /// Async variant of [`with_teardown`](Self::with_teardown).
    pub fn with_async_teardown<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.teardown = Some(Operation::Async(Box::new(move || Box::pin(f()))));
        self
    }

    /// Exclude this task from the run. Wins over [`only`](Self::only).
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Restrict the run to tasks marked `only` (focus mode).
    pub fn only(mut self) -> Self {
        self.only = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        match self.operation {
            Operation::Sync(_) => ExecutionMode::Sync,
            Operation::Async(_) => ExecutionMode::Suspending,
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("mode", &self.execution_mode())
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("skip", &self.skip)
            .field("only", &self.only)
            .finish()
    }
}
