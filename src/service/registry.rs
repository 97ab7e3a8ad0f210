use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::domain::{IndicatorCategory, IndicatorResult, ScanContext};
use crate::error::{Result, ScanError};
use crate::service::http::Fetcher;
use crate::service::scanner::{default_scanners, Scanner, ScannerScope};

/// Catalog of scanners, in registration order.
///
/// Built once at startup and shared behind an `Arc`. Running a batch never
/// fails: a scanner that errors or panics yields a synthetic `fail` result.
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: Vec<Arc<dyn Scanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in scanners.
    pub fn with_default_scanners(config: &EngineConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config)?;
        let mut registry = Self::new();
        for scanner in default_scanners(fetcher) {
            registry.register(scanner)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, scanner: Arc<dyn Scanner>) -> Result<()> {
        if self.get(scanner.name()).is_some() {
            return Err(ScanError::DuplicateScanner {
                name: scanner.name().to_string(),
            });
        }
        tracing::debug!("[REGISTRY] Registered scanner {}", scanner.name());
        self.scanners.push(scanner);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scanner>> {
        self.scanners.iter().find(|s| s.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.scanners.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }

    pub fn clear(&mut self) {
        self.scanners.clear();
    }

    /// Run every applicable scanner concurrently.
    pub async fn run_all(&self, ctx: &ScanContext) -> Vec<IndicatorResult> {
        self.run_matching(ctx, |_| true).await
    }

    pub async fn run_by_category(
        &self,
        category: IndicatorCategory,
        ctx: &ScanContext,
    ) -> Vec<IndicatorResult> {
        self.run_matching(ctx, |s| s.category() == category).await
    }

    pub async fn run_by_scope(&self, scope: ScannerScope, ctx: &ScanContext) -> Vec<IndicatorResult> {
        self.run_matching(ctx, |s| s.scope() == scope).await
    }

    async fn run_matching<F>(&self, ctx: &ScanContext, filter: F) -> Vec<IndicatorResult>
    where
        F: Fn(&dyn Scanner) -> bool,
    {
        let selected: Vec<&Arc<dyn Scanner>> = self
            .scanners
            .iter()
            .filter(|s| filter(&***s))
            .filter(|s| {
                let applicable = s.is_applicable(ctx);
                if !applicable {
                    tracing::trace!("[REGISTRY] Skipping {} for {}", s.name(), ctx.target_url());
                }
                applicable
            })
            .collect();

        // join_all preserves input order.
        join_all(selected.into_iter().map(|scanner| run_isolated(&**scanner, ctx))).await
    }
}

async fn run_isolated(scanner: &dyn Scanner, ctx: &ScanContext) -> IndicatorResult {
    let outcome = AssertUnwindSafe(scanner.scan(ctx)).catch_unwind().await;

    let error = match outcome {
        Ok(Ok(result)) => return result,
        Ok(Err(e)) => format!("{:#}", e),
        Err(panic) => panic_message(&*panic),
    };

    let failure = ScanError::ScannerFailed {
        name: scanner.name().to_string(),
        message: error.clone(),
    };
    tracing::warn!("[REGISTRY] {}", failure);

    IndicatorResult::crashed(scanner.name(), scanner.category(), scanner.weight(), error)
        .for_page(ctx.target_url().as_str())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
