use async_trait::async_trait;
use tracing::{debug, warn};

use fleetr_core::{ConfigChange, Payload, SubTask, TaskContext, TaskError, TaskOutput};
use fleetr_protocols::LoadMode;

/// Pushes configuration through the candidate cycle: load, compare, then
/// commit or discard.
///
/// Nothing is committed on a dry run or when the diff is empty. `changed`
/// reports whether the diff was non-empty, dry run or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configure {
    pub configuration: String,
    pub replace: bool,
    /// Overrides the run-wide dry-run default when set.
    pub dry_run: Option<bool>,
}

impl Configure {
    pub fn merge(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            replace: false,
            dry_run: None,
        }
    }

    pub fn replace(configuration: impl Into<String>) -> Self {
        Self {
            replace: true,
            ..Self::merge(configuration)
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    fn mode(&self) -> LoadMode {
        if self.replace {
            LoadMode::Replace
        } else {
            LoadMode::Merge
        }
    }
}

#[async_trait]
impl SubTask for Configure {
    fn name(&self) -> &str {
        "configure"
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskOutput, TaskError> {
        let dry_run = self.dry_run.unwrap_or(ctx.dry_run);

        if let Err(e) = ctx.driver.load_candidate(&self.configuration, self.mode()).await {
            if let Err(discard) = ctx.driver.discard_config().await {
                warn!(error = %discard, "discarding rejected candidate failed");
            }
            return Err(e.into());
        }

        let diff = ctx.driver.compare_config().await?;
        let changed = !diff.is_empty();

        let committed = if changed && !dry_run {
            ctx.driver.commit_config().await?;
            true
        } else {
            ctx.driver.discard_config().await?;
            false
        };
        debug!(changed, committed, dry_run, "configuration applied");

        Ok(TaskOutput::new(Payload::Config(ConfigChange { diff, committed })).with_changed(changed))
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
