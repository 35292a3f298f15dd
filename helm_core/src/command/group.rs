//! Command composition: sequential and parallel groups.
//!
//! Groups implement [`Command`] themselves, so they nest and schedule like
//! any other command. A group's requirement set is the union of its
//! children's, computed once at construction; the scheduler arbitrates the
//! whole group as a unit while the group drives its children internally.

use thiserror::Error;

use crate::command::{Command, CycleCtx, StepResult};
use crate::resource::ResourceSet;

/// Error type for group construction.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Parallel children step in the same cycle so they may not share resources.
    #[error("parallel group '{group}': children share resources {overlap:?}")]
    OverlappingChildren {
        group: String,
        overlap: ResourceSet,
    },
}

// ─── Sequential ─────────────────────────────────────────────────────

/// Runs children one at a time, in order, with no idle cycle between them.
///
/// When the current child reports finished it ends normally, the index
/// advances, and the next child initializes in the same cycle. The group is
/// finished once the index passes the last child.
pub struct SequentialGroup {
    name: String,
    children: Vec<Box<dyn Command>>,
    requirements: ResourceSet,
    index: usize,
}

impl SequentialGroup {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Command>>) -> Self {
        let requirements = children
            .iter()
            .fold(ResourceSet::EMPTY, |acc, c| acc.union(c.requirements()));
        Self {
            name: name.into(),
            children,
            requirements,
            index: 0,
        }
    }
}

impl Command for SequentialGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CycleCtx<'_>) {
        self.index = 0;
        if let Some(first) = self.children.first_mut() {
            first.initialize(ctx);
        }
    }

    fn execute(&mut self, ctx: &mut CycleCtx<'_>) -> StepResult {
        let Some(child) = self.children.get_mut(self.index) else {
            return Ok(());
        };
        child.execute(ctx)?;
        if child.is_finished() {
            child.end(ctx, false);
            self.index += 1;
            if let Some(next) = self.children.get_mut(self.index) {
                next.initialize(ctx);
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.index >= self.children.len()
    }

    fn end(&mut self, ctx: &mut CycleCtx<'_>, interrupted: bool) {
        // Completed children already ended normally; only the child in
        // flight needs an interrupted end.
        if interrupted {
            if let Some(child) = self.children.get_mut(self.index) {
                child.end(ctx, true);
            }
        }
    }
}

// ─── Parallel ───────────────────────────────────────────────────────

/// Completion mode of a [`ParallelGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelMode {
    /// Finished once every child has finished.
    AllFinish,
    /// Finished when the first child finishes; unfinished siblings are
    /// interrupted at that point.
    RaceFinish,
}

struct ParallelChild {
    command: Box<dyn Command>,
    finished: bool,
}

/// Steps all children every cycle until the completion mode is satisfied.
pub struct ParallelGroup {
    name: String,
    mode: ParallelMode,
    children: Vec<ParallelChild>,
    requirements: ResourceSet,
}

impl ParallelGroup {
    /// Build a parallel group; children must declare disjoint resources.
    pub fn new(
        name: impl Into<String>,
        mode: ParallelMode,
        children: Vec<Box<dyn Command>>,
    ) -> Result<Self, GroupError> {
        let name = name.into();
        let mut union = ResourceSet::EMPTY;
        let mut overlap = ResourceSet::EMPTY;
        for child in &children {
            let req = child.requirements();
            overlap = overlap.union(union.intersection(req));
            union = union.union(req);
        }
        if !overlap.is_empty() {
            return Err(GroupError::OverlappingChildren {
                group: name,
                overlap,
            });
        }
        Ok(Self {
            name,
            mode,
            children: children
                .into_iter()
                .map(|command| ParallelChild {
                    command,
                    finished: false,
                })
                .collect(),
            requirements: union,
        })
    }
}

impl Command for ParallelGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> ResourceSet {
        self.requirements
    }

    fn initialize(&mut self, ctx: &mut CycleCtx<'_>) {
        for child in self.children.iter_mut() {
            child.finished = false;
            child.command.initialize(ctx);
        }
    }

    fn execute(&mut self, ctx: &mut CycleCtx<'_>) -> StepResult {
        for child in self.children.iter_mut() {
            if child.finished {
                continue;
            }
            child.command.execute(ctx)?;
            if child.command.is_finished() {
                child.command.end(ctx, false);
                child.finished = true;
            }
        }

        if self.mode == ParallelMode::RaceFinish
            && self.children.iter().any(|c| c.finished)
        {
            for child in self.children.iter_mut() {
                if !child.finished {
                    child.command.end(ctx, true);
                    child.finished = true;
                }
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        match self.mode {
            ParallelMode::AllFinish => self.children.iter().all(|c| c.finished),
            ParallelMode::RaceFinish => self.children.iter().any(|c| c.finished),
        }
    }

    fn end(&mut self, ctx: &mut CycleCtx<'_>, interrupted: bool) {
        if interrupted {
            for child in self.children.iter_mut() {
                if !child.finished {
                    child.command.end(ctx, true);
                    child.finished = true;
                }
            }
        }
    }
}
