//! Autonomous routine selection.
//!
//! The chooser holds named command factories for the autonomous routines a
//! robot ships with. Exactly one routine is picked per match, either an
//! explicit selection (dashboard, config) or the configured default. The
//! cycle runner builds the selected command when the autonomous phase
//! begins; this is the only cross-phase entry point into the scheduler.

use thiserror::Error;

use crate::command::{Command, CommandFactory};

/// Error type for chooser configuration and selection.
#[derive(Debug, Error)]
pub enum ChooserError {
    /// The name does not match any registered option.
    #[error("unknown autonomous option '{0}'")]
    UnknownOption(String),

    /// An option with this name already exists.
    #[error("duplicate autonomous option '{0}'")]
    DuplicateOption(String),

    /// Neither an explicit selection nor a default is available.
    #[error("no autonomous option selected and no default configured")]
    NothingSelected,
}

/// Named autonomous routines with a default and an optional override.
#[derive(Default)]
pub struct AutoChooser {
    options: Vec<(String, CommandFactory)>,
    default: Option<usize>,
    selected: Option<usize>,
}

impl AutoChooser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine under a unique name.
    pub fn add_option(
        &mut self,
        name: impl Into<String>,
        factory: CommandFactory,
    ) -> Result<(), ChooserError> {
        let name = name.into();
        if self.index_of(&name).is_some() {
            return Err(ChooserError::DuplicateOption(name));
        }
        self.options.push((name, factory));
        Ok(())
    }

    /// Mark a registered option as the fallback when nothing is selected.
    pub fn set_default(&mut self, name: &str) -> Result<(), ChooserError> {
        match self.index_of(name) {
            Some(index) => {
                self.default = Some(index);
                Ok(())
            }
            None => Err(ChooserError::UnknownOption(name.to_string())),
        }
    }

    /// Select a routine by name, overriding the default.
    pub fn select(&mut self, name: &str) -> Result<(), ChooserError> {
        match self.index_of(name) {
            Some(index) => {
                self.selected = Some(index);
                Ok(())
            }
            None => Err(ChooserError::UnknownOption(name.to_string())),
        }
    }

    /// Name of the routine that would run: the selection, else the default.
    pub fn selected_name(&self) -> Option<&str> {
        self.effective_index()
            .map(|index| self.options[index].0.as_str())
    }

    /// Build the selected (or default) autonomous command.
    pub fn make_selected(&self) -> Result<Box<dyn Command>, ChooserError> {
        match self.effective_index() {
            Some(index) => Ok((self.options[index].1)()),
            None => Err(ChooserError::NothingSelected),
        }
    }

    /// Registered option names in registration order.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn effective_index(&self) -> Option<usize> {
        self.selected.or(self.default)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|(n, _)| n == name)
    }
}
