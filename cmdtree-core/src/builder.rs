//! Builder utilities for configuring a [`Scaffolder`].
//!
//! Every setting has a default; [`ScaffolderBuilder::build`] validates the
//! combination and loads template overrides before any command is read.

use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::{
    Result,
    collision::{CollisionPolicy, CollisionStrategy},
    command::{CommandParser, DEFAULT_INVOCATION},
    layout::LeafLayout,
    scaffolder::Scaffolder,
    template::Templates,
};

#[derive(Debug, Clone)]
enum StrategyChoice {
    Policy(CollisionPolicy),
    Custom(Arc<dyn CollisionStrategy>),
}

#[derive(Debug, Clone)]
enum TemplateSource {
    Builtin,
    Loaded(Templates),
    Directory(Utf8PathBuf),
}

/// Configures and constructs [`Scaffolder`] instances.
///
/// # Examples
/// ```
/// use cmdtree_core::{CollisionPolicy, LeafLayout, ScaffolderBuilder};
///
/// let scaffolder = ScaffolderBuilder::new()
///     .with_invocation("mytool")
///     .with_leaf_layout(LeafLayout::ObjectDocument)
///     .with_collision_policy(CollisionPolicy::Skip)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(scaffolder.parser().invocation(), "mytool");
/// assert_eq!(scaffolder.layout(), LeafLayout::ObjectDocument);
/// ```
#[derive(Debug, Clone)]
pub struct ScaffolderBuilder {
    invocation: String,
    layout: LeafLayout,
    strategy: StrategyChoice,
    templates: TemplateSource,
}

impl Default for ScaffolderBuilder {
    fn default() -> Self {
        Self {
            invocation: DEFAULT_INVOCATION.to_owned(),
            layout: LeafLayout::default(),
            strategy: StrategyChoice::Policy(CollisionPolicy::default()),
            templates: TemplateSource::Builtin,
        }
    }
}

impl ScaffolderBuilder {
    /// Creates a builder populated with default settings.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_core::{CollisionPolicy, LeafLayout, ScaffolderBuilder};
    ///
    /// let builder = ScaffolderBuilder::new();
    /// assert_eq!(builder.invocation(), "acli");
    /// assert_eq!(builder.leaf_layout(), LeafLayout::ActionDocument);
    /// assert_eq!(builder.collision_policy(), Some(&CollisionPolicy::default()));
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the invocation literal every command must start with.
    #[must_use]
    pub fn with_invocation(mut self, invocation: impl Into<String>) -> Self {
        self.invocation = invocation.into();
        self
    }

    /// Returns the configured invocation literal.
    #[must_use]
    pub fn invocation(&self) -> &str {
        &self.invocation
    }

    /// Selects which segment names the generated document.
    #[must_use]
    pub const fn with_leaf_layout(mut self, layout: LeafLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Returns the configured leaf layout.
    #[must_use]
    pub const fn leaf_layout(&self) -> LeafLayout {
        self.layout
    }

    /// Uses one of the built-in collision strategies.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_core::{CollisionPolicy, ScaffolderBuilder};
    ///
    /// let builder = ScaffolderBuilder::new().with_collision_policy(CollisionPolicy::RenameWithSuffix {
    ///     suffix: "-cmd".into(),
    /// });
    /// assert_eq!(builder.collision_policy().map(CollisionPolicy::as_str), Some("rename"));
    /// ```
    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.strategy = StrategyChoice::Policy(policy);
        self
    }

    /// Uses a caller-supplied collision strategy.
    ///
    /// Names returned by custom strategies are checked when applied; unsafe
    /// names leave the collision unresolved.
    #[must_use]
    pub fn with_collision_strategy(mut self, strategy: Arc<dyn CollisionStrategy>) -> Self {
        self.strategy = StrategyChoice::Custom(strategy);
        self
    }

    /// Returns the built-in policy, or `None` when a custom strategy is set.
    #[must_use]
    pub const fn collision_policy(&self) -> Option<&CollisionPolicy> {
        match &self.strategy {
            StrategyChoice::Policy(policy) => Some(policy),
            StrategyChoice::Custom(_) => None,
        }
    }

    /// Uses an already loaded template set.
    #[must_use]
    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = TemplateSource::Loaded(templates);
        self
    }

    /// Loads template overrides from `dir` when the scaffolder is built.
    #[must_use]
    pub fn with_template_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.templates = TemplateSource::Directory(dir.into());
        self
    }

    /// Validates the configuration and constructs a [`Scaffolder`].
    ///
    /// # Errors
    /// Returns [`crate::CmdtreeError::InvalidInvocation`] for an empty or
    /// multi-token invocation literal, [`crate::CmdtreeError::InvalidEntryName`]
    /// for an unsafe rename suffix or default entry, and the errors of
    /// [`Templates::load`] when a template directory is configured.
    ///
    /// # Examples
    /// ```
    /// use cmdtree_core::{CmdtreeError, CollisionPolicy, ScaffolderBuilder};
    ///
    /// let err = ScaffolderBuilder::new()
    ///     .with_collision_policy(CollisionPolicy::MergeAsDefault { entry: "../up".into() })
    ///     .build()
    ///     .expect_err("entry name must be rejected");
    /// assert!(matches!(err, CmdtreeError::InvalidEntryName { .. }));
    /// ```
    pub fn build(self) -> Result<Scaffolder> {
        let parser = CommandParser::new(self.invocation)?;
        let strategy: Arc<dyn CollisionStrategy> = match self.strategy {
            StrategyChoice::Policy(policy) => {
                policy.validate()?;
                Arc::new(policy)
            }
            StrategyChoice::Custom(strategy) => strategy,
        };
        let templates = match self.templates {
            TemplateSource::Builtin => Templates::default(),
            TemplateSource::Loaded(templates) => templates,
            TemplateSource::Directory(dir) => Templates::load(&dir)?,
        };
        Ok(Scaffolder::new(parser, self.layout, strategy, templates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::CmdtreeError;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("acli extra")]
    fn build_rejects_unusable_invocation(#[case] invocation: &str) {
        let err = ScaffolderBuilder::new()
            .with_invocation(invocation)
            .build()
            .expect_err("invocation must be rejected");
        assert!(matches!(err, CmdtreeError::InvalidInvocation { .. }));
    }

    #[test]
    fn build_rejects_unsafe_suffix() {
        let err = ScaffolderBuilder::new()
            .with_collision_policy(CollisionPolicy::RenameWithSuffix {
                suffix: "/x".into(),
            })
            .build()
            .expect_err("suffix must be rejected");
        assert_eq!(err.code().as_str(), "CMDTREE_INVALID_ENTRY_NAME");
    }

    #[test]
    fn build_reports_missing_template_dir() {
        let err = ScaffolderBuilder::new()
            .with_template_dir("/definitely/not/here")
            .build()
            .expect_err("template dir must exist");
        assert!(matches!(err, CmdtreeError::Filesystem { .. }));
    }

    #[test]
    fn custom_strategy_clears_policy() {
        let builder = ScaffolderBuilder::new()
            .with_collision_strategy(Arc::new(CollisionPolicy::Skip));
        assert!(builder.collision_policy().is_none());
        builder.build().expect("custom strategy is accepted");
    }
}
