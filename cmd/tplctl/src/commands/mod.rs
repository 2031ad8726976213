pub mod login;
pub mod template;
pub mod update;

use clap::Subcommand;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::commands::template::TemplateSelector;
use crate::commands::update::UpdateArgs;

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Update a project template
    ///
    /// Only the fields given on the command line are changed, except for
    /// tags, which are always replaced by the --tag values.
    ///
    /// Examples:
    ///   tplctl template update --name api --summary "REST API"
    ///   tplctl template update --id tmpl-1 --tag go --tag http
    ///   tplctl template update --name api --readme-markdown-template-path README.tpl.md
    Update(UpdateArgs),

    /// Show a project template
    Show {
        #[command(flatten)]
        selector: TemplateSelector,
    },
}

impl TemplateCommands {
    /// Subcommand name, used to look up usage text
    pub fn name(&self) -> &'static str {
        match self {
            TemplateCommands::Update(_) => "update",
            TemplateCommands::Show { .. } => "show",
        }
    }
}

/// Failure of a template command; every variant ends the invocation
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad or missing flag combination; reported together with usage text
    #[error("{message}")]
    Validation { message: String },

    #[error("Project template \"{name}\" does not exist")]
    NotFound { name: String },

    #[error("{message}")]
    Remote { message: String },

    #[error("{message}")]
    FileRead { message: String },

    #[error("Failed to encode template: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        CommandError::Validation {
            message: message.into(),
        }
    }
}

/// Run `fut` unless `cancel` fires first; a token cancelled beforehand
/// never polls the future
pub async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, CommandError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CommandError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Empty flag values mean "not given"
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
