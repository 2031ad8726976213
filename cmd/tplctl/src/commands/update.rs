use clap::Args;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::TemplateService;
use crate::commands::template::{fetch, TemplateSelector};
use crate::commands::{cancellable, non_empty, CommandError};
use crate::types::{ProjectTemplate, TerraformNocodeModule, WaypointProject};

#[derive(Debug, Clone, Default, Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub selector: TemplateSelector,

    /// Summary for the project template
    #[arg(long)]
    pub summary: Option<String>,

    /// Expanded summary for the project template
    #[arg(long)]
    pub expanded_summary: Option<String>,

    /// Path to a markdown readme template for projects created from the template
    #[arg(long, value_name = "PATH")]
    pub readme_markdown_template_path: Option<PathBuf>,

    /// Path to a templated waypoint.hcl file for projects created from the template
    #[arg(long, value_name = "PATH")]
    pub waypoint_hcl_template_path: Option<PathBuf>,

    /// Terraform no-code module (from a Terraform registry) used to provision
    /// infrastructure for projects created from the template
    #[arg(long, value_name = "SOURCE")]
    pub tfc_nocode_module_source: Option<String>,

    /// Version of the Terraform no-code module
    #[arg(long, value_name = "VERSION")]
    pub tfc_nocode_module_version: Option<String>,

    /// A tag for the project template; repeat for several. Replaces all
    /// existing tags, so omitting it clears them.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

/// Field changes requested for a template. `None` leaves a field as fetched,
/// except `tags`, which always replaces the stored list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOverrides {
    pub summary: Option<String>,
    pub expanded_summary: Option<String>,
    pub readme_markdown_template_path: Option<PathBuf>,
    pub waypoint_hcl_template_path: Option<PathBuf>,
    pub nocode_module_source: Option<String>,
    pub nocode_module_version: Option<String>,
    pub tags: Vec<String>,
}

impl From<&UpdateArgs> for TemplateOverrides {
    fn from(args: &UpdateArgs) -> Self {
        let path = |p: &Option<PathBuf>| p.clone().filter(|p| !p.as_os_str().is_empty());

        Self {
            summary: non_empty(&args.summary).map(str::to_string),
            expanded_summary: non_empty(&args.expanded_summary).map(str::to_string),
            readme_markdown_template_path: path(&args.readme_markdown_template_path),
            waypoint_hcl_template_path: path(&args.waypoint_hcl_template_path),
            nocode_module_source: non_empty(&args.tfc_nocode_module_source).map(str::to_string),
            nocode_module_version: non_empty(&args.tfc_nocode_module_version).map(str::to_string),
            tags: args.tags.clone(),
        }
    }
}

/// Local template files that can be uploaded
#[derive(Clone, Copy)]
enum TemplateFile {
    Readme,
    WaypointHcl,
}

impl TemplateFile {
    fn missing_message(self) -> &'static str {
        match self {
            TemplateFile::Readme => "Readme template file does not exist",
            TemplateFile::WaypointHcl => "Waypoint.hcl template file does not exist",
        }
    }

    fn unreadable_message(self) -> &'static str {
        match self {
            TemplateFile::Readme => "Unable to read readme.md template file",
            TemplateFile::WaypointHcl => "Unable to read waypoint.hcl template file",
        }
    }
}

fn read_template_file(path: &Path, kind: TemplateFile) -> Result<Vec<u8>, CommandError> {
    debug!(path = %path.display(), "reading template file");

    std::fs::read(path).map_err(|err| {
        let message = if err.kind() == io::ErrorKind::NotFound {
            format!("{}: {}", kind.missing_message(), path.display())
        } else {
            format!(
                "{}: {}: {}",
                kind.unreadable_message(),
                path.display(),
                err
            )
        };
        CommandError::FileRead { message }
    })
}

/// Apply `overrides` to a fetched template in memory.
///
/// Reads template files and validates the module pairing; nothing here talks
/// to the server, so a failure leaves the stored template untouched.
pub fn apply(
    template: &mut ProjectTemplate,
    display_name: &str,
    overrides: &TemplateOverrides,
) -> Result<(), CommandError> {
    template.name = display_name.to_string();

    if let Some(summary) = &overrides.summary {
        template.summary = summary.clone();
    }
    if let Some(expanded_summary) = &overrides.expanded_summary {
        template.expanded_summary = expanded_summary.clone();
    }

    if let Some(path) = &overrides.readme_markdown_template_path {
        template.readme_markdown_template = read_template_file(path, TemplateFile::Readme)?;
    }

    if let Some(path) = &overrides.waypoint_hcl_template_path {
        template.waypoint_project = Some(WaypointProject {
            waypoint_hcl_template: read_template_file(path, TemplateFile::WaypointHcl)?,
        });
    }

    match (&overrides.nocode_module_source, &overrides.nocode_module_version) {
        (Some(_), None) => {
            return Err(CommandError::validation(
                "Terraform no code module version required.",
            ))
        }
        (None, Some(_)) => {
            return Err(CommandError::validation(
                "Terraform no code module source required.",
            ))
        }
        (Some(source), Some(version)) => {
            template.terraform_nocode_module = Some(TerraformNocodeModule {
                source: source.clone(),
                version: version.clone(),
            });
        }
        (None, None) => {}
    }

    template.tags = overrides.tags.clone();

    Ok(())
}

/// Send the full template back to the server
pub async fn persist<S: TemplateService + ?Sized>(
    service: &S,
    template: &ProjectTemplate,
    cancel: &CancellationToken,
) -> Result<(), CommandError> {
    cancellable(cancel, service.update_project_template(template))
        .await?
        .map_err(|err| CommandError::Remote {
            message: format!("Error updating project template: {}", err.humanize()),
        })
}

/// Resolve, fetch, modify and write back a project template
pub async fn run<S: TemplateService + ?Sized>(
    service: &S,
    args: &UpdateArgs,
    cancel: &CancellationToken,
) -> Result<ProjectTemplate, CommandError> {
    let resolved = args.selector.resolve()?;
    info!(reference = ?resolved.reference, "updating project template");

    let mut template = fetch(service, &resolved, cancel).await?;
    apply(
        &mut template,
        &resolved.display_name,
        &TemplateOverrides::from(args),
    )?;
    persist(service, &template, cancel).await?;

    Ok(template)
}
