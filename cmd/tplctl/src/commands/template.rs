use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{ApiError, TemplateService};
use crate::commands::{cancellable, non_empty, update, CommandError, TemplateCommands};
use crate::types::{ProjectTemplate, TemplateRef};
use crate::utils::spinner;
use crate::OutputFormat;

/// Flags selecting a single project template
#[derive(Debug, Clone, Default, Args)]
pub struct TemplateSelector {
    /// Name of project template
    #[arg(long)]
    pub name: Option<String>,

    /// Id of project template
    #[arg(long)]
    pub id: Option<String>,
}

/// Lookup reference plus the name the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub reference: TemplateRef,
    pub display_name: String,
}

impl TemplateSelector {
    /// Build the lookup reference. The id always wins over the name, and
    /// whichever one wins also becomes the display name.
    pub fn resolve(&self) -> Result<ResolvedTemplate, CommandError> {
        if let Some(id) = non_empty(&self.id) {
            return Ok(ResolvedTemplate {
                reference: TemplateRef::Id(id.to_string()),
                display_name: id.to_string(),
            });
        }

        if let Some(name) = non_empty(&self.name) {
            return Ok(ResolvedTemplate {
                reference: TemplateRef::Name(name.to_string()),
                display_name: name.to_string(),
            });
        }

        Err(CommandError::validation("Missing project template name or id."))
    }
}

/// Fetch the current state of the resolved template
pub async fn fetch<S: TemplateService + ?Sized>(
    service: &S,
    resolved: &ResolvedTemplate,
    cancel: &CancellationToken,
) -> Result<ProjectTemplate, CommandError> {
    match cancellable(cancel, service.get_project_template(&resolved.reference)).await? {
        Ok(template) => Ok(template),
        Err(ApiError::NotFound) => Err(CommandError::NotFound {
            name: resolved.display_name.clone(),
        }),
        Err(err) => Err(CommandError::Remote {
            message: err.humanize(),
        }),
    }
}

pub async fn handle<S: TemplateService + ?Sized>(
    service: &S,
    command: TemplateCommands,
    output: &OutputFormat,
    cancel: &CancellationToken,
) -> Result<(), CommandError> {
    match command {
        TemplateCommands::Update(args) => {
            let spinner = spinner::new("Updating project template...");
            let template = update::run(service, &args, cancel).await?;
            drop(spinner);

            info!(name = %template.name, "project template updated");
            print_updated(&template, output)
        }
        TemplateCommands::Show { selector } => show_template(service, &selector, output, cancel).await,
    }
}

async fn show_template<S: TemplateService + ?Sized>(
    service: &S,
    selector: &TemplateSelector,
    output: &OutputFormat,
    cancel: &CancellationToken,
) -> Result<(), CommandError> {
    let resolved = selector.resolve()?;

    let spinner = spinner::new("Fetching project template...");
    let template = fetch(service, &resolved, cancel).await?;
    drop(spinner);

    match output {
        OutputFormat::Json => println!("{}", render_json(&template)?),
        OutputFormat::Compact => println!("{}", compact_line(&template)),
        OutputFormat::Pretty => print_pretty(&template),
    }

    Ok(())
}

fn print_updated(template: &ProjectTemplate, output: &OutputFormat) -> Result<(), CommandError> {
    match output {
        OutputFormat::Json => println!("{}", render_json(template)?),
        OutputFormat::Compact => println!("{}", compact_line(template)),
        OutputFormat::Pretty => {
            println!(
                "{} Project template updated: {}",
                "✓".green(),
                template.name.cyan()
            );
        }
    }

    Ok(())
}

fn render_json(template: &ProjectTemplate) -> Result<String, CommandError> {
    Ok(serde_json::to_string_pretty(template)?)
}

fn compact_line(template: &ProjectTemplate) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        template.id,
        template.name,
        template.summary,
        template.tags.join(",")
    )
}

fn print_pretty(template: &ProjectTemplate) {
    if template.id.is_empty() {
        println!("{} {}", "•".blue(), template.name.cyan().bold());
    } else {
        println!(
            "{} {} ({})",
            "•".blue(),
            template.name.cyan().bold(),
            template.id.bright_black()
        );
    }

    if !template.summary.is_empty() {
        println!("  Summary: {}", template.summary);
    }
    if !template.expanded_summary.is_empty() {
        println!("  Expanded summary: {}", template.expanded_summary);
    }
    if !template.tags.is_empty() {
        println!("  Tags: {}", template.tags.join(", ").yellow());
    }
    if let Some(module) = &template.terraform_nocode_module {
        println!(
            "  Terraform no-code module: {} {}",
            module.source,
            format!("v{}", module.version).green()
        );
    }
    if !template.readme_markdown_template.is_empty() {
        println!(
            "  README template: {} bytes",
            template.readme_markdown_template.len()
        );
    }
    if let Some(project) = &template.waypoint_project {
        println!(
            "  waypoint.hcl template: {} bytes",
            project.waypoint_hcl_template.len()
        );
    }
}
