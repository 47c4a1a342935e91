mod cli;
use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command, EditArgs, FillArgs, RegisterArgs};
use planfill::{
    config::{FillConfig, LOG_ENV},
    parser::{CommandItemParser, parse_response_text},
    path_policy::{decide_output_path, write_new_file},
    registry::{DirRegistry, TemplateRegistry},
    service::{FilledWorkbook, PlanService},
    summary::{print_summary, print_template},
    template::{TemplateDraft, TemplateEdit},
};
use std::{env, fs, io, path::Path};
use tracing_subscriber::EnvFilter;
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = FillConfig::load(&cli.config)?;
    let registry = DirRegistry::new(&cli.registry);
    let service = PlanService::new(&registry, &config);
    match cli.command {
        Command::Register(args) => register(&service, args).await,
        Command::Edit(args) => edit(&service, args).await,
        Command::List => {
            for template in registry.list().await? {
                print_template(&template);
            }
            Ok(())
        }
        Command::Show { id } => {
            let template = registry.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&template)?);
            Ok(())
        }
        Command::Delete { id } => {
            registry.delete(id).await?;
            println!("삭제됨: {id}");
            Ok(())
        }
        Command::Request { id, text } => {
            let text = read_text(&text)?;
            let request = service.request_for(id, &text).await?;
            println!("{}", serde_json::to_string_pretty(&request)?);
            Ok(())
        }
        Command::Fill(args) => fill(&service, &registry, args).await,
    }
}
fn init_logging(verbose: bool) {
    let default = if verbose { "planfill=debug,info" } else { "info" };
    let filter = match env::var(LOG_ENV) {
        Ok(directives) if !verbose => EnvFilter::new(directives),
        _ => EnvFilter::new(default),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
async fn register(service: &PlanService<'_>, args: RegisterArgs) -> Result<()> {
    let bytes = fs::read(&args.workbook)
        .with_context(|| format!("xlsx 파일을 읽지 못했습니다: {}", args.workbook.display()))?;
    let draft = TemplateDraft {
        name: args.name,
        mode: args.mode.into(),
        sheet_name: args.sheet,
        section_labels: args.sections,
        columns: args.columns,
        row_offset: args.row_offset,
        freeform_instructions: args.instructions,
    };
    let template = service.register_template(draft, &bytes).await?;
    print_template(&template);
    Ok(())
}
async fn edit(service: &PlanService<'_>, args: EditArgs) -> Result<()> {
    let bytes = match &args.workbook {
        Some(path) => Some(
            fs::read(path)
                .with_context(|| format!("xlsx 파일을 읽지 못했습니다: {}", path.display()))?,
        ),
        None => None,
    };
    let changes = TemplateEdit {
        name: args.name,
        mode: args.mode.map(Into::into),
        sheet_name: args.sheet,
        section_labels: Some(args.sections).filter(|s| !s.is_empty()),
        columns: Some(args.columns).filter(|c| !c.is_empty()),
        row_offset: args.row_offset,
        freeform_instructions: args.instructions,
    };
    let template = service
        .edit_template(args.id, changes, bytes.as_deref())
        .await?;
    print_template(&template);
    Ok(())
}
async fn fill(service: &PlanService<'_>, registry: &DirRegistry, args: FillArgs) -> Result<()> {
    let filled: FilledWorkbook = match (&args.items, &args.text, &args.parser_cmd) {
        (Some(items), _, _) => {
            let items = parse_response_text(&read_text(items)?)?;
            service.fill_items(args.id, &items).await?
        }
        (None, Some(text), Some(program)) => {
            let parser = CommandItemParser::new(program, args.parser_args.clone());
            service
                .fill_from_text(args.id, &read_text(text)?, &parser)
                .await?
        }
        _ => bail!("--items 또는 --text/--parser-cmd 중 하나가 필요합니다."),
    };
    let template = registry.get(args.id).await?;
    let written = if args.dry_run {
        None
    } else {
        let target = decide_output_path(args.output.as_deref(), &args.out_dir, &filled.file_name)?;
        Some(write_new_file(&target, &filled.bytes)?)
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&filled.report)?);
    } else {
        print_summary(&template, &filled.report, written.as_deref());
    }
    Ok(())
}
fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("파일을 읽지 못했습니다: {}", path.display()))
}
