use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use claude_plugins_core::config::Config;
use claude_plugins_core::plugin::paths::PLUGINS_DIR_NAME;
use claude_plugins_core::plugin::types::PluginTool;
use claude_plugins_core::{
    AvailablePlugin, InstallOptions, InstallOutcome, InstalledPlugin, ListOptions, PluginError,
    PluginInfo, PluginListing, PluginManager, PluginPaths, RemotePluginInfo, RemoveOptions,
    RemoveOutcome, Result, Scope,
};

mod args;
use args::{Cli, Commands, ConfigAction, Shell};

const BASE_DIR_ENV: &str = "CLAUDE_PLUGINS_HOME";

/// Per-invocation context shared by the command handlers
struct Context {
    base_dir: PathBuf,
    cwd: PathBuf,
    quiet: bool,
}

impl Context {
    fn manager(&self) -> Result<PluginManager> {
        let config = Config::load(&self.base_dir)?;
        let paths = PluginPaths::for_project(&self.cwd, self.base_dir.clone());
        PluginManager::new(paths, config, self.cwd.clone())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = resolve_context(cli.base_dir, cli.quiet).and_then(|ctx| match cli.command {
        Some(Commands::Install {
            identifier,
            global,
            force,
            registry,
        }) => handle_install(&ctx, &identifier, global, force, registry),
        Some(Commands::List { all, registry }) => handle_list(&ctx, all, registry),
        Some(Commands::Remove { identifier, force }) => handle_remove(&ctx, &identifier, force),
        Some(Commands::Info {
            identifier,
            registry,
        }) => handle_info(&ctx, &identifier, registry.as_deref()),
        Some(Commands::Search { query, registry }) => {
            handle_search(&ctx, &query, registry.as_deref())
        }
        Some(Commands::Enable { identifier }) => handle_set_enabled(&ctx, &identifier, true),
        Some(Commands::Disable { identifier }) => handle_set_enabled(&ctx, &identifier, false),
        Some(Commands::Config { action }) => handle_config(action, &ctx.base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}: {}", "[ERROR]".red().bold(), e.kind(), e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the flag-derived level
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "claude-plugins", &mut io::stdout());
}

fn resolve_context(cli_base: Option<PathBuf>, quiet: bool) -> Result<Context> {
    Ok(Context {
        base_dir: resolve_base_dir(cli_base)?,
        cwd: std::env::current_dir()?,
        quiet,
    })
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(base) = cli_base {
        return Ok(base);
    }

    if let Ok(base) = std::env::var(BASE_DIR_ENV) {
        if !base.is_empty() {
            return Ok(PathBuf::from(base));
        }
    }

    dirs::home_dir()
        .map(|h| h.join(PLUGINS_DIR_NAME))
        .ok_or(PluginError::HomeNotFound)
}

fn warn_line(message: impl std::fmt::Display) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), message);
}

// ============================================================================
// Install
// ============================================================================

fn handle_install(
    ctx: &Context,
    identifier: &str,
    global: bool,
    force: bool,
    registry_url: Option<String>,
) -> Result<()> {
    let manager = ctx.manager()?;
    let options = InstallOptions {
        scope: Scope::from_global_flag(global),
        force,
        registry_url,
    };

    if !ctx.quiet {
        println!("Installing {}...", identifier.cyan());
    }

    match manager.install(identifier, &options)? {
        InstallOutcome::AlreadyInstalled { id, scope } => {
            warn_line(format!(
                "{} is already installed ({}). Use --force to reinstall.",
                id.bold(),
                scope.label()
            ));
        }
        InstallOutcome::Installed {
            plugin,
            scope,
            warnings,
            descriptor,
        } => {
            for warning in &warnings {
                warn_line(warning);
            }
            if ctx.quiet {
                return Ok(());
            }

            println!();
            println!(
                "{} {} v{} ({})",
                "Installed:".green(),
                plugin.manifest.name.bold(),
                plugin.manifest.version.yellow(),
                scope.label()
            );
            println!("  {} {}", "Location:".dimmed(), plugin.path.display());
            println!(
                "  {} {}",
                "Integration:".dimmed(),
                descriptor.display()
            );

            if !plugin.manifest.tools.is_empty() {
                println!();
                println!("{}", "Available tools:".bold());
                for tool in &plugin.manifest.tools {
                    println!("  {} {}", "•".cyan(), tool.name);
                    if !tool.description.is_empty() {
                        println!("    {}", tool.description.dimmed());
                    }
                }
            }
            println!();
        }
    }

    Ok(())
}

// ============================================================================
// List
// ============================================================================

fn handle_list(ctx: &Context, all: bool, registry_url: Option<String>) -> Result<()> {
    let manager = ctx.manager()?;

    match manager.list(&ListOptions { all, registry_url })? {
        PluginListing::Installed { local, global } => print_installed(&local, &global),
        PluginListing::Available(available) => {
            if available.is_empty() {
                println!("{}", "No plugins available in registry.".yellow());
                return Ok(());
            }
            println!();
            println!("{}", "Available Plugins:".cyan().bold());
            println!();
            print_available(&available);
            println!();
            println!(
                "{}",
                format!("Found {} plugin(s) in registry", available.len()).dimmed()
            );
            println!(
                "{}",
                "Run `claude-plugins install <plugin-name>` to install a plugin.".dimmed()
            );
        }
    }

    Ok(())
}

fn print_installed(local: &[InstalledPlugin], global: &[InstalledPlugin]) {
    let total = local.len() + global.len();
    if total == 0 {
        println!("{}", "No plugins installed.".yellow());
        println!(
            "{}",
            "Run `claude-plugins install <plugin-name>` to install a plugin.".dimmed()
        );
        println!(
            "{}",
            "Run `claude-plugins list --all` to see available plugins.".dimmed()
        );
        return;
    }

    println!();
    println!("{}", "Installed Plugins:".cyan().bold());

    for (label, plugins) in [(Scope::Local, local), (Scope::Global, global)] {
        if plugins.is_empty() {
            continue;
        }
        println!();
        println!("{}", format!("{}:", label.label()).dimmed());
        print_plugin_table(plugins);
    }

    println!();
    println!("{}", format!("Total: {} plugin(s) installed", total).dimmed());
}

fn print_plugin_table(plugins: &[InstalledPlugin]) {
    let name_width = plugins
        .iter()
        .map(|p| p.manifest.name.len())
        .max()
        .unwrap_or(0)
        .max(15);

    println!(
        "  {:<name_width$}  {:<10}  {:<8}  {}",
        "Name".bold(),
        "Version".bold(),
        "Tools".bold(),
        "Status".bold()
    );
    println!("  {}", "─".repeat(name_width + 38).dimmed());

    for plugin in plugins {
        let status = if plugin.enabled {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!(
            "  {:<name_width$}  {:<10}  {:<8}  {}",
            plugin.manifest.name.cyan(),
            plugin.manifest.version.yellow(),
            plugin.manifest.tools.len(),
            status
        );
    }
}

fn print_available(plugins: &[AvailablePlugin]) {
    let name_width = plugins
        .iter()
        .map(|p| p.info.name.len())
        .max()
        .unwrap_or(0)
        .max(20);

    println!(
        "  {:<name_width$}  {:<10}  {:<12}  {}",
        "Name".bold(),
        "Version".bold(),
        "Status".bold(),
        "Description".bold()
    );
    println!("  {}", "─".repeat(80).dimmed());

    for plugin in plugins {
        let status = match (plugin.installed_local, plugin.installed_global) {
            (true, true) => "✓ local+global".green(),
            (true, false) => "✓ local".green(),
            (false, true) => "✓ global".green(),
            (false, false) => "available".dimmed(),
        };
        println!(
            "  {:<name_width$}  {:<10}  {:<12}  {}",
            plugin.info.name.cyan(),
            plugin.info.version.yellow(),
            status,
            truncate(&plugin.info.description, 40).dimmed()
        );
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

// ============================================================================
// Remove
// ============================================================================

fn handle_remove(ctx: &Context, identifier: &str, force: bool) -> Result<()> {
    let manager = ctx.manager()?;

    let outcome = manager.remove(identifier, &RemoveOptions { force }, |plugin| {
        print!(
            "Are you sure you want to remove {}? [y/N]: ",
            plugin.manifest.name.bold()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let answer = input.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    })?;

    match outcome {
        RemoveOutcome::Cancelled => println!("{}", "Removal cancelled.".yellow()),
        RemoveOutcome::Removed { plugin, scope } => {
            if !ctx.quiet {
                println!(
                    "{} {} ({})",
                    "Removed:".green(),
                    plugin.manifest.name.bold(),
                    scope.label()
                );
                println!(
                    "{}",
                    "The plugin has been uninstalled and its tools are no longer available."
                        .dimmed()
                );
            }
        }
    }

    Ok(())
}

// ============================================================================
// Info
// ============================================================================

fn handle_info(ctx: &Context, identifier: &str, registry_url: Option<&str>) -> Result<()> {
    let manager = ctx.manager()?;

    match manager.info(identifier, registry_url)? {
        PluginInfo::Installed { plugin, scope } => print_installed_info(&plugin, scope),
        PluginInfo::Remote(info) => print_remote_info(&info),
        PluginInfo::NotFound { identifier } => {
            println!("{} {}", "Plugin not found:".yellow(), identifier);
            println!(
                "{}",
                "Run `claude-plugins list --all` to see available plugins.".dimmed()
            );
        }
    }

    Ok(())
}

fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{}:", label).bold(), value);
}

fn print_installed_info(plugin: &InstalledPlugin, scope: Scope) {
    let manifest = &plugin.manifest;

    println!();
    println!("{}", manifest.name.cyan().bold());
    println!("{}", "─".repeat(50).dimmed());
    print_field("ID", &manifest.id);
    print_field("Version", &manifest.version);
    print_field("Description", &manifest.description);
    print_field("Author", &manifest.author);
    print_field("License", &manifest.license);
    if let Some(homepage) = &manifest.homepage {
        print_field("Homepage", homepage.underline());
    }
    if let Some(repository) = &manifest.repository {
        print_field("Repository", repository.underline());
    }
    if let Some(keywords) = manifest.keywords.as_ref().filter(|k| !k.is_empty()) {
        print_field("Keywords", keywords.join(", "));
    }

    println!();
    println!("{}", "Installation".bold());
    print_field("Scope", scope.label());
    print_field(
        "Status",
        if plugin.enabled {
            "Enabled".green()
        } else {
            "Disabled".yellow()
        },
    );
    print_field(
        "Installed",
        plugin.installed_at.format("%B %-d, %Y %H:%M UTC"),
    );
    print_field("Path", plugin.path.display().to_string().dimmed());

    println!();
    print_tools(&manifest.tools);

    if let Some(deps) = manifest.declared_dependencies() {
        println!();
        println!("{}", "Dependencies".bold());
        for (name, version) in deps {
            println!("  {}: {}", name.cyan(), version);
        }
    }
    println!();
}

fn print_remote_info(info: &RemotePluginInfo) {
    let manifest = &info.manifest;

    println!();
    println!(
        "{} {}",
        manifest.name.cyan().bold(),
        "(not installed)".dimmed()
    );
    println!("{}", "─".repeat(50).dimmed());
    print_field("ID", &manifest.id);
    print_field("Version", &manifest.version);
    print_field("Description", &manifest.description);
    print_field("Author", &manifest.author);
    print_field("License", &manifest.license);
    print_field("Downloads", info.downloads);
    print_field("Rating", rating_stars(info.rating));
    if let Some(homepage) = &manifest.homepage {
        print_field("Homepage", homepage.underline());
    }
    if let Some(repository) = &manifest.repository {
        print_field("Repository", repository.underline());
    }

    println!();
    print_tools(&manifest.tools);

    println!();
    println!("{}", "To install this plugin, run:".dimmed());
    println!("  {}", format!("claude-plugins install {}", manifest.id).cyan());
    println!();
}

fn rating_stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!(
        "{}{} ({:.1})",
        "★".repeat(filled),
        "☆".repeat(5 - filled),
        rating
    )
}

fn print_tools(tools: &[PluginTool]) {
    println!("{}", format!("Tools ({})", tools.len()).bold());

    if tools.is_empty() {
        println!("  {}", "No tools defined".dimmed());
        return;
    }

    for tool in tools {
        println!("  {} {}", "•".cyan(), tool.name.bold());
        println!("    {}", tool.description.dimmed());

        let params = tool.parameters();
        if !params.is_empty() {
            println!("    {}", "Parameters:".dimmed());
            for param in &params {
                let required = if param.required {
                    "*".red().to_string()
                } else {
                    String::new()
                };
                println!(
                    "      - {}{}: {} - {}",
                    param.name.yellow(),
                    required,
                    param.kind,
                    param.description
                );
            }
        }
    }
}

// ============================================================================
// Search
// ============================================================================

fn handle_search(ctx: &Context, query: &str, registry_url: Option<&str>) -> Result<()> {
    let manager = ctx.manager()?;
    let results = manager.search(query, registry_url)?;

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!();
    println!("{}", "Search Results:".cyan().bold());
    println!();
    print_available(&results);
    println!();
    println!(
        "{}",
        format!("{} plugin(s) match '{}'", results.len(), query).dimmed()
    );

    Ok(())
}

// ============================================================================
// Enable / Disable
// ============================================================================

fn handle_set_enabled(ctx: &Context, identifier: &str, enabled: bool) -> Result<()> {
    let manager = ctx.manager()?;
    let (plugin, scope) = manager.set_enabled(identifier, enabled)?;

    if !ctx.quiet {
        let label = if enabled {
            "Enabled:".green()
        } else {
            "Disabled:".yellow()
        };
        println!("{} {} ({})", label, plugin.manifest.name.bold(), scope.label());
    }

    Ok(())
}

// ============================================================================
// Config
// ============================================================================

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(PluginError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn rating_renders_five_stars() {
        assert_eq!(rating_stars(4.8), "★★★★★ (4.8)");
        assert_eq!(rating_stars(2.2), "★★☆☆☆ (2.2)");
    }

    #[test]
    fn base_dir_flag_wins() {
        let dir = resolve_base_dir(Some(PathBuf::from("/tmp/plugins"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/plugins"));
    }
}
