use anyhow::Result;
use clap::Parser;
use rpmcache::commands::{self, CacheOptions, render};
use rpmcache::cache::MetadataCache;
use rpmcache::runtime::{RealRuntime, Runtime};
use std::path::PathBuf;

/// rpmcache - RPM package metadata cache
///
/// Query installed and available packages the way a yum package provider
/// sees them. Package data comes from running the yum-dump.py helper.
///
/// Examples:
///   rpmcache installed zlib --arch x86_64
///   rpmcache whatprovides 'perl(Carp) >= 1.0'
///   rpmcache plan zip 2.31-2.el5
///   rpmcache compare 1:1.0-1 1.1-1
#[derive(Parser, Debug)]
#[command(author, version = env!("RPMCACHE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to <config dir>/rpmcache/config.json)
    #[arg(long, env = "RPMCACHE_CONFIG", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Python interpreter used to run the helper
    #[arg(long, env = "RPMCACHE_PYTHON", value_name = "PATH", global = true)]
    python: Option<PathBuf>,

    /// Path to yum-dump.py
    #[arg(long, env = "RPMCACHE_HELPER", value_name = "PATH", global = true)]
    helper: Option<PathBuf>,

    /// Seconds the helper waits for the yum lock
    #[arg(
        long,
        env = "RPMCACHE_LOCK_TIMEOUT",
        value_name = "SECONDS",
        global = true
    )]
    lock_timeout: Option<u64>,

    /// Seconds before a helper run is killed
    #[arg(long = "timeout", value_name = "SECONDS", global = true)]
    timeout: Option<u64>,

    /// yum options; --enablerepo/--disablerepo switches are passed to the helper
    #[arg(
        long,
        value_name = "OPTIONS",
        allow_hyphen_values = true,
        global = true
    )]
    repo_control: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Query(QueryCommands),

    /// Compare two [epoch:]version[-release] strings
    Compare(CompareArgs),
}

/// Subcommands answered from package data.
#[derive(clap::Subcommand, Debug)]
enum QueryCommands {
    /// Show the installed version of a package
    Installed(PackageArgs),

    /// Show the newest available version of a package
    Available(PackageArgs),

    /// Show the repository offering a package version
    Repository(VersionArgs),

    /// Check whether a package (and optionally a version) is known
    Check(CheckArgs),

    /// List packages providing a capability, e.g. 'libz.so.1' or 'mtr >= 2:0.71'
    Whatprovides {
        /// Capability, optionally with an operator and version
        #[arg(value_name = "CAPABILITY")]
        capability: String,
    },

    /// Resolve a package name, name.arch or Provides requirement
    Resolve(ResolveArgs),

    /// Decide whether and how a package version would be installed
    Plan(PlanArgs),
}

#[derive(clap::Args, Debug)]
struct PackageArgs {
    #[arg(value_name = "NAME")]
    name: String,

    /// Restrict to one architecture
    #[arg(long)]
    arch: Option<String>,
}

#[derive(clap::Args, Debug)]
struct VersionArgs {
    #[arg(value_name = "NAME")]
    name: String,

    /// version-release, e.g. 1.84-10.fc6
    #[arg(value_name = "VERSION")]
    version: String,

    /// Restrict to one architecture
    #[arg(long)]
    arch: Option<String>,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Package name or name.arch
    #[arg(value_name = "NAME")]
    name: String,

    #[arg(value_name = "VERSION")]
    version: Option<String>,

    /// Restrict the version check to one architecture
    #[arg(long)]
    arch: Option<String>,
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    #[arg(value_name = "PACKAGE")]
    package: String,

    /// Version or constraint, e.g. '>= 1.2'
    #[arg(value_name = "VERSION", allow_hyphen_values = true)]
    version: Option<String>,

    /// Resolve for removal; skips loading available Provides
    #[arg(long)]
    removing: bool,
}

#[derive(clap::Args, Debug)]
struct PlanArgs {
    #[arg(value_name = "PACKAGE")]
    package: String,

    /// Defaults to the newest available version
    #[arg(value_name = "VERSION")]
    version: Option<String>,

    /// Allow replacing a newer installed version
    #[arg(long)]
    allow_downgrade: bool,
}

#[derive(clap::Args, Debug)]
struct CompareArgs {
    #[arg(value_name = "EVR", allow_hyphen_values = true)]
    left: String,

    #[arg(value_name = "EVR", allow_hyphen_values = true)]
    right: String,

    /// Treat missing epoch or release as matching anything
    #[arg(long)]
    partial: bool,
}

impl Cli {
    fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            config: self.config.clone(),
            python: self.python.clone(),
            helper: self.helper.clone(),
            lock_timeout: self.lock_timeout,
            command_timeout: self.timeout,
            repo_control: self.repo_control.clone(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let output = match &cli.command {
        Commands::Compare(args) => render(
            &commands::compare(&args.left, &args.right, args.partial),
            cli.json,
        )?,
        Commands::Query(command) => {
            let mut cache = commands::open_cache(RealRuntime, &cli.cache_options())?;
            run(&mut cache, command, cli.json)?
        }
    };
    println!("{}", output);
    Ok(())
}

fn run<R: Runtime>(
    cache: &mut MetadataCache<R>,
    command: &QueryCommands,
    json: bool,
) -> Result<String> {
    match command {
        QueryCommands::Installed(args) => {
            render(&commands::installed(cache, &args.name, args.arch.as_deref())?, json)
        }
        QueryCommands::Available(args) => {
            render(&commands::available(cache, &args.name, args.arch.as_deref())?, json)
        }
        QueryCommands::Repository(args) => render(
            &commands::repository(cache, &args.name, &args.version, args.arch.as_deref())?,
            json,
        ),
        QueryCommands::Check(args) => render(
            &commands::check(
                cache,
                &args.name,
                args.version.as_deref(),
                args.arch.as_deref(),
            )?,
            json,
        ),
        QueryCommands::Whatprovides { capability } => {
            render(&commands::whatprovides(cache, capability)?, json)
        }
        QueryCommands::Resolve(args) => render(
            &commands::resolve(cache, &args.package, args.version.as_deref(), args.removing)?,
            json,
        ),
        QueryCommands::Plan(args) => render(
            &commands::plan(
                cache,
                &args.package,
                args.version.as_deref(),
                args.allow_downgrade,
            )?,
            json,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_installed_parsing() {
        let cli =
            Cli::try_parse_from(["rpmcache", "installed", "zlib", "--arch", "i386"]).unwrap();
        match cli.command {
            Commands::Query(QueryCommands::Installed(args)) => {
                assert_eq!(args.name, "zlib");
                assert_eq!(args.arch.as_deref(), Some("i386"));
            }
            _ => panic!("Expected Installed command"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "rpmcache",
            "--python",
            "/bin/python3",
            "--lock-timeout",
            "5",
            "--repo-control",
            "--enablerepo=epel",
            "check",
            "zip",
            "--json",
        ])
        .unwrap();
        let options = cli.cache_options();
        assert_eq!(options.python, Some(PathBuf::from("/bin/python3")));
        assert_eq!(options.lock_timeout, Some(5));
        assert_eq!(options.repo_control.as_deref(), Some("--enablerepo=epel"));
        assert!(cli.json);
    }

    #[test]
    fn test_cli_resolve_constraint() {
        let cli = Cli::try_parse_from(["rpmcache", "resolve", "mtr", ">= 2:0.71"]).unwrap();
        match cli.command {
            Commands::Query(QueryCommands::Resolve(args)) => {
                assert_eq!(args.package, "mtr");
                assert_eq!(args.version.as_deref(), Some(">= 2:0.71"));
                assert!(!args.removing);
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_cli_plan_parsing() {
        let cli =
            Cli::try_parse_from(["rpmcache", "plan", "zip", "2.30-1.el5", "--allow-downgrade"])
                .unwrap();
        match cli.command {
            Commands::Query(QueryCommands::Plan(args)) => {
                assert_eq!(args.version.as_deref(), Some("2.30-1.el5"));
                assert!(args.allow_downgrade);
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_cli_compare_is_not_a_query() {
        let cli =
            Cli::try_parse_from(["rpmcache", "compare", "--partial", "1.2", "1.2-5"]).unwrap();
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.left, "1.2");
                assert_eq!(args.right, "1.2-5");
                assert!(args.partial);
            }
            _ => panic!("Expected Compare command"),
        }
    }

    #[test]
    fn test_cli_repository_requires_version() {
        assert!(Cli::try_parse_from(["rpmcache", "repository", "zip"]).is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["rpmcache", "zip"]).is_err());
    }
}
