use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use spdlog::{error, info, warn};

use autopost::batch::process_files;
use autopost::content::post_file::PostFile;
use autopost::logger::configure_logger;
use autopost::publisher::setup_browser;

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "autopost.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// Publishes every document of the input directory
    Run(RunArgs),
    /// Compiles one document and prints the result. No browser is started
    Compile(CompileArgs),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct RunArgs {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    /// Runs the browser without a window, whatever the config says
    #[arg(long)]
    headless: bool,

    /// Waits for Enter before closing the browser
    #[arg(long)]
    keep_open: bool,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CompileArgs {
    /// Post document to compile
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args {
        Args::Run(args) => run_cmd(args),
        Args::Compile(args) => compile_cmd(args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every document got published.
fn run_cmd(args: RunArgs) -> Result<bool> {
    let mut config = match open_config(args.config_path.map(PathBuf::from)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:#}", err);
            eprintln!("Please run autopost --help");
            return Ok(false);
        }
    };
    if args.headless {
        config.browser.headless = true;
    }

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting autopost =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");
    info!("Publishing to {} from {}", config.site.url, config.paths.input_dir.display());

    config.create_directories().context("Could not create working directories")?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current post");
        flag.store(true, Ordering::SeqCst);
    }).context("Could not install the Ctrl-C handler")?;

    let mut publisher = setup_browser(&config).context("Could not start the browser")?;

    let success = if publisher.login() {
        match process_files(&mut publisher, &config.paths, &interrupted) {
            Ok(summary) => !summary.has_failures(),
            Err(err) => {
                error!("Stopping the run: {}", err);
                false
            }
        }
    } else {
        error!("Login failed, nothing was published");
        false
    };

    if args.keep_open {
        wait_for_enter();
    }
    publisher.cleanup();

    Ok(success)
}

fn wait_for_enter() {
    println!("Press Enter to close the browser...");
    let mut line = String::new();
    if let Err(err) = io::stdin().read_line(&mut line) {
        warn!("Could not read from stdin: {}", err);
    }
}

fn compile_cmd(args: CompileArgs) -> Result<bool> {
    let post_file = PostFile::from_file(args.file.clone())
        .with_context(|| format!("Could not read {}", args.file.display()))?;
    let post = post_file.compile()
        .with_context(|| format!("Could not compile {}", post_file.file_name()))?;

    println!("{}", post);
    Ok(true)
}
