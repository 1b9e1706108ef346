use anyhow::{Result, bail};
use argh::FromArgs;
use seqsh::Interpreter;
use seqsh::config::Settings;
use std::env;

#[derive(FromArgs)]
/// Interactive command interpreter with `;`, `&&` and `||` chaining.
struct Args {
    #[argh(switch, short = 'H')]
    /// do not load or save the command history.
    no_history: bool,

    #[argh(switch, short = 'v')]
    /// print the version and exit.
    version: bool,

    #[argh(positional)]
    /// script files; not supported, input is read interactively only.
    scripts: Vec<String>,
}

impl Args {
    fn check(&self) -> Result<()> {
        if !self.scripts.is_empty() {
            bail!("cannot run script files: {}", self.scripts.join(" "));
        }
        Ok(())
    }
}

fn version_line() -> String {
    format!("seqsh - version {}", env!("CARGO_PKG_VERSION"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();
    if args.version {
        println!("{}", version_line());
        return Ok(());
    }
    args.check()?;

    let settings = Settings::from_env();
    if let Err(e) = env::set_current_dir(&settings.home) {
        log::warn!("cannot change to {}: {}", settings.home.display(), e);
    }

    Interpreter::new(settings).repl(!args.no_history)?;
    println!("bye!");
    Ok(())
}
