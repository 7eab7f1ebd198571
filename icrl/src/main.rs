use anyhow::Result;
use clap::Parser;
use icrl::{
    args::{Args, Command},
    collect_trajectories, run_eval,
};
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Eval(args) => {
            let config = args.config()?;
            let outputs = run_eval(&config)?;
            info!("Results are in {:?}", outputs.curves);
        }
        Command::Collect(args) => {
            let kind = args.env_kind()?;
            let path = collect_trajectories(&kind, args.n_eval, args.seed, &args.root_dir, args.json)?;
            info!("Saved {} trajectories to {:?}", args.n_eval, path);
        }
    }
    Ok(())
}
