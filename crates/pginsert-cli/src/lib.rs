mod cli;
mod compile;
mod config;
mod tables;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Compile(args) => compile::run(args),
        cli::Command::Tables(args) => tables::run(args),
    }
}
