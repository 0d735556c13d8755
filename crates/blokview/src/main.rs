use clap::Parser;
use colored::Colorize;

use blokview::cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = blokview::logging::init(cli.verbose, cli.quiet, cli.no_color) {
        eprintln!("{} {e}", "warning:".yellow().bold());
    }

    if let Err(e) = cli.run() {
        eprintln!("{} {e}", "error:".red().bold());
        for cause in e.chain().skip(1) {
            eprintln!("  {} {cause}", "caused by:".dimmed());
        }
        std::process::exit(1);
    }
}
