use clap::Parser;
use estate_cli::Cli;
use estate_cli::error_message;
use estate_cli::exit_code_for;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = estate_cli::run_main(cli).await {
        eprintln!("{}", error_message(&err));
        std::process::exit(exit_code_for(&err));
    }
}
