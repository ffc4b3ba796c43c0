use clap::Parser;

use agora_client::cli::{self, Cli};

#[tokio::main]
async fn main() {
    agora_client::init_tracing();
    let cli = Cli::parse();

    match cli::run(cli).await {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
