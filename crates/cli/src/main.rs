//! compbench CLI entry point.

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = compbench_cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
